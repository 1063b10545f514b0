use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest},
        cart::{AddToCartRequest, UpdateCartItemRequest},
        contact::{ContactList, ContactRequest},
        newsletter::SubscribeRequest,
        orders::{
            CheckoutOutcome, CreateOrderRequest, OrderDetail, OrderItemInput, OrderList,
            OrderWithItems, PayOrderRequest, VerifyPaymentRequest,
        },
        products,
    },
    models::{
        Cart, CartLine, Contact, Order, OrderItem, OrderStatus, PaymentMethod, Product,
        ProductCategory, ProductKind, ProductSize, ShippingAddress, Subscriber, User,
    },
    payment::GatewayOrder,
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, contact, health, newsletter, orders, params,
        products as product_routes,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        product_routes::list_products,
        product_routes::get_product,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        orders::create_order,
        orders::verify_payment,
        orders::list_my_orders,
        orders::get_order,
        orders::pay_order,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_all_orders,
        admin::update_order_status,
        admin::delete_order,
        admin::list_contacts,
        admin::get_contact,
        contact::create_contact,
        newsletter::subscribe
    ),
    components(
        schemas(
            User,
            Product,
            ProductCategory,
            ProductKind,
            ProductSize,
            PaymentMethod,
            OrderStatus,
            ShippingAddress,
            Cart,
            CartLine,
            Order,
            OrderItem,
            Contact,
            Subscriber,
            GatewayOrder,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UpdateProfileRequest,
            AddToCartRequest,
            UpdateCartItemRequest,
            OrderItemInput,
            CreateOrderRequest,
            VerifyPaymentRequest,
            PayOrderRequest,
            CheckoutOutcome,
            OrderWithItems,
            OrderDetail,
            OrderList,
            ContactRequest,
            ContactList,
            SubscribeRequest,
            admin::UpdateOrderStatusRequest,
            products::ProductPayload,
            products::ProductList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<Cart>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order and payment endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Contacts", description = "Contact form endpoints"),
        (name = "Newsletter", description = "Newsletter endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
