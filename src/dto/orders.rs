use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{Order, OrderItem, PaymentMethod, ShippingAddress},
    payment::GatewayOrder,
};

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub size: crate::models::ProductSize,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    #[validate(nested, length(min = 1, message = "No order items"))]
    pub order_items: Vec<OrderItemInput>,
    #[validate(nested)]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[validate(range(min = 0))]
    pub items_price: i64,
    #[validate(range(min = 0))]
    pub shipping_price: i64,
    #[validate(range(min = 0))]
    pub tax_price: i64,
    #[validate(range(min = 0))]
    pub total_price: i64,
}

/// The confirmation callback relays the original order fields plus the
/// processor identifiers and the signature to check them with.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VerifyPaymentRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub order: CreateOrderRequest,
    #[validate(length(min = 1))]
    pub gateway_order_id: String,
    #[validate(length(min = 1))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1))]
    pub gateway_signature: String,
}

/// Caller-supplied confirmation fields for the alternate-gateway callback
/// path (`PUT /orders/{id}/pay`). Field names follow that processor's IPN
/// payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    pub id: String,
    pub status: String,
    pub update_time: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Single-order view, with the owning user's name/email resolved.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

/// Checkout answers one of two shapes: a processor order descriptor for the
/// hosted-gateway method, or the persisted order for the others.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CheckoutOutcome {
    Gateway(GatewayOrder),
    Placed(OrderWithItems),
}
