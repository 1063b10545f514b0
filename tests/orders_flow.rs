mod common;

use common::{
    GATEWAY_SECRET, create_product, create_user, setup_state, shipping_address, test_database_url,
};
use flaire_api::{
    dto::{
        orders::{CheckoutOutcome, CreateOrderRequest, OrderItemInput, PayOrderRequest, VerifyPaymentRequest},
        products::ProductPayload,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentMethod, ProductCategory, ProductKind, ProductSize},
    payment,
    services::{admin_service, order_service, product_service},
};
use uuid::Uuid;

fn order_request(
    product_id: Uuid,
    quantity: i32,
    unit_price: i64,
    method: PaymentMethod,
) -> CreateOrderRequest {
    let items_price = unit_price * quantity as i64;
    CreateOrderRequest {
        order_items: vec![OrderItemInput {
            product_id,
            size: ProductSize::M,
            quantity,
        }],
        shipping_address: shipping_address(),
        payment_method: method,
        items_price,
        shipping_price: 0,
        tax_price: 0,
        total_price: items_price,
    }
}

// Integration flow across every checkout branch: cash persists unpaid,
// paypal persists paid, the hosted gateway defers persistence to a verified
// confirmation, and stock only ever moves inside a persisted order.
#[tokio::test]
async fn checkout_verify_and_admin_flow() -> anyhow::Result<()> {
    let Some(database_url) = test_database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run order flow tests.");
        return Ok(());
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user", "user@example.com").await?;
    let other_id = create_user(&state, "user", "other@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;
    let product_id = create_product(&state, "Test Widget", 1000, 3).await?;

    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_other = AuthUser {
        user_id: other_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    // Ordering more than the shelf holds is refused before any branch runs.
    let resp = order_service::create_order(
        &state,
        &auth_user,
        order_request(product_id, 5, 1000, PaymentMethod::CashOnDelivery),
    )
    .await;
    assert!(matches!(resp, Err(AppError::BadRequest(_))));

    // Cash on delivery persists immediately, unpaid.
    let resp = order_service::create_order(
        &state,
        &auth_user,
        order_request(product_id, 2, 1000, PaymentMethod::CashOnDelivery),
    )
    .await?;
    let CheckoutOutcome::Placed(placed) = resp.data.unwrap() else {
        panic!("expected a persisted order for cash on delivery");
    };
    let cash_order_id = placed.order.id;
    assert!(!placed.order.is_paid);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.total_price, 2000);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].name, "Test Widget");
    assert_eq!(placed.items[0].price, 1000);

    let product = product_service::get_product(&state, product_id)
        .await?
        .data
        .unwrap();
    assert_eq!(product.stock, 1);

    // Catalog edits after checkout must not rewrite history: the order item
    // keeps the name and unit price captured at purchase time.
    product_service::update_product(
        &state,
        &auth_admin,
        product_id,
        ProductPayload {
            name: "Renamed Widget".into(),
            category: ProductCategory::Men,
            kind: ProductKind::Topwear,
            price: 9999,
            sizes: vec![ProductSize::S, ProductSize::M, ProductSize::L],
            description: "A product for testing".into(),
            stock: 5,
            images: vec!["https://img.example/1.jpg".into()],
            is_active: true,
        },
    )
    .await?;

    let detail = order_service::get_order(&state, &auth_user, cash_order_id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.items[0].name, "Test Widget");
    assert_eq!(detail.items[0].price, 1000);
    assert_eq!(detail.user_email, "user@example.com");

    // Other users get the same not-found as a missing order; admins see it.
    let resp = order_service::get_order(&state, &auth_other, cash_order_id).await;
    assert!(matches!(resp, Err(AppError::NotFound)));
    order_service::get_order(&state, &auth_admin, cash_order_id).await?;

    // The hosted gateway branch only creates a processor-side order: no
    // order row, no stock movement.
    let resp = order_service::create_order(
        &state,
        &auth_user,
        order_request(product_id, 1, 9999, PaymentMethod::Gateway),
    )
    .await?;
    let CheckoutOutcome::Gateway(descriptor) = resp.data.unwrap() else {
        panic!("expected a gateway descriptor for the hosted method");
    };
    assert_eq!(descriptor.amount, 9999);

    let product = product_service::get_product(&state, product_id)
        .await?
        .data
        .unwrap();
    assert_eq!(product.stock, 5);
    let mine = order_service::get_my_orders(&state, &auth_user).await?.data.unwrap();
    assert_eq!(mine.items.len(), 1);

    // A tampered signature is rejected and still persists nothing.
    let payment_id = "pay_123";
    let good_sig = payment::sign(GATEWAY_SECRET, &descriptor.gateway_order_id, payment_id);
    let resp = order_service::verify_payment(
        &state,
        &auth_user,
        VerifyPaymentRequest {
            order: order_request(product_id, 1, 9999, PaymentMethod::Gateway),
            gateway_order_id: descriptor.gateway_order_id.clone(),
            gateway_payment_id: payment_id.into(),
            gateway_signature: format!("{good_sig}00"),
        },
    )
    .await;
    assert!(matches!(resp, Err(AppError::InvalidSignature)));
    let product = product_service::get_product(&state, product_id)
        .await?
        .data
        .unwrap();
    assert_eq!(product.stock, 5);

    // A matching signature materializes the order, paid, with processor ids.
    let placed = order_service::verify_payment(
        &state,
        &auth_user,
        VerifyPaymentRequest {
            order: order_request(product_id, 1, 9999, PaymentMethod::Gateway),
            gateway_order_id: descriptor.gateway_order_id.clone(),
            gateway_payment_id: payment_id.into(),
            gateway_signature: good_sig,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(placed.order.is_paid);
    let result = placed.order.payment_result.expect("processor ids recorded");
    assert_eq!(result.gateway_order_id.as_deref(), Some(descriptor.gateway_order_id.as_str()));
    assert_eq!(result.gateway_payment_id.as_deref(), Some(payment_id));

    let product = product_service::get_product(&state, product_id)
        .await?
        .data
        .unwrap();
    assert_eq!(product.stock, 4);

    // The alternate confirmation path is owner-only.
    let pay = PayOrderRequest {
        id: "ALT-1".into(),
        status: "COMPLETED".into(),
        update_time: None,
        email_address: Some("payer@example.com".into()),
    };
    let resp = order_service::update_order_to_paid(
        &state,
        &auth_other,
        cash_order_id,
        PayOrderRequest {
            id: "ALT-1".into(),
            status: "COMPLETED".into(),
            update_time: None,
            email_address: None,
        },
    )
    .await;
    assert!(matches!(resp, Err(AppError::NotFound)));

    let paid = order_service::update_order_to_paid(&state, &auth_user, cash_order_id, pay)
        .await?
        .data
        .unwrap();
    assert!(paid.order.is_paid);
    let result = paid.order.payment_result.expect("confirmation recorded");
    assert_eq!(result.status.as_deref(), Some("COMPLETED"));

    // Admin moves the order along and sees every order in the listing.
    let updated = admin_service::update_order_status(
        &state,
        &auth_admin,
        cash_order_id,
        OrderStatus::Shipped,
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.status, OrderStatus::Shipped);

    // Paypal persists immediately and is treated as paid at placement.
    let resp = order_service::create_order(
        &state,
        &auth_user,
        order_request(product_id, 1, 9999, PaymentMethod::Paypal),
    )
    .await?;
    let CheckoutOutcome::Placed(placed) = resp.data.unwrap() else {
        panic!("expected a persisted order for paypal");
    };
    assert!(placed.order.is_paid);

    let product = product_service::get_product(&state, product_id)
        .await?
        .data
        .unwrap();
    assert_eq!(product.stock, 3);

    let mine = order_service::get_my_orders(&state, &auth_user).await?.data.unwrap();
    assert_eq!(mine.items.len(), 3);

    // Two concurrent checkouts that share both products but list them in
    // opposite order settle cleanly: each either commits or fails the
    // stock check, never a database error.
    let left = create_product(&state, "Left Sock", 100, 5).await?;
    let right = create_product(&state, "Right Sock", 100, 5).await?;
    let two_items = |first, second| CreateOrderRequest {
        order_items: vec![
            OrderItemInput {
                product_id: first,
                size: ProductSize::M,
                quantity: 1,
            },
            OrderItemInput {
                product_id: second,
                size: ProductSize::M,
                quantity: 1,
            },
        ],
        shipping_address: shipping_address(),
        payment_method: PaymentMethod::CashOnDelivery,
        items_price: 200,
        shipping_price: 0,
        tax_price: 0,
        total_price: 200,
    };

    let (forward, reverse) = tokio::join!(
        order_service::create_order(&state, &auth_user, two_items(left, right)),
        order_service::create_order(&state, &auth_other, two_items(right, left)),
    );
    forward?;
    reverse?;

    let product = product_service::get_product(&state, left).await?.data.unwrap();
    assert_eq!(product.stock, 3);
    let product = product_service::get_product(&state, right).await?.data.unwrap();
    assert_eq!(product.stock, 3);

    Ok(())
}
