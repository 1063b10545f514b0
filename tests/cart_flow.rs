mod common;

use common::{create_product, create_user, setup_state, test_database_url};
use flaire_api::{
    dto::{
        cart::{AddToCartRequest, CartAction, UpdateCartItemRequest},
        products::ProductPayload,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{ProductCategory, ProductKind, ProductSize},
    services::{cart_service, product_service},
};
use uuid::Uuid;

// Flow: add lines per size, adjust quantities, watch the total track live
// catalog prices, then empty the cart out.
#[tokio::test]
async fn cart_add_update_remove_flow() -> anyhow::Result<()> {
    let Some(database_url) = test_database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run cart flow tests.");
        return Ok(());
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user", "user@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;
    let product_id = create_product(&state, "Linen Shirt", 1000, 10).await?;

    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    // Mutations against a never-created cart answer not-found.
    let resp = cart_service::clear_cart(&state, &auth_user).await;
    assert!(matches!(resp, Err(AppError::NotFound)));

    // Two units of size M.
    let cart = cart_service::add_item(
        &state,
        &auth_user,
        AddToCartRequest {
            product_id,
            size: ProductSize::M,
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_price, 2000);

    // Same product in a second size makes a second line.
    let cart = cart_service::add_item(
        &state,
        &auth_user,
        AddToCartRequest {
            product_id,
            size: ProductSize::L,
            quantity: 1,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_price, 3000);

    // A size the product does not offer is refused.
    let resp = cart_service::add_item(
        &state,
        &auth_user,
        AddToCartRequest {
            product_id,
            size: ProductSize::Xxl,
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(resp, Err(AppError::BadRequest(_))));

    // An unknown product is refused.
    let resp = cart_service::add_item(
        &state,
        &auth_user,
        AddToCartRequest {
            product_id: Uuid::new_v4(),
            size: ProductSize::M,
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(resp, Err(AppError::NotFound)));

    // Decrease addresses the oldest line for the product (size M, qty 2).
    let cart = cart_service::update_item(
        &state,
        &auth_user,
        product_id,
        UpdateCartItemRequest {
            action: CartAction::Decrease,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cart.total_price, 2000);

    // Decreasing a quantity-1 line removes it outright.
    let cart = cart_service::update_item(
        &state,
        &auth_user,
        product_id,
        UpdateCartItemRequest {
            action: CartAction::Decrease,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].size, ProductSize::L);
    assert_eq!(cart.total_price, 1000);

    // The total is derived from live prices: an admin price edit is
    // reflected on the next cart read with no cart mutation at all.
    product_service::update_product(
        &state,
        &auth_admin,
        product_id,
        ProductPayload {
            name: "Linen Shirt".into(),
            category: ProductCategory::Men,
            kind: ProductKind::Topwear,
            price: 1500,
            sizes: vec![ProductSize::S, ProductSize::M, ProductSize::L],
            description: "A product for testing".into(),
            stock: 10,
            images: vec!["https://img.example/1.jpg".into()],
            is_active: true,
        },
    )
    .await?;

    let cart = cart_service::get_cart(&state, &auth_user).await?.data.unwrap();
    assert_eq!(cart.total_price, 1500);

    // Remove deletes every line of the product, which empties the cart.
    let cart = cart_service::remove_item(&state, &auth_user, product_id)
        .await?
        .data
        .unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0);

    // Once empty, further mutations are not-found again, while reads keep
    // answering an empty representation.
    let resp = cart_service::clear_cart(&state, &auth_user).await;
    assert!(matches!(resp, Err(AppError::NotFound)));

    let read = cart_service::get_cart(&state, &auth_user).await?;
    assert_eq!(read.message, "Cart is empty");

    Ok(())
}
