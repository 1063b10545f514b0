use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartAction, UpdateCartItemRequest},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems,
        },
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Cart,
    response::{ApiResponse, Meta},
    services::product_service::product_from_entity,
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = load_cart(&state.orm, user.user_id).await?;
    let message = if cart.items.is_empty() {
        "Cart is empty"
    } else {
        "OK"
    };
    Ok(ApiResponse::success(message, cart, Some(Meta::empty())))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    payload.validate()?;

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => product_from_entity(p)?,
        None => return Err(AppError::NotFound),
    };

    if !product.sizes.contains(&payload.size) {
        return Err(AppError::BadRequest(format!(
            "Size is not offered for product: {}",
            product.name
        )));
    }

    let existing = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(payload.product_id))
        .filter(CartCol::Size.eq(payload.size))
        .one(&state.orm)
        .await?;

    match existing {
        Some(item) => {
            let quantity = item.quantity + payload.quantity;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(payload.product_id),
                size: Set(payload.size),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
        }
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({
            "product_id": payload.product_id,
            "size": payload.size,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("OK", cart, Some(Meta::empty())))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    ensure_cart_exists(&state.orm, user.user_id).await?;

    // The update surface addresses lines by product only; with several
    // sizes of the same product in the cart, the oldest line is adjusted.
    let item = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .order_by_asc(CartCol::CreatedAt)
        .one(&state.orm)
        .await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    match payload.action {
        CartAction::Increase => {
            let quantity = item.quantity + 1;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?;
        }
        CartAction::Decrease => {
            // Decreasing a quantity-1 line removes it instead of leaving a
            // zero-quantity row.
            if item.quantity <= 1 {
                item.delete(&state.orm).await?;
            } else {
                let quantity = item.quantity - 1;
                let mut active: CartItemActive = item.into();
                active.quantity = Set(quantity);
                active.update(&state.orm).await?;
            }
        }
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("OK", cart, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    ensure_cart_exists(&state.orm, user.user_id).await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("Removed from cart", cart, Some(Meta::empty())))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    ensure_cart_exists(&state.orm, user.user_id).await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_clear",
        Some("cart_items"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("Cart cleared", cart, Some(Meta::empty())))
}

/// Mutating operations on a cart that was never created answer not-found,
/// mirroring the one-document-per-user model of the storefront.
async fn ensure_cart_exists<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<()> {
    let count = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .count(conn)
        .await?;
    if count == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Populate every line with the current product document and derive the
/// total from live prices, never from prices captured at add time.
pub async fn load_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Cart> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt)
        .find_also_related(Products)
        .all(conn)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    let mut total_price: i64 = 0;
    for (line, product) in rows {
        // A line whose product was deleted from the catalog is skipped
        // rather than failing the whole cart.
        let Some(product) = product else {
            continue;
        };
        let product = product_from_entity(product)?;
        total_price += product.price * line.quantity as i64;
        items.push(crate::models::CartLine {
            product,
            size: line.size,
            quantity: line.quantity,
        });
    }

    Ok(Cart { items, total_price })
}
