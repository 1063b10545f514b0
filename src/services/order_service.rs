use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_audit,
    dto::orders::{
        CheckoutOutcome, CreateOrderRequest, OrderDetail, OrderItemInput, OrderList,
        OrderWithItems, PayOrderRequest, VerifyPaymentRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentResult, ShippingAddress},
    payment,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Checkout entry point. Stock is validated for every item up front; the
/// hosted-gateway method then only creates a processor-side order (nothing
/// persisted, no stock touched — the order materializes at the verified
/// confirmation), while the other methods persist immediately.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<CheckoutOutcome>> {
    payload.validate()?;
    if payload.order_items.is_empty() {
        return Err(AppError::BadRequest("No order items".into()));
    }

    check_stock(&state.orm, &payload.order_items).await?;

    match payload.payment_method {
        PaymentMethod::Gateway => {
            let receipt = format!("order_{}", Utc::now().timestamp_millis());
            let gateway_order = state
                .gateway
                .create_order(
                    payload.total_price,
                    &state.config.gateway.currency,
                    &receipt,
                )
                .await?;

            if let Err(err) = log_audit(
                &state.pool,
                Some(user.user_id),
                "gateway_order_create",
                Some("orders"),
                Some(serde_json::json!({
                    "gateway_order_id": gateway_order.gateway_order_id,
                    "amount": gateway_order.amount,
                })),
            )
            .await
            {
                tracing::warn!(error = %err, "audit log failed");
            }

            Ok(ApiResponse::success(
                "Gateway order created",
                CheckoutOutcome::Gateway(gateway_order),
                Some(Meta::empty()),
            ))
        }
        PaymentMethod::CashOnDelivery | PaymentMethod::Paypal => {
            let paid = payload.payment_method == PaymentMethod::Paypal;
            let placed = persist_order(state, user.user_id, &payload, paid, None).await?;

            if let Err(err) = log_audit(
                &state.pool,
                Some(user.user_id),
                "checkout",
                Some("orders"),
                Some(serde_json::json!({ "order_id": placed.order.id })),
            )
            .await
            {
                tracing::warn!(error = %err, "audit log failed");
            }

            Ok(ApiResponse::success(
                "Order placed",
                CheckoutOutcome::Placed(placed),
                Some(Meta::empty()),
            ))
        }
    }
}

/// Confirmation callback for the hosted gateway. The HMAC check is the sole
/// integrity guarantee on this path: nothing is persisted and no stock
/// moves unless the signature matches.
pub async fn verify_payment(
    state: &AppState,
    user: &AuthUser,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    payload.validate()?;

    if !payment::verify_signature(
        &state.config.gateway.key_secret,
        &payload.gateway_order_id,
        &payload.gateway_payment_id,
        &payload.gateway_signature,
    ) {
        return Err(AppError::InvalidSignature);
    }

    if payload.order.order_items.is_empty() {
        return Err(AppError::BadRequest("No order items".into()));
    }

    let placed = persist_order(
        state,
        user.user_id,
        &payload.order,
        true,
        Some((&payload.gateway_order_id, &payload.gateway_payment_id)),
    )
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_verified",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": placed.order.id,
            "gateway_payment_id": payload.gateway_payment_id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment verified",
        placed,
        Some(Meta::empty()),
    ))
}

pub async fn get_my_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = load_order_items(&state.orm, order.id).await?;
        items.push(OrderWithItems {
            order: order_from_entity(order),
            items: lines,
        });
    }

    Ok(ApiResponse::success(
        "OK",
        OrderList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    // Non-owners get the same not-found as a missing order.
    if order.user_id != user.user_id && user.role != "admin" {
        return Err(AppError::NotFound);
    }

    let owner = Users::find_by_id(order.user_id).one(&state.orm).await?;
    let (user_name, user_email) = match owner {
        Some(u) => (u.name, u.email),
        None => (String::new(), String::new()),
    };

    let items = load_order_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderDetail {
            order: order_from_entity(order),
            items,
            user_name,
            user_email,
        },
        Some(Meta::empty()),
    ))
}

/// Alternate-gateway confirmation: flips paid state from caller-supplied
/// fields. Owner-only, but carries no signature check — that asymmetry is
/// part of the source contract for this processor's callback.
pub async fn update_order_to_paid(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    if order.user_id != user.user_id {
        return Err(AppError::NotFound);
    }

    let mut active: OrderActive = order.into();
    active.is_paid = Set(true);
    active.paid_at = Set(Some(Utc::now().into()));
    active.gateway_payment_id = Set(Some(payload.id));
    active.payment_status = Set(Some(payload.status));
    active.payer_email = Set(payload.email_address);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_paid",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let items = load_order_items(&state.orm, order.id).await?;
    Ok(ApiResponse::success(
        "Payment recorded",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Advisory pre-flight check used before the gateway round trip; the
/// authoritative check runs again on locked rows inside `persist_order`.
async fn check_stock<C: ConnectionTrait>(
    conn: &C,
    items: &[OrderItemInput],
) -> AppResult<()> {
    for item in items {
        let product = Products::find_by_id(item.product_id).one(conn).await?;
        let product = match product {
            Some(p) => p,
            None => return Err(AppError::NotFound),
        };
        if product.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Not enough stock for product: {}",
                product.name
            )));
        }
    }
    Ok(())
}

/// Persist an order and its stock decrements as one unit. Products are
/// re-read under `SELECT ... FOR UPDATE`, the stock check runs on the
/// locked rows, and the order insert plus every decrement commit together
/// or roll back together — two concurrent checkouts on a low-stock product
/// cannot both pass.
async fn persist_order(
    state: &AppState,
    user_id: Uuid,
    payload: &CreateOrderRequest,
    paid: bool,
    gateway_ids: Option<(&str, &str)>,
) -> AppResult<OrderWithItems> {
    let txn = state.orm.begin().await?;

    // Rows are locked in product-id order, so checkouts that overlap on
    // products always acquire their locks in the same sequence.
    let mut ordered: Vec<&OrderItemInput> = payload.order_items.iter().collect();
    ordered.sort_by_key(|item| item.product_id);

    let mut snapshots = Vec::with_capacity(ordered.len());
    for item in ordered {
        let product = Products::find_by_id(item.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => return Err(AppError::NotFound),
        };
        if product.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Not enough stock for product: {}",
                product.name
            )));
        }
        snapshots.push((product, item));
    }

    let now = Utc::now();
    let address = &payload.shipping_address;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        payment_method: Set(payload.payment_method),
        status: Set(OrderStatus::Pending),
        is_paid: Set(paid),
        paid_at: Set(paid.then(|| now.into())),
        ship_full_name: Set(address.full_name.clone()),
        ship_address: Set(address.address.clone()),
        ship_city: Set(address.city.clone()),
        ship_postal_code: Set(address.postal_code.clone()),
        ship_country: Set(address.country.clone()),
        ship_phone: Set(address.phone.clone()),
        items_price: Set(payload.items_price),
        shipping_price: Set(payload.shipping_price),
        tax_price: Set(payload.tax_price),
        total_price: Set(payload.total_price),
        gateway_order_id: Set(gateway_ids.map(|(o, _)| o.to_string())),
        gateway_payment_id: Set(gateway_ids.map(|(_, p)| p.to_string())),
        payer_email: Set(None),
        payment_status: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(snapshots.len());
    for (product, input) in &snapshots {
        // Name and unit price are copied here; later catalog edits must not
        // alter this order.
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            name: Set(product.name.clone()),
            size: Set(input.size),
            quantity: Set(input.quantity),
            price: Set(product.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(input.quantity))
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    Ok(OrderWithItems {
        order: order_from_entity(order),
        items,
    })
}

pub async fn load_order_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect())
}

pub fn order_from_entity(model: OrderModel) -> Order {
    let payment_result = if model.gateway_order_id.is_some()
        || model.gateway_payment_id.is_some()
        || model.payer_email.is_some()
        || model.payment_status.is_some()
    {
        Some(PaymentResult {
            gateway_order_id: model.gateway_order_id,
            gateway_payment_id: model.gateway_payment_id,
            payer_email: model.payer_email,
            status: model.payment_status,
        })
    } else {
        None
    };

    Order {
        id: model.id,
        user_id: model.user_id,
        payment_method: model.payment_method,
        status: model.status,
        is_paid: model.is_paid,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        shipping_address: ShippingAddress {
            full_name: model.ship_full_name,
            address: model.ship_address,
            city: model.ship_city,
            postal_code: model.ship_postal_code,
            country: model.ship_country,
            phone: model.ship_phone,
        },
        items_price: model.items_price,
        shipping_price: model.shipping_price,
        tax_price: model.tax_price,
        total_price: model.total_price,
        payment_result,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        product_id: model.product_id,
        name: model.name,
        size: model.size,
        quantity: model.quantity,
        price: model.price,
    }
}
