#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

use flaire_api::{
    config::{AppConfig, GatewayConfig},
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    error::AppError,
    mailer::NoopMailer,
    models::{ProductCategory, ProductKind, ProductSize, ShippingAddress},
    payment::{GatewayOrder, PaymentGateway},
    state::AppState,
};

pub const GATEWAY_SECRET: &str = "test_gateway_secret";

/// Stand-in processor: records calls and echoes back a deterministic order
/// descriptor without any network round trip.
#[derive(Default)]
pub struct MockGateway {
    pub calls: AtomicU32,
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayOrder {
            gateway_order_id: format!("order_mock_{receipt}"),
            amount,
            currency: currency.to_string(),
        })
    }
}

/// Resolve the database URL, or None to skip the test in environments
/// without a database.
pub fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, subscribers, contacts, audit_logs, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test_jwt_secret".into(),
        gateway: GatewayConfig {
            base_url: "http://gateway.invalid".into(),
            key_id: "test_key".into(),
            key_secret: GATEWAY_SECRET.into(),
            currency: "INR".into(),
        },
        mail: None,
    };

    Ok(AppState {
        pool,
        orm,
        config: Arc::new(config),
        gateway: Arc::new(MockGateway::default()),
        mailer: Arc::new(NoopMailer),
    })
}

pub async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test User".into()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        ship_full_name: Set(None),
        ship_address: Set(None),
        ship_city: Set(None),
        ship_postal_code: Set(None),
        ship_country: Set(None),
        ship_phone: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        category: Set(ProductCategory::Men),
        kind: Set(ProductKind::Topwear),
        price: Set(price),
        sizes: Set(serde_json::to_value(vec![
            ProductSize::S,
            ProductSize::M,
            ProductSize::L,
        ])?),
        description: Set("A product for testing".into()),
        stock: Set(stock),
        images: Set(serde_json::to_value(vec!["https://img.example/1.jpg"])?),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Test User".into(),
        address: "1 Test Lane".into(),
        city: "Testville".into(),
        postal_code: "12345".into(),
        country: "Testland".into(),
        phone: "+10000000000".into(),
    }
}
