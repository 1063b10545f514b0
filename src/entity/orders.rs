use sea_orm::entity::prelude::*;

use crate::models::{OrderStatus, PaymentMethod};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub ship_full_name: String,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_postal_code: String,
    pub ship_country: String,
    pub ship_phone: String,
    pub items_price: i64,
    pub shipping_price: i64,
    pub tax_price: i64,
    pub total_price: i64,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub payer_email: Option<String>,
    pub payment_status: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
