pub mod cart_items;
pub mod contacts;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod subscribers;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use contacts::Entity as Contacts;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use subscribers::Entity as Subscribers;
pub use users::Entity as Users;
