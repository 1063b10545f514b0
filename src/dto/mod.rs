pub mod auth;
pub mod cart;
pub mod contact;
pub mod newsletter;
pub mod orders;
pub mod products;
