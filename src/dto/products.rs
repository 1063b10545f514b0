use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Product, ProductCategory, ProductKind, ProductSize};

/// Shared by create and edit: the original admin surface replaces every
/// mutable field on edit, so there is no partial-update shape.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub category: ProductCategory,
    pub kind: ProductKind,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,
    #[validate(length(min = 1, message = "At least one size must be selected"))]
    pub sizes: Vec<ProductSize>,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description is required and can't exceed 500 characters"
    ))]
    pub description: String,
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    pub stock: i32,
    #[validate(length(min = 1, message = "At least one product image is required"))]
    pub images: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ProductPayload {
        ProductPayload {
            name: "Linen Shirt".into(),
            category: ProductCategory::Men,
            kind: ProductKind::Topwear,
            price: 2499,
            sizes: vec![ProductSize::M, ProductSize::L],
            description: "A shirt".into(),
            stock: 5,
            images: vec!["https://img.example/1.jpg".into()],
            is_active: true,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn empty_sizes_fail() {
        let mut p = payload();
        p.sizes.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn negative_price_fails() {
        let mut p = payload();
        p.price = -1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn overlong_description_fails() {
        let mut p = payload();
        p.description = "x".repeat(501);
        assert!(p.validate().is_err());
    }

    #[test]
    fn missing_images_fail() {
        let mut p = payload();
        p.images.clear();
        assert!(p.validate().is_err());
    }
}
