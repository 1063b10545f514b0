use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{ShippingAddress, User};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Partial update: absent fields are left as they are. The stored address
/// is the checkout default the storefront pre-fills.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(nested)]
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_bad_email() {
        let req = RegisterRequest {
            name: "Ada".into(),
            email: "not-an-email".into(),
            password: "hunter22".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn register_accepts_valid_payload() {
        let req = RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "hunter22".into(),
        };
        assert!(req.validate().is_ok());
    }
}
