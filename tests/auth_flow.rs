mod common;

use common::{setup_state, shipping_address, test_database_url};
use flaire_api::{
    dto::auth::{LoginRequest, RegisterRequest, UpdateProfileRequest},
    error::AppError,
    middleware::auth::AuthUser,
    services::auth_service,
};

// Flow: register, sign in, then fill in the default shipping address
// through the profile surface and read it back.
#[tokio::test]
async fn register_login_and_profile_flow() -> anyhow::Result<()> {
    let Some(database_url) = test_database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run auth flow tests.");
        return Ok(());
    };

    let state = setup_state(&database_url).await?;

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "hunter22".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(registered.token.starts_with("Bearer "));
    assert!(registered.user.shipping_address.is_none());

    // The email is now taken.
    let resp = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Ada Again".into(),
            email: "ada@example.com".into(),
            password: "hunter23".into(),
        },
    )
    .await;
    assert!(matches!(resp, Err(AppError::BadRequest(_))));

    // Wrong password is a 401, not a 404.
    let resp = auth_service::login_user(
        &state,
        LoginRequest {
            email: "ada@example.com".into(),
            password: "wrong-password".into(),
        },
    )
    .await;
    assert!(matches!(resp, Err(AppError::Unauthorized(_))));

    auth_service::login_user(
        &state,
        LoginRequest {
            email: "ada@example.com".into(),
            password: "hunter22".into(),
        },
    )
    .await?;

    let auth_user = AuthUser {
        user_id: registered.user.id,
        role: "user".into(),
    };

    // Saving an address makes it the stored checkout default.
    let updated = auth_service::update_profile(
        &state,
        &auth_user,
        UpdateProfileRequest {
            name: None,
            shipping_address: Some(shipping_address()),
        },
    )
    .await?
    .data
    .unwrap();
    let address = updated.shipping_address.expect("address stored");
    assert_eq!(address.city, "Testville");
    assert_eq!(updated.name, "Ada");

    // A name-only update leaves the address in place.
    auth_service::update_profile(
        &state,
        &auth_user,
        UpdateProfileRequest {
            name: Some("Ada Lovelace".into()),
            shipping_address: None,
        },
    )
    .await?;

    let me = auth_service::me(&state, &auth_user).await?.data.unwrap();
    assert_eq!(me.name, "Ada Lovelace");
    let address = me.shipping_address.expect("address retained");
    assert_eq!(address.postal_code, "12345");

    Ok(())
}
