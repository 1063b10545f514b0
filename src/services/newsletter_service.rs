use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set, SqlErr};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::newsletter::SubscribeRequest,
    entity::subscribers::ActiveModel as SubscriberActive,
    error::{AppError, AppResult},
    models::Subscriber,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn subscribe(
    state: &AppState,
    payload: SubscribeRequest,
) -> AppResult<ApiResponse<Subscriber>> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    let inserted = SubscriberActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    let subscriber = match inserted {
        Ok(s) => s,
        Err(err) => {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(AppError::Conflict("Email is already subscribed".into()));
            }
            return Err(err.into());
        }
    };

    // Fire-and-forget: a mail failure is logged by the send path and never
    // fails the subscription response.
    let mailer = state.mailer.clone();
    let to = subscriber.email.clone();
    tokio::spawn(async move {
        if let Err(err) = mailer.send_welcome(&to).await {
            tracing::error!(to = %to, error = %err, "welcome email failed after retries");
        }
    });

    Ok(ApiResponse::success(
        "Subscribed successfully",
        Subscriber {
            id: subscriber.id,
            email: subscriber.email,
            created_at: subscriber.created_at.with_timezone(&Utc),
        },
        Some(Meta::empty()),
    ))
}
