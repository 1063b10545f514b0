use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Append one row to the storefront audit trail: who did what to which
/// resource, with an optional JSON detail blob. Writes go through the raw
/// sqlx pool; the table has no SeaORM entity and no request path reads it.
/// Callers treat failures as log-and-continue, never as request errors.
pub async fn log_audit(
    pool: &DbPool,
    actor: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    detail: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO audit_logs (id, user_id, action, resource, metadata) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(actor)
    .bind(action)
    .bind(resource)
    .bind(detail)
    .execute(pool)
    .await?;

    tracing::debug!(action, "audit entry recorded");
    Ok(())
}
