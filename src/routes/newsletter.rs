use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::newsletter::SubscribeRequest,
    error::AppResult,
    models::Subscriber,
    response::ApiResponse,
    services::newsletter_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/subscribe", post(subscribe))
}

#[utoipa::path(
    post,
    path = "/api/newsletter/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscribe an email address", body = ApiResponse<Subscriber>),
        (status = 400, description = "Invalid email"),
        (status = 409, description = "Already subscribed"),
    ),
    tag = "Newsletter"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<Subscriber>>> {
    let resp = newsletter_service::subscribe(&state, payload).await?;
    Ok(Json(resp))
}
