use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::contact::ContactRequest,
    error::AppResult,
    models::Contact,
    response::ApiResponse,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_contact))
}

#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Store a contact submission", body = ApiResponse<Contact>),
        (status = 400, description = "Validation failure"),
    ),
    tag = "Contacts"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::create_contact(&state, payload).await?;
    Ok(Json(resp))
}
