use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::contact::{ContactList, ContactRequest},
    entity::contacts::{ActiveModel as ContactActive, Column as ContactCol, Entity as Contacts, Model as ContactModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Contact,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_contact(
    state: &AppState,
    payload: ContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    payload.validate()?;

    let contact = ContactActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        email: Set(payload.email),
        subject: Set(payload.subject),
        message: Set(payload.message),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Contact info created successfully",
        contact_from_entity(contact),
        Some(Meta::empty()),
    ))
}

pub async fn list_contacts(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ContactList>> {
    ensure_admin(user)?;

    let items = Contacts::find()
        .order_by_desc(ContactCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(contact_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        ContactList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_contact(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Contact>> {
    ensure_admin(user)?;

    let contact = Contacts::find_by_id(id).one(&state.orm).await?;
    let contact = match contact {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "OK",
        contact_from_entity(contact),
        None,
    ))
}

fn contact_from_entity(model: ContactModel) -> Contact {
    Contact {
        id: model.id,
        name: model.name,
        email: model.email,
        subject: model.subject,
        message: model.message,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
