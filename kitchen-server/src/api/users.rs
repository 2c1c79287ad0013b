//! User endpoints: sign-in upsert, admin check, role management

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{User, UserCreate};

use crate::auth::{Identity, ensure_self_or_admin};
use crate::security_log;
use crate::state::AppState;

use super::{ApiJson, ApiResult, DeleteResult, InsertResult};

#[derive(Debug, Serialize)]
pub struct AdminCheck {
    pub admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub acknowledged: bool,
}

/// GET /users (admin)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(Json(state.store.list_users().await?))
}

/// GET /users/admin/{email}
pub async fn check_admin(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(email): Path<String>,
) -> ApiResult<AdminCheck> {
    ensure_self_or_admin(state.store.as_ref(), &identity, &email).await?;

    let admin = state
        .store
        .find_user_by_email(&email)
        .await?
        .is_some_and(|user| user.role().is_admin());

    Ok(Json(AdminCheck { admin }))
}

/// POST /users
///
/// Upsert by email: a second sign-in with the same email inserts nothing.
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<UserCreate>,
) -> ApiResult<InsertResult> {
    if user.email.trim().is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "email is required").into());
    }

    let result = match state.store.insert_user_if_absent(user).await? {
        Some(id) => InsertResult::inserted(id),
        None => InsertResult {
            inserted_id: None,
            acknowledged: true,
            message: Some("already exist"),
        },
    };
    Ok(Json(result))
}

/// PATCH /users/admin/{id} (admin)
pub async fn promote_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<UpdateResult> {
    if !state.store.promote_to_admin(&id).await? {
        return Err(AppError::with_message(
            ErrorCode::UserNotFound,
            format!("User {id} not found"),
        )
        .into());
    }

    security_log!("INFO", "role_granted", user_id = id, granted_by = identity.email);
    Ok(Json(UpdateResult {
        matched_count: 1,
        modified_count: 1,
        acknowledged: true,
    }))
}

/// DELETE /users/{id} (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResult> {
    let deleted = state.store.delete_user(&id).await?;
    if deleted {
        security_log!("INFO", "user_deleted", user_id = id, deleted_by = identity.email);
    }
    Ok(Json(DeleteResult::new(deleted)))
}
