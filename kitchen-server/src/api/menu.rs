//! Menu endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{MenuItem, MenuItemInput};

use crate::state::AppState;

use super::{ApiJson, ApiResult, DeleteResult};

fn validate(input: &MenuItemInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "name is required"));
    }
    if input.category.trim().is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "category is required"));
    }
    if input.price <= Decimal::ZERO {
        return Err(AppError::new(ErrorCode::MenuItemInvalidPrice));
    }
    Ok(())
}

fn menu_item_not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::MenuItemNotFound, format!("Menu item {id} not found"))
}

/// GET /menu
pub async fn list_menu(State(state): State<AppState>) -> ApiResult<Vec<MenuItem>> {
    Ok(Json(state.store.list_menu().await?))
}

/// GET /menu/{id}
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MenuItem> {
    let item = state
        .store
        .find_menu_item(&id)
        .await?
        .ok_or_else(|| menu_item_not_found(&id))?;
    Ok(Json(item))
}

/// POST /menu (admin)
pub async fn create_menu_item(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> ApiResult<MenuItem> {
    validate(&input)?;
    Ok(Json(state.store.insert_menu_item(input).await?))
}

/// PATCH /menu/{id} (admin)
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> ApiResult<MenuItem> {
    validate(&input)?;
    let item = state
        .store
        .update_menu_item(&id, input)
        .await?
        .ok_or_else(|| menu_item_not_found(&id))?;
    Ok(Json(item))
}

/// DELETE /menu/{id} (admin)
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResult> {
    Ok(Json(DeleteResult::new(state.store.delete_menu_item(&id).await?)))
}
