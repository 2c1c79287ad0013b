//! Cart endpoints
//!
//! A cart item belongs to the identity whose email it carries.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CartItem, CartItemCreate};

use crate::auth::{Identity, ensure_self_or_admin};
use crate::state::AppState;

use super::{ApiJson, ApiResult, DeleteResult, InsertResult};

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub email: Option<String>,
}

/// GET /carts?email=
///
/// Without `email` the caller's own cart is listed.
pub async fn list_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<CartQuery>,
) -> ApiResult<Vec<CartItem>> {
    let email = query.email.unwrap_or_else(|| identity.email.clone());
    ensure_self_or_admin(state.store.as_ref(), &identity, &email).await?;

    Ok(Json(state.store.list_cart(&email).await?))
}

/// POST /carts
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(item): ApiJson<CartItemCreate>,
) -> ApiResult<InsertResult> {
    ensure_self_or_admin(state.store.as_ref(), &identity, &item.email).await?;

    let item = state.store.insert_cart_item(item).await?;
    Ok(Json(InsertResult::inserted(item.id)))
}

/// DELETE /carts/{id}
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResult> {
    let item = state.store.find_cart_item(&id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::CartItemNotFound, format!("Cart item {id} not found"))
    })?;
    ensure_self_or_admin(state.store.as_ref(), &identity, &item.email).await?;

    Ok(Json(DeleteResult::new(state.store.delete_cart_item(&id).await?)))
}
