//! Review endpoints

use axum::{Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{Review, ReviewCreate};

use crate::state::AppState;

use super::{ApiJson, ApiResult};

pub async fn list_reviews(State(state): State<AppState>) -> ApiResult<Vec<Review>> {
    Ok(Json(state.store.list_reviews().await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    ApiJson(review): ApiJson<ReviewCreate>,
) -> ApiResult<Review> {
    if !(0.0..=5.0).contains(&review.rating) {
        return Err(AppError::new(ErrorCode::ReviewInvalidRating)
            .with_detail("rating", review.rating)
            .into());
    }
    if review.name.trim().is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "name is required").into());
    }
    Ok(Json(state.store.insert_review(review).await?))
}
