//! Identity token issuance

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::auth::TokenError;
use crate::state::AppState;

use super::{ApiJson, ApiResult};

/// Only the email is read; other sign-in fields are ignored
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /jwt
pub async fn issue_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> ApiResult<TokenResponse> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "email is required").into());
    }

    let token = state.tokens.issue(email).map_err(|e| {
        tracing::error!(error = %e, "Token issuance failed");
        match e {
            TokenError::Signing(_) => AppError::new(ErrorCode::TokenSigningFailed),
            _ => AppError::internal("Token issuance failed"),
        }
    })?;

    Ok(Json(TokenResponse { token }))
}
