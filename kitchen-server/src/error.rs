//! Unified service-layer error type
//!
//! `ServiceError` bridges store errors ([`StoreError`]) and the API-layer
//! error ([`AppError`]) so handlers can propagate both with `?`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::StoreError;

/// - `Store`: store/infrastructure errors (database failures are logged and
///   mapped to InternalError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(StoreError::NotFound(msg)) => {
                AppError::with_message(ErrorCode::NotFound, msg)
            }
            ServiceError::Store(StoreError::Duplicate(msg)) => {
                AppError::with_message(ErrorCode::AlreadyExists, msg)
            }
            ServiceError::Store(StoreError::Database(msg)) => {
                tracing::error!(error = %msg, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
