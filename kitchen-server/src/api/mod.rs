//! HTTP routes
//!
//! Routes are grouped by the guards they need and merged into one router:
//! public, identity (valid token), and admin (valid token + admin role).

pub mod carts;
pub mod chat;
pub mod extract;
pub mod health;
pub mod menu;
pub mod payments;
pub mod reviews;
pub mod stats;
pub mod token;
pub mod users;

use axum::routing::{delete, get, patch, post};
use axum::{Json, Router, middleware};
use http::{HeaderValue, header};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{require_admin, require_identity};
use crate::error::ServiceError;
use crate::state::AppState;

pub use extract::ApiJson;

pub type ApiResult<T> = Result<Json<T>, ServiceError>;

/// Body returned after a single insert
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub inserted_id: Option<String>,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl InsertResult {
    pub fn inserted(id: String) -> Self {
        Self {
            inserted_id: Some(id),
            acknowledged: true,
            message: None,
        }
    }
}

/// Body returned after a delete
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
    pub acknowledged: bool,
}

impl DeleteResult {
    pub fn new(deleted: bool) -> Self {
        Self {
            deleted_count: u64::from(deleted),
            acknowledged: true,
        }
    }
}

/// Create the combined router
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let public = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/jwt", post(token::issue_token))
        .route("/users", post(users::create_user))
        .route("/menu", get(menu::list_menu))
        .route("/menu/{id}", get(menu::get_menu_item))
        .route("/reviews", get(reviews::list_reviews).post(reviews::create_review))
        .route("/order-stats", get(stats::order_stats))
        .route("/api/chat", post(chat::chat));

    // Valid token required; ownership is checked per handler
    let identity = Router::new()
        .route("/users/admin/{id}", get(users::check_admin))
        .route("/carts", get(carts::list_cart).post(carts::add_to_cart))
        .route("/carts/{id}", delete(carts::remove_from_cart))
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent),
        )
        .route("/payments", post(payments::create_payment))
        .route("/payments/{email}", get(payments::list_payments))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    // Identity runs first, then the role lookup
    let admin = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/admin/{id}", patch(users::promote_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/menu", post(menu::create_menu_item))
        .route(
            "/menu/{id}",
            patch(menu::update_menu_item).delete(menu::delete_menu_item),
        )
        .route("/admin-stats", get(stats::admin_stats))
        .route("/settlement-issues", get(stats::settlement_issues))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    Router::new()
        .merge(public)
        .merge(identity)
        .merge(admin)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
