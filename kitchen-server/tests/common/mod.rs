#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use kitchen_server::api::create_router;
use kitchen_server::assistant::{ChatAssistant, ChatError};
use kitchen_server::auth::TokenService;
use kitchen_server::db::MemoryStore;
use kitchen_server::stripe::{PaymentError, PaymentProcessor};
use kitchen_server::AppState;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const GUEST: &str = "guest@kitchen.test";
pub const OTHER: &str = "other@kitchen.test";
pub const ADMIN: &str = "admin@kitchen.test";

/// Returns `secret_{amount}_{currency}` so tests can see what was requested
pub struct FakeProcessor;

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<String, PaymentError> {
        Ok(format!("secret_{amount}_{currency}"))
    }
}

pub struct EchoAssistant;

#[async_trait]
impl ChatAssistant for EchoAssistant {
    async fn reply(&self, message: &str) -> Result<String, ChatError> {
        if message == "fail" {
            return Err(ChatError::Upstream("quota exceeded".into()));
        }
        Ok(format!("echo: {message}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(SECRET);
        let state = AppState::new(
            store.clone(),
            tokens.clone(),
            Arc::new(FakeProcessor),
            "usd",
            Arc::new(EchoAssistant),
        );
        let router = create_router(state, &["http://localhost:5173".to_string()]);
        Self {
            router,
            store,
            tokens,
        }
    }

    pub fn token_for(&self, email: &str) -> String {
        self.tokens.issue(email).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }
}
