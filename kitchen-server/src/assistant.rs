//! Chat assistant backed by the Gemini `generateContent` API

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed instruction prepended to every question
const INSTRUCTION: &str = "You are a helpful assistant for a restaurant ordering site.
- If the question is about food or the restaurant: answer in at most 2-3 lines, focusing on taste, quality, or the menu.
- If the question is about salad: mention fresh, healthy salads made from premium ingredients, then answer.
- If the question is about pizza: mention cheesy pizzas baked to perfection, then answer.
- If the question is about soup: mention warm, flavorful soups, then answer.
- If the question is about dessert: mention desserts to sweeten the day, then answer.
- Otherwise: answer briefly, at most 2-3 lines.";

/// Returned when the model produced no text
pub const NO_RESPONSE: &str = "No response from AI.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Chat service error: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait ChatAssistant: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String, ChatError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

fn build_prompt(message: &str) -> String {
    format!("{INSTRUCTION}\nQuestion: {message}")
}

fn extract_text(resp: &serde_json::Value) -> Option<&str> {
    resp["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .filter(|t| !t.trim().is_empty())
}

#[async_trait]
impl ChatAssistant for GeminiClient {
    async fn reply(&self, message: &str) -> Result<String, ChatError> {
        if self.api_key.is_empty() {
            return Err(ChatError::Upstream("GEMINI_API_KEY is not configured".into()));
        }

        let resp: serde_json::Value = self
            .http
            .post(format!(
                "{GEMINI_API_BASE}/models/{}:generateContent",
                self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{ "role": "user", "parts": [{ "text": build_prompt(message) }] }]
            }))
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = resp["error"]["message"].as_str() {
            return Err(ChatError::Upstream(err.to_string()));
        }

        Ok(extract_text(&resp).unwrap_or(NO_RESPONSE).to_string())
    }
}
