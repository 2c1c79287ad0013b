//! Stripe integration via REST API (no SDK dependency)

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

const STRIPE_API_BASE: &str = "https://api.stripe.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment processor request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Payment processor rejected the request: {0}")]
    Rejected(String),
}

/// Creates payment intents with an external processor
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create an intent for `amount` minor units and return its client secret
    async fn create_payment_intent(&self, amount: i64, currency: &str)
    -> Result<String, PaymentError>;
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            secret_key: secret_key.into(),
            base_url: STRIPE_API_BASE.to_string(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<String, PaymentError> {
        let amount = amount.to_string();
        let resp: serde_json::Value = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("payment_method_types[]", "card"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if let Some(message) = resp["error"]["message"].as_str() {
            return Err(PaymentError::Rejected(message.to_string()));
        }

        resp["client_secret"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| PaymentError::Rejected(format!("no client_secret in response: {resp}")))
    }
}
