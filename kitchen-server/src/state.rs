//! Application state

use std::sync::Arc;

use crate::assistant::{ChatAssistant, GeminiClient};
use crate::auth::TokenService;
use crate::config::Config;
use crate::db::{PgStore, Store};
use crate::ledger::OrderLedger;
use crate::reporting::ReportingAggregator;
use crate::stripe::{PaymentProcessor, StripeClient};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub ledger: OrderLedger,
    pub reporting: ReportingAggregator,
    pub assistant: Arc<dyn ChatAssistant>,
}

impl AppState {
    pub fn new<S: Store + 'static>(
        store: Arc<S>,
        tokens: TokenService,
        processor: Arc<dyn PaymentProcessor>,
        currency: impl Into<String>,
        assistant: Arc<dyn ChatAssistant>,
    ) -> Self {
        Self {
            ledger: OrderLedger::new(store.clone(), processor, currency),
            reporting: ReportingAggregator::new(store.clone()),
            store,
            tokens,
            assistant,
        }
    }

    /// Connect to PostgreSQL and build the external clients
    pub async fn from_config(config: &Config) -> Result<Self, BoxError> {
        let store = Arc::new(PgStore::connect(&config.database_url).await?);
        let processor = Arc::new(StripeClient::new(config.stripe_secret_key.clone())?);
        let assistant = Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )?);

        Ok(Self::new(
            store,
            TokenService::new(&config.jwt_secret),
            processor,
            config.payment_currency.clone(),
            assistant,
        ))
    }
}
