//! Checkout endpoints: payment intents, settlement, payment history

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::error::ErrorCode;
use shared::models::{Payment, PaymentDraft};

use crate::auth::{Identity, ensure_self, ensure_self_or_admin};
use crate::ledger::SettlementOutcome;
use crate::state::AppState;

use super::{ApiJson, ApiResult, DeleteResult, InsertResult};

#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    #[serde(default)]
    pub price: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Body returned after settling a payment
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub payment_result: InsertResult,
    pub delete_result: DeleteResult,
    /// `settled`, or `partial` when some cart items were already gone
    pub status: &'static str,
    /// `SettlementIncomplete` on a partial settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub missing_cart_ids: Vec<String>,
}

impl From<SettlementOutcome> for SettlementResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        let (status, code) = if outcome.is_partial() {
            ("partial", Some(ErrorCode::SettlementIncomplete))
        } else {
            ("settled", None)
        };
        Self {
            payment_result: InsertResult::inserted(outcome.payment_id),
            delete_result: DeleteResult {
                deleted_count: outcome.deleted_count,
                acknowledged: true,
            },
            status,
            code,
            missing_cart_ids: outcome.missing_cart_ids,
        }
    }
}

/// POST /create-payment-intent
pub async fn create_payment_intent(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PaymentIntentRequest>,
) -> ApiResult<PaymentIntentResponse> {
    let client_secret = state.ledger.create_payment_intent(&req.price).await?;
    Ok(Json(PaymentIntentResponse { client_secret }))
}

/// POST /payments
///
/// The payment must be recorded under the caller's own email.
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(draft): ApiJson<PaymentDraft>,
) -> ApiResult<SettlementResponse> {
    ensure_self(&identity, &draft.email)?;

    let outcome = state.ledger.settle_payment(draft).await?;
    Ok(Json(outcome.into()))
}

/// GET /payments/{email}
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(email): Path<String>,
) -> ApiResult<Vec<Payment>> {
    ensure_self_or_admin(state.store.as_ref(), &identity, &email).await?;
    Ok(Json(state.store.list_payments(&email).await?))
}
