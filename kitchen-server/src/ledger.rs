//! Order ledger
//!
//! Turns a checked-out cart into a payment: creates the processor intent,
//! then records the payment and retires the cart items it paid for.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::PaymentDraft;

use crate::db::{SettlementStore, StoreError};
use crate::error::{ServiceError, ServiceResult};
use crate::stripe::PaymentProcessor;

/// Convert a decimal price to minor currency units (cents), truncating.
///
/// Accepts a JSON number or a numeric string.
pub fn amount_in_minor_units(price: &Value) -> Result<i64, AppError> {
    let parsed = match price {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    let price = parsed.ok_or_else(|| {
        AppError::validation("Price must be a number").with_detail("field", "price")
    })?;

    if price <= Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidAmount,
            "Price must be positive",
        ));
    }

    price
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.trunc())
        .and_then(|cents| cents.to_i64())
        .filter(|cents| *cents > 0)
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::PaymentInvalidAmount, "Invalid payment amount")
        })
}

/// Result of settling one payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub payment_id: String,
    /// Distinct cart ids the payment referenced
    pub requested: usize,
    pub deleted_count: u64,
    pub missing_cart_ids: Vec<String>,
}

impl SettlementOutcome {
    pub fn is_partial(&self) -> bool {
        !self.missing_cart_ids.is_empty()
    }
}

#[derive(Clone)]
pub struct OrderLedger {
    store: Arc<dyn SettlementStore>,
    processor: Arc<dyn PaymentProcessor>,
    currency: String,
}

impl OrderLedger {
    pub fn new(
        store: Arc<dyn SettlementStore>,
        processor: Arc<dyn PaymentProcessor>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            processor,
            currency: currency.into(),
        }
    }

    /// Create a processor intent for `price` and return its client secret
    pub async fn create_payment_intent(&self, price: &Value) -> Result<String, AppError> {
        let amount = amount_in_minor_units(price)?;

        self.processor
            .create_payment_intent(amount, &self.currency)
            .await
            .map_err(|e| {
                tracing::error!(amount, currency = %self.currency, error = %e, "Payment intent failed");
                AppError::payment_processor(e.to_string())
            })
    }

    /// Record a payment and remove the cart items it references.
    ///
    /// Cart items that were already gone are not an error: the outcome is
    /// partial, a settlement issue is recorded, and the caller sees
    /// `missing_cart_ids`.
    pub async fn settle_payment(&self, mut draft: PaymentDraft) -> ServiceResult<SettlementOutcome> {
        validate_draft(&mut draft)?;

        let record = self.store.settle(&draft).await.map_err(|e| match e {
            StoreError::Duplicate(_) => ServiceError::App(
                AppError::new(ErrorCode::PaymentAlreadyRecorded)
                    .with_detail("transactionId", draft.transaction_id.clone()),
            ),
            other => ServiceError::Store(other),
        })?;

        let outcome = SettlementOutcome {
            payment_id: record.payment_id,
            requested: draft.cart_ids.len(),
            deleted_count: record.deleted_count,
            missing_cart_ids: record.missing_cart_ids,
        };

        if outcome.is_partial() {
            tracing::warn!(
                code = %ErrorCode::SettlementIncomplete,
                payment_id = %outcome.payment_id,
                email = %draft.email,
                requested = outcome.requested,
                deleted = outcome.deleted_count,
                missing = ?outcome.missing_cart_ids,
                "Partial settlement recorded"
            );
        } else {
            tracing::info!(
                payment_id = %outcome.payment_id,
                deleted = outcome.deleted_count,
                "Payment settled"
            );
        }

        Ok(outcome)
    }
}

fn validate_draft(draft: &mut PaymentDraft) -> Result<(), AppError> {
    if draft.email.trim().is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "email is required"));
    }
    if draft.transaction_id.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "transactionId is required",
        ));
    }
    if draft.price <= Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidAmount,
            "Price must be positive",
        ));
    }

    // Same id twice would count as missing on the second pass
    let mut seen = std::collections::HashSet::new();
    draft.cart_ids.retain(|id| seen.insert(id.clone()));

    if draft.cart_ids.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::CartEmpty,
            "cartId must list at least one cart item",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::stripe::PaymentError;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedProcessor(Result<&'static str, &'static str>);

    #[async_trait]
    impl PaymentProcessor for FixedProcessor {
        async fn create_payment_intent(
            &self,
            _amount: i64,
            _currency: &str,
        ) -> Result<String, PaymentError> {
            self.0
                .map(String::from)
                .map_err(|e| PaymentError::Rejected(e.to_string()))
        }
    }

    fn ledger(store: Arc<MemoryStore>, processor: FixedProcessor) -> OrderLedger {
        OrderLedger::new(store, Arc::new(processor), "usd")
    }

    fn draft(cart_ids: &[&str]) -> PaymentDraft {
        PaymentDraft {
            email: "guest@kitchen.test".to_string(),
            price: Decimal::new(2500, 2),
            transaction_id: "pi_123".to_string(),
            date: None,
            cart_ids: cart_ids.iter().map(|s| s.to_string()).collect(),
            menu_item_ids: vec!["m1".to_string(), "m2".to_string()],
            status: Some("pending".to_string()),
        }
    }

    #[test]
    fn test_amount_in_minor_units() {
        assert_eq!(amount_in_minor_units(&json!(12.5)).unwrap(), 1250);
        assert_eq!(amount_in_minor_units(&json!(10)).unwrap(), 1000);
        assert_eq!(amount_in_minor_units(&json!("7.99")).unwrap(), 799);
        assert_eq!(amount_in_minor_units(&json!(0.019)).unwrap(), 1);
        assert_eq!(amount_in_minor_units(&json!(19.999)).unwrap(), 1999);
    }

    #[test]
    fn test_amount_rejects_invalid_prices() {
        let err = amount_in_minor_units(&json!("abc")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        assert!(amount_in_minor_units(&json!(null)).is_err());
        assert!(amount_in_minor_units(&json!(true)).is_err());

        let err = amount_in_minor_units(&json!(0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentInvalidAmount);
        assert!(amount_in_minor_units(&json!(-3.5)).is_err());
        // Rounds down to zero cents
        assert!(amount_in_minor_units(&json!(0.004)).is_err());
    }

    #[tokio::test]
    async fn test_create_payment_intent() {
        let ledger = ledger(Arc::new(MemoryStore::new()), FixedProcessor(Ok("pi_secret")));
        let secret = ledger.create_payment_intent(&json!(12.5)).await.unwrap();
        assert_eq!(secret, "pi_secret");
    }

    #[tokio::test]
    async fn test_create_payment_intent_processor_failure() {
        let ledger = ledger(Arc::new(MemoryStore::new()), FixedProcessor(Err("card declined")));
        let err = ledger.create_payment_intent(&json!(12.5)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentProcessorError);
    }

    #[tokio::test]
    async fn test_settle_removes_exactly_the_referenced_items() {
        let store = Arc::new(MemoryStore::new());
        for id in ["c1", "c2", "c3"] {
            store
                .seed_cart_item(id, "guest@kitchen.test", "m1", Decimal::TEN)
                .await;
        }
        let ledger = ledger(store.clone(), FixedProcessor(Ok("s")));

        let outcome = ledger.settle_payment(draft(&["c1", "c2"])).await.unwrap();

        assert!(!outcome.is_partial());
        assert_eq!(outcome.requested, 2);
        assert_eq!(outcome.deleted_count, 2);
        let remaining = store.all_cart_items().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "c3");
        assert!(store.list_settlement_issues().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_reports_vanished_items() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_cart_item("c1", "guest@kitchen.test", "m1", Decimal::TEN)
            .await;
        let ledger = ledger(store.clone(), FixedProcessor(Ok("s")));

        let outcome = ledger
            .settle_payment(draft(&["c1", "gone"]))
            .await
            .unwrap();

        assert!(outcome.is_partial());
        assert_eq!(outcome.deleted_count, 1);
        assert_eq!(outcome.missing_cart_ids, vec!["gone"]);

        let issues = store.list_settlement_issues().await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].payment_id, outcome.payment_id);
        assert_eq!(issues[0].missing_cart_ids, vec!["gone"]);
    }

    #[tokio::test]
    async fn test_settle_deduplicates_cart_ids() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_cart_item("c1", "guest@kitchen.test", "m1", Decimal::TEN)
            .await;
        let ledger = ledger(store, FixedProcessor(Ok("s")));

        let outcome = ledger.settle_payment(draft(&["c1", "c1"])).await.unwrap();

        assert_eq!(outcome.requested, 1);
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn test_settle_duplicate_transaction() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store, FixedProcessor(Ok("s")));
        ledger.settle_payment(draft(&["c1"])).await.unwrap();

        let err: AppError = ledger
            .settle_payment(draft(&["c1"]))
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::PaymentAlreadyRecorded);
    }

    #[tokio::test]
    async fn test_settle_rejects_empty_cart() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store.clone(), FixedProcessor(Ok("s")));

        let err: AppError = ledger.settle_payment(draft(&[])).await.unwrap_err().into();

        assert_eq!(err.code, ErrorCode::CartEmpty);
        assert_eq!(store.operations(), 0);
    }
}
