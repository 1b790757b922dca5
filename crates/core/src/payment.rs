//! Payment seam. Only the placeholder gateway exists; a real one would
//! implement [`PaymentProcessor`] and be handed to [`crate::Gallery`].

use std::fmt::Debug;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Proof of a successful charge, copied onto the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub method: String,
    pub reference: String,
}

#[async_trait]
pub trait PaymentProcessor: Debug + Send + Sync {
    async fn charge(
        &self,
        amount: Decimal,
        currency: &str,
        payer: UserId,
    ) -> Result<PaymentReceipt, PaymentError>;
}

/// Test gateway: approves any positive amount.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestPaymentProcessor;

#[async_trait]
impl PaymentProcessor for TestPaymentProcessor {
    async fn charge(
        &self,
        amount: Decimal,
        currency: &str,
        payer: UserId,
    ) -> Result<PaymentReceipt, PaymentError> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::Declined(format!(
                "amount must be positive, got {amount} {currency}"
            )));
        }
        let reference = format!("test_{}", Uuid::new_v4().simple());
        tracing::debug!(%payer, %amount, currency, %reference, "test payment approved");
        Ok(PaymentReceipt {
            method: "test".to_string(),
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn approves_positive_amounts() {
        let receipt = TestPaymentProcessor
            .charge(Decimal::new(1999, 2), "USD", UserId::new_random())
            .await
            .unwrap();
        assert_eq!(receipt.method, "test");
        assert!(receipt.reference.starts_with("test_"));
    }

    #[tokio::test]
    async fn declines_zero() {
        let err = TestPaymentProcessor
            .charge(Decimal::ZERO, "USD", UserId::new_random())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Declined(_)));
    }
}
