use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;
use super::order::CheckoutRequest;

/// Gateway response code meaning the payment went through.
pub const APPROVED_RESPONSE_CODE: &str = "00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAttemptStatus {
    Pending,
    Committed,
    Failed,
    Expired,
}

impl PaymentAttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentAttemptStatus::Pending => "PENDING",
            PaymentAttemptStatus::Committed => "COMMITTED",
            PaymentAttemptStatus::Failed => "FAILED",
            PaymentAttemptStatus::Expired => "EXPIRED",
        }
    }
}

impl FromStr for PaymentAttemptStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentAttemptStatus::Pending),
            "COMMITTED" => Ok(PaymentAttemptStatus::Committed),
            "FAILED" => Ok(PaymentAttemptStatus::Failed),
            "EXPIRED" => Ok(PaymentAttemptStatus::Expired),
            other => Err(DomainError::Internal(format!("unknown payment status '{other}'"))),
        }
    }
}

/// A checkout parked while the buyer is away at the payment gateway.
///
/// The id doubles as the gateway transaction reference, so a replayed
/// callback always lands on the same attempt.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub request: CheckoutRequest,
    pub amount: BigDecimal,
    pub status: PaymentAttemptStatus,
    pub order_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PaymentAttempt {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Verified result of a gateway return callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOutcome {
    pub txn_ref: Uuid,
    pub response_code: String,
    /// Amount the gateway charged, in VND.
    pub amount: BigDecimal,
}

impl GatewayOutcome {
    pub fn is_approved(&self) -> bool {
        self.response_code == APPROVED_RESPONSE_CODE
    }

    /// Fails unless the gateway charged exactly `expected`.
    pub fn ensure_amount(&self, expected: &BigDecimal) -> Result<(), DomainError> {
        if &self.amount != expected {
            return Err(DomainError::PaymentAmountMismatch {
                expected: expected.clone(),
                paid: self.amount.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentRedirect {
    pub redirect_url: String,
    pub txn_ref: Uuid,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::order::{PaymentMethod, ShippingInfo};

    fn attempt(expires_at: DateTime<Utc>) -> PaymentAttempt {
        PaymentAttempt {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            request: CheckoutRequest {
                shipping: ShippingInfo {
                    name: "B".to_string(),
                    email: "b@example.com".to_string(),
                    phone: "0911".to_string(),
                    address: "HCMC".to_string(),
                },
                payment_method: PaymentMethod::Vnpay,
                coupon: None,
                notes: None,
            },
            amount: BigDecimal::from(10_000),
            status: PaymentAttemptStatus::Pending,
            order_id: None,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn attempt_expires_after_deadline() {
        let now = Utc::now();
        let a = attempt(now + Duration::minutes(15));
        assert!(!a.is_expired(now));
        assert!(a.is_expired(now + Duration::minutes(16)));
    }

    #[test]
    fn only_code_00_is_approved() {
        let ok = GatewayOutcome {
            txn_ref: Uuid::new_v4(),
            response_code: "00".to_string(),
            amount: BigDecimal::from(10_000),
        };
        let declined = GatewayOutcome {
            response_code: "24".to_string(),
            ..ok.clone()
        };
        assert!(ok.is_approved());
        assert!(!declined.is_approved());
    }

    #[test]
    fn charged_amount_must_match_attempt() {
        let outcome = GatewayOutcome {
            txn_ref: Uuid::new_v4(),
            response_code: "00".to_string(),
            amount: BigDecimal::from_str("240000.00").unwrap(),
        };
        assert!(outcome.ensure_amount(&BigDecimal::from(240_000)).is_ok());
        assert!(matches!(
            outcome.ensure_amount(&BigDecimal::from(360_000)),
            Err(DomainError::PaymentAmountMismatch { .. })
        ));
    }
}
