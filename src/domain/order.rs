use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::cart::VariantSelector;
use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Confirmed,
    Shipping,
    Delivered,
    Completed,
    Canceled,
    Deleted,
}

/// Forward path every fulfilled order walks through.
pub const FULFILMENT_SEQUENCE: [OrderStatus; 5] = [
    OrderStatus::Processing,
    OrderStatus::Confirmed,
    OrderStatus::Shipping,
    OrderStatus::Delivered,
    OrderStatus::Completed,
];

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipping => "SHIPPING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Deleted => "DELETED",
        }
    }

    pub fn next(&self) -> Option<OrderStatus> {
        let pos = FULFILMENT_SEQUENCE.iter().position(|s| s == self)?;
        FULFILMENT_SEQUENCE.get(pos + 1).copied()
    }

    pub fn is_cancelable(&self) -> bool {
        matches!(self, OrderStatus::Processing | OrderStatus::Confirmed)
    }

    /// Checks an admin-requested move to `target`.
    ///
    /// Allowed: one step forward along [`FULFILMENT_SEQUENCE`], CANCELED from
    /// PROCESSING/CONFIRMED, DELETED from CANCELED/COMPLETED.
    pub fn ensure_admin_transition(&self, target: OrderStatus) -> Result<(), DomainError> {
        let allowed = match target {
            OrderStatus::Canceled => self.is_cancelable(),
            OrderStatus::Deleted => {
                matches!(self, OrderStatus::Canceled | OrderStatus::Completed)
            }
            _ => self.next() == Some(target),
        };
        if allowed {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Checks a customer's own cancellation request.
    pub fn ensure_customer_cancel(&self) -> Result<(), DomainError> {
        match self {
            OrderStatus::Processing | OrderStatus::Confirmed => Ok(()),
            OrderStatus::Deleted => Err(DomainError::OrderNotFound),
            OrderStatus::Canceled => Err(DomainError::AlreadyCanceled),
            OrderStatus::Completed => Err(DomainError::AlreadyCompleted),
            OrderStatus::Shipping | OrderStatus::Delivered => Err(DomainError::CannotCancel(*self)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROCESSING" => Ok(OrderStatus::Processing),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "SHIPPING" => Ok(OrderStatus::Shipping),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELED" | "CANCELLED" => Ok(OrderStatus::Canceled),
            "DELETED" => Ok(OrderStatus::Deleted),
            other => Err(DomainError::InvalidInput(format!("unknown order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    Vnpay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::Vnpay => "VNPAY",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(PaymentMethod::Cod),
            "VNPAY" => Ok(PaymentMethod::Vnpay),
            other => Err(DomainError::Internal(format!("unknown payment method '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShippingInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ShippingInfo {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidInput(format!("{field} is required")));
            }
        }
        let email = self.email.trim();
        let plausible = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !plausible {
            return Err(DomainError::InvalidInput("email is invalid".to_string()));
        }
        Ok(())
    }
}

/// Everything a buyer submits to place an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub coupon: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.shipping.validate()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub variant: VariantSelector,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[schema(value_type = String)]
    pub products_price: BigDecimal,
    #[schema(value_type = String)]
    pub shipping_price: BigDecimal,
    #[schema(value_type = String)]
    pub discount_price: BigDecimal,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub coupon_id: Option<Uuid>,
    pub status: OrderStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Rows to skip for a 1-based page.
pub fn page_offset(page: i64, limit: i64) -> Result<i64, DomainError> {
    page.checked_sub(1)
        .and_then(|p| p.checked_mul(limit))
        .filter(|offset| *offset >= 0)
        .ok_or_else(|| DomainError::InvalidInput("page is out of range".to_string()))
}
