use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use super::order::OrderStatus;

/// Coarse classification clients branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Order not found")]
    OrderNotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Insufficient stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: Uuid,
        requested: i32,
        available: i32,
    },
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Coupon not found or inactive")]
    CouponNotFound,
    #[error("Coupon is outside its validity window")]
    CouponExpired,
    #[error("Coupon has not been saved by this user")]
    CouponNotSaved,
    #[error("Coupon redemption limit reached")]
    CouponLimitReached,
    #[error("Order subtotal is below the coupon minimum of {minimum}")]
    CouponBelowMinimum { minimum: BigDecimal },
    #[error("Order is already canceled")]
    AlreadyCanceled,
    #[error("Order is already completed")]
    AlreadyCompleted,
    #[error("{}", cannot_cancel_message(.0))]
    CannotCancel(OrderStatus),
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Payment callback signature is invalid")]
    InvalidSignature,
    #[error("Payment window has expired")]
    PaymentExpired,
    #[error("Payment was declined by the gateway (code {0})")]
    PaymentDeclined(String),
    #[error("Paid amount {paid} does not match the order amount {expected}")]
    PaymentAmountMismatch { expected: BigDecimal, paid: BigDecimal },
    #[error("Checkout failed: {0}")]
    CheckoutFailed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

fn cannot_cancel_message(status: &OrderStatus) -> &'static str {
    match status {
        OrderStatus::Shipping => "Order is being shipped (đang vận chuyển) and can no longer be canceled",
        OrderStatus::Delivered => "Order has been delivered (đã giao hàng) and can no longer be canceled",
        _ => "Order can no longer be canceled",
    }
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound(_) | DomainError::OrderNotFound | DomainError::CouponNotFound => {
                ErrorKind::NotFound
            }
            DomainError::InvalidInput(_)
            | DomainError::InvalidQuantity
            | DomainError::EmptyCart
            | DomainError::CouponExpired
            | DomainError::CouponNotSaved
            | DomainError::CouponBelowMinimum { .. }
            | DomainError::InvalidSignature => ErrorKind::Validation,
            DomainError::InsufficientStock { .. }
            | DomainError::CouponLimitReached
            | DomainError::AlreadyCanceled
            | DomainError::AlreadyCompleted
            | DomainError::CannotCancel(_)
            | DomainError::InvalidTransition { .. }
            | DomainError::PaymentExpired
            | DomainError::PaymentDeclined(_)
            | DomainError::PaymentAmountMismatch { .. } => ErrorKind::Conflict,
            DomainError::CheckoutFailed(_) | DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code carried in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::OrderNotFound => "ORDER_NOT_FOUND",
            DomainError::InvalidInput(_) => "INVALID_INPUT",
            DomainError::InvalidQuantity => "INVALID_QUANTITY",
            DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            DomainError::EmptyCart => "EMPTY_CART",
            DomainError::CouponNotFound => "COUPON_NOT_FOUND",
            DomainError::CouponExpired => "COUPON_EXPIRED",
            DomainError::CouponNotSaved => "COUPON_NOT_SAVED",
            DomainError::CouponLimitReached => "COUPON_LIMIT_REACHED",
            DomainError::CouponBelowMinimum { .. } => "COUPON_BELOW_MINIMUM",
            DomainError::AlreadyCanceled => "ALREADY_CANCELED",
            DomainError::AlreadyCompleted => "ALREADY_COMPLETED",
            DomainError::CannotCancel(_) => "CANNOT_CANCEL",
            DomainError::InvalidTransition { .. } => "INVALID_TRANSITION",
            DomainError::InvalidSignature => "INVALID_SIGNATURE",
            DomainError::PaymentExpired => "PAYMENT_EXPIRED",
            DomainError::PaymentDeclined(_) => "PAYMENT_DECLINED",
            DomainError::PaymentAmountMismatch { .. } => "PAYMENT_AMOUNT_MISMATCH",
            DomainError::CheckoutFailed(_) => "CHECKOUT_FAILED",
            DomainError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipping_cancel_message_mentions_delivery_in_progress() {
        let err = DomainError::CannotCancel(OrderStatus::Shipping);
        assert!(err.to_string().contains("đang vận chuyển"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn stock_and_state_errors_are_conflicts() {
        let stock = DomainError::InsufficientStock {
            item: Uuid::new_v4(),
            requested: 2,
            available: 1,
        };
        assert_eq!(stock.kind(), ErrorKind::Conflict);
        assert_eq!(DomainError::AlreadyCanceled.kind(), ErrorKind::Conflict);
        assert_eq!(
            DomainError::InvalidTransition {
                from: OrderStatus::Processing,
                to: OrderStatus::Completed,
            }
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn validation_errors_are_classified() {
        assert_eq!(DomainError::InvalidQuantity.kind(), ErrorKind::Validation);
        assert_eq!(DomainError::EmptyCart.kind(), ErrorKind::Validation);
        assert_eq!(DomainError::EmptyCart.code(), "EMPTY_CART");
    }

    #[test]
    fn checkout_failure_is_internal() {
        let err = DomainError::CheckoutFailed("connection reset".to_string());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "Checkout failed: connection reset");
    }
}
