use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::{CartLineView, VariantSelector};
use super::coupon::{CouponQuote, CouponRef};
use super::errors::DomainError;
use super::order::{CheckoutRequest, ListResult, OrderStatus, OrderView};
use super::payment::{GatewayOutcome, PaymentAttempt};
use super::pricing::Totals;

pub trait CartRepository: Send + Sync + 'static {
    fn list(&self, user_id: Uuid) -> Result<Vec<CartLineView>, DomainError>;
    fn add(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        selector: Option<VariantSelector>,
        quantity: i32,
    ) -> Result<CartLineView, DomainError>;
    fn set_quantity(&self, user_id: Uuid, line_id: Uuid, quantity: i32)
        -> Result<CartLineView, DomainError>;
    fn remove(&self, user_id: Uuid, line_id: Uuid) -> Result<(), DomainError>;
    fn clear(&self, user_id: Uuid) -> Result<usize, DomainError>;
}

pub trait CouponRepository: Send + Sync + 'static {
    fn quote(
        &self,
        user_id: Uuid,
        coupon: &CouponRef,
        subtotal: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<CouponQuote, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Prices the user's cart as a checkout would, without committing.
    fn quote(
        &self,
        user_id: Uuid,
        request: &CheckoutRequest,
        shipping_price: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<Totals, DomainError>;
    /// Turns the user's cart into an order in one transaction.
    fn checkout(
        &self,
        user_id: Uuid,
        request: &CheckoutRequest,
        shipping_price: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError>;
    fn find_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderView>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(
        &self,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError>;
    fn transition(
        &self,
        id: Uuid,
        target: OrderStatus,
        actor_id: Uuid,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError>;
    fn cancel(
        &self,
        user_id: Uuid,
        id: Uuid,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError>;
}

pub trait PaymentRepository: Send + Sync + 'static {
    fn create_attempt(
        &self,
        user_id: Uuid,
        request: &CheckoutRequest,
        amount: &BigDecimal,
        expires_at: DateTime<Utc>,
    ) -> Result<PaymentAttempt, DomainError>;
    /// Applies a verified gateway callback to its attempt.
    ///
    /// Approved and pending attempts commit the stored checkout; an already
    /// committed attempt returns its order unchanged.
    fn settle(
        &self,
        outcome: &GatewayOutcome,
        shipping_price: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError>;
}

pub trait PaymentGateway: Send + Sync + 'static {
    fn redirect_url(&self, attempt: &PaymentAttempt, client_ip: &str) -> Result<String, DomainError>;
    fn verify_callback(&self, params: &BTreeMap<String, String>) -> Result<GatewayOutcome, DomainError>;
}
