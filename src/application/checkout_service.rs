use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{CheckoutRequest, OrderView, PaymentMethod};
use crate::domain::payment::PaymentRedirect;
use crate::domain::ports::{OrderRepository, PaymentGateway, PaymentRepository};

/// Places orders, either directly (cash on delivery) or through the
/// VNPay redirect handshake.
pub struct CheckoutService<O, P, G> {
    orders: O,
    payments: P,
    gateway: G,
    shipping_fee: BigDecimal,
    payment_ttl: Duration,
}

impl<O, P, G> CheckoutService<O, P, G>
where
    O: OrderRepository,
    P: PaymentRepository,
    G: PaymentGateway,
{
    pub fn new(
        orders: O,
        payments: P,
        gateway: G,
        shipping_fee: BigDecimal,
        payment_ttl: Duration,
    ) -> Self {
        Self {
            orders,
            payments,
            gateway,
            shipping_fee,
            payment_ttl,
        }
    }

    pub fn checkout(&self, user_id: Uuid, request: CheckoutRequest) -> Result<OrderView, DomainError> {
        request.validate()?;
        if request.payment_method == PaymentMethod::Vnpay {
            return Err(DomainError::InvalidInput(
                "VNPAY orders are placed through checkout_vnpay".to_string(),
            ));
        }

        match self
            .orders
            .checkout(user_id, &request, &self.shipping_fee, Utc::now())
        {
            Ok(order) => {
                log::info!(
                    "Checkout for user {} created order {} totalling {}",
                    user_id,
                    order.id,
                    order.total_price
                );
                Ok(order)
            }
            Err(e @ DomainError::CheckoutFailed(_)) => {
                log::error!("Checkout for user {} failed: {}", user_id, e);
                Err(e)
            }
            Err(e) => {
                log::warn!("Checkout for user {} rejected: {}", user_id, e);
                Err(e)
            }
        }
    }

    /// Prices the cart, parks the request as a payment attempt and returns the
    /// signed gateway URL the buyer is sent to.
    pub fn initiate_payment(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
        client_ip: &str,
    ) -> Result<PaymentRedirect, DomainError> {
        request.validate()?;
        let request = CheckoutRequest {
            payment_method: PaymentMethod::Vnpay,
            ..request
        };

        let now = Utc::now();
        let totals = self
            .orders
            .quote(user_id, &request, &self.shipping_fee, now)?;
        let attempt = self.payments.create_attempt(
            user_id,
            &request,
            &totals.total_price,
            now + self.payment_ttl,
        )?;
        let redirect_url = self.gateway.redirect_url(&attempt, client_ip)?;

        log::info!(
            "Payment attempt {} opened for user {} ({} VND, expires {})",
            attempt.id,
            user_id,
            attempt.amount,
            attempt.expires_at
        );
        Ok(PaymentRedirect {
            redirect_url,
            txn_ref: attempt.id,
            amount: attempt.amount,
            expires_at: attempt.expires_at,
        })
    }

    /// Handles the buyer's return from the gateway.
    pub fn complete_payment(&self, params: &BTreeMap<String, String>) -> Result<OrderView, DomainError> {
        let outcome = self
            .gateway
            .verify_callback(params)
            .inspect_err(|e| log::warn!("Rejected payment callback: {}", e))?;

        let order = self
            .payments
            .settle(&outcome, &self.shipping_fee, Utc::now())
            .inspect_err(|e| {
                log::warn!("Payment {} not settled: {}", outcome.txn_ref, e)
            })?;
        log::info!("Payment {} settled as order {}", outcome.txn_ref, order.id);
        Ok(order)
    }
}
