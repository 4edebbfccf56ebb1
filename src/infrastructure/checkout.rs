use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::coupon::{CouponQuote, CouponRef};
use crate::domain::errors::DomainError;
use crate::domain::inventory::{self as inventory_rules, StockSlot};
use crate::domain::order::{CheckoutRequest, OrderStatus, OrderView};
use crate::domain::pricing::{self, Totals};
use crate::schema::{order_lines, orders};

use super::cart_repo::{self, PricedLine};
use super::models::{NewOrderLineRow, NewOrderRow};
use super::{coupon_repo, inventory, order_repo};

/// The user's cart priced for checkout.
pub(crate) struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub coupon: Option<CouponQuote>,
    pub totals: Totals,
}

pub(crate) fn price_cart(
    conn: &mut PgConnection,
    user_id: Uuid,
    request: &CheckoutRequest,
    shipping_price: &BigDecimal,
    now: DateTime<Utc>,
    lock: bool,
) -> Result<PricedCart, DomainError> {
    let lines = cart_repo::load_lines(conn, user_id, lock)?;
    if lines.is_empty() {
        return Err(DomainError::EmptyCart);
    }
    if lines.iter().any(|l| !l.purchasable) {
        return Err(DomainError::NotFound("product"));
    }

    let products_price = pricing::subtotal(lines.iter().map(|l| (&l.unit_price, l.row.quantity)));

    let coupon = match request.coupon.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(coupon_repo::quote_in(
            conn,
            user_id,
            &CouponRef::parse(raw)?,
            &products_price,
            now,
        )?),
        _ => None,
    };
    let discount = coupon
        .as_ref()
        .map(|q| q.discount_amount.clone())
        .unwrap_or_else(BigDecimal::zero);

    Ok(PricedCart {
        totals: Totals::compute(products_price, shipping_price.clone(), discount),
        lines,
        coupon,
    })
}

/// Turns the user's cart into a PROCESSING order.
///
/// Must run inside a transaction: any error (an empty cart, a rejected
/// coupon, a stock row that cannot cover its line) leaves nothing behind.
pub(crate) fn commit(
    conn: &mut PgConnection,
    user_id: Uuid,
    request: &CheckoutRequest,
    shipping_price: &BigDecimal,
    now: DateTime<Utc>,
) -> Result<OrderView, DomainError> {
    let PricedCart {
        lines,
        coupon,
        totals,
    } = price_cart(conn, user_id, request, shipping_price, now, true)?;

    let order_id = Uuid::new_v4();
    diesel::insert_into(orders::table)
        .values(&NewOrderRow {
            id: order_id,
            user_id,
            name: request.shipping.name.trim().to_string(),
            email: request.shipping.email.trim().to_string(),
            phone: request.shipping.phone.trim().to_string(),
            address: request.shipping.address.trim().to_string(),
            products_price: totals.products_price,
            shipping_price: totals.shipping_price,
            discount_price: totals.discount_price,
            total_price: totals.total_price,
            notes: request.notes.clone().filter(|n| !n.trim().is_empty()),
            payment_method: request.payment_method.as_str().to_string(),
            coupon_id: coupon.as_ref().map(|q| q.coupon_id),
            status: OrderStatus::Processing.as_str().to_string(),
        })
        .execute(conn)?;

    let new_lines: Vec<NewOrderLineRow> = lines
        .iter()
        .zip(0..)
        .map(|(l, position)| NewOrderLineRow {
            id: Uuid::new_v4(),
            order_id,
            position,
            product_id: l.row.product_id,
            variant_id: l.row.variant_id,
            variant_selector: l.row.variant_selector.clone(),
            product_name: l.product_name.clone(),
            quantity: l.row.quantity,
            unit_price: l.unit_price.clone(),
        })
        .collect();
    diesel::insert_into(order_lines::table)
        .values(&new_lines)
        .execute(conn)?;

    order_repo::append_history(conn, order_id, OrderStatus::Processing, None, user_id)?;

    let mut takes: Vec<(StockSlot, i32)> =
        lines.iter().map(|l| (l.slot, l.row.quantity)).collect();
    inventory_rules::sort_for_locking(&mut takes, |(slot, _)| *slot);
    for (slot, quantity) in takes {
        inventory::take(conn, slot, quantity)?;
    }

    if let Some(quote) = &coupon {
        coupon_repo::mark_used(conn, quote.saved_coupon_id, now)?;
    }
    cart_repo::clear_lines(conn, user_id)?;

    log::info!(
        "Order {} placed by user {} ({} lines, coupon: {})",
        order_id,
        user_id,
        lines.len(),
        coupon.as_ref().map_or("none", |q| q.code.as_str())
    );

    order_repo::load_view(conn, order_id)?.ok_or(DomainError::OrderNotFound)
}

/// Unexpected failures inside the commit are reported as `CheckoutFailed`;
/// business rejections pass through unchanged.
pub(crate) fn into_checkout_failure(err: DomainError) -> DomainError {
    match err {
        DomainError::Internal(msg) => DomainError::CheckoutFailed(msg),
        other => other,
    }
}
