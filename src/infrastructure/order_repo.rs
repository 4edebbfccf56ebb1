use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::VariantSelector;
use crate::domain::errors::DomainError;
use crate::domain::inventory::{self as inventory_rules, StockSlot};
use crate::domain::order::{
    CheckoutRequest, HistoryEntry, ListResult, OrderLineView, OrderStatus, OrderView, PaymentMethod,
    page_offset,
};
use crate::domain::ports::OrderRepository;
use crate::domain::pricing::Totals;
use crate::schema::{order_history, order_lines, orders, revenues};

use super::checkout;
use super::inventory;
use super::models::{NewOrderHistoryRow, NewRevenueRow, OrderHistoryRow, OrderLineRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

fn stored_status(raw: &str) -> Result<OrderStatus, DomainError> {
    OrderStatus::from_str(raw).map_err(|e| DomainError::Internal(e.to_string()))
}

// ── Shared helpers (also used by checkout and payment settlement) ────────────

pub(crate) fn append_history(
    conn: &mut PgConnection,
    order_id: Uuid,
    status: OrderStatus,
    note: Option<String>,
    actor_id: Uuid,
) -> Result<(), DomainError> {
    diesel::insert_into(order_history::table)
        .values(&NewOrderHistoryRow {
            id: Uuid::new_v4(),
            order_id,
            status: status.as_str().to_string(),
            note,
            actor_id,
        })
        .execute(conn)?;
    Ok(())
}

fn to_view(
    order: OrderRow,
    lines: Vec<OrderLineRow>,
    history: Vec<OrderHistoryRow>,
) -> Result<OrderView, DomainError> {
    let lines = lines
        .into_iter()
        .map(|l| {
            Ok(OrderLineView {
                variant: VariantSelector::parse(&l.variant_selector)
                    .map_err(|e| DomainError::Internal(e.to_string()))?,
                id: l.id,
                product_id: l.product_id,
                variant_id: l.variant_id,
                product_name: l.product_name,
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;
    let history = history
        .into_iter()
        .map(|h| {
            Ok(HistoryEntry {
                status: stored_status(&h.status)?,
                note: h.note,
                actor_id: h.actor_id,
                created_at: h.created_at,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    Ok(OrderView {
        status: stored_status(&order.status)?,
        payment_method: PaymentMethod::from_str(&order.payment_method)?,
        id: order.id,
        user_id: order.user_id,
        name: order.name,
        email: order.email,
        phone: order.phone,
        address: order.address,
        products_price: order.products_price,
        shipping_price: order.shipping_price,
        discount_price: order.discount_price,
        total_price: order.total_price,
        notes: order.notes,
        coupon_id: order.coupon_id,
        cancellation_reason: order.cancellation_reason,
        created_at: order.created_at,
        updated_at: order.updated_at,
        lines,
        history,
    })
}

/// Attaches lines and history to a batch of orders, preserving their order.
fn load_views(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<OrderView>, DomainError> {
    let lines = OrderLineRow::belonging_to(&rows)
        .select(OrderLineRow::as_select())
        .order((order_lines::position.asc(), order_lines::id.asc()))
        .load::<OrderLineRow>(conn)?
        .grouped_by(&rows);
    let history = OrderHistoryRow::belonging_to(&rows)
        .select(OrderHistoryRow::as_select())
        .order((order_history::created_at.asc(), order_history::id.asc()))
        .load::<OrderHistoryRow>(conn)?
        .grouped_by(&rows);

    rows.into_iter()
        .zip(lines)
        .zip(history)
        .map(|((order, lines), history)| to_view(order, lines, history))
        .collect()
}

pub(crate) fn load_view(conn: &mut PgConnection, id: Uuid) -> Result<Option<OrderView>, DomainError> {
    let order = orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .first::<OrderRow>(conn)
        .optional()?;

    let Some(order) = order else {
        return Ok(None);
    };
    Ok(load_views(conn, vec![order])?.pop())
}

fn lock_order(conn: &mut PgConnection, id: Uuid) -> Result<Option<OrderRow>, DomainError> {
    Ok(orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .for_update()
        .first::<OrderRow>(conn)
        .optional()?)
}

/// Writes `target` onto a locked order together with its side effects.
fn apply_transition(
    conn: &mut PgConnection,
    order: &OrderRow,
    target: OrderStatus,
    actor_id: Uuid,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    diesel::update(orders::table.find(order.id))
        .set((
            orders::status.eq(target.as_str()),
            orders::updated_at.eq(now),
        ))
        .execute(conn)?;

    match target {
        OrderStatus::Canceled => {
            diesel::update(orders::table.find(order.id))
                .set(orders::cancellation_reason.eq(note.as_deref()))
                .execute(conn)?;

            let lines = order_lines::table
                .filter(order_lines::order_id.eq(order.id))
                .select(OrderLineRow::as_select())
                .load::<OrderLineRow>(conn)?;
            let mut restores: Vec<(StockSlot, i32)> = lines
                .iter()
                .map(|l| (StockSlot::for_line(l.product_id, l.variant_id), l.quantity))
                .collect();
            inventory_rules::sort_for_locking(&mut restores, |(slot, _)| *slot);
            for (slot, quantity) in restores {
                inventory::restore(conn, slot, quantity)?;
            }
        }
        OrderStatus::Completed => {
            diesel::insert_into(revenues::table)
                .values(&NewRevenueRow {
                    id: Uuid::new_v4(),
                    order_id: order.id,
                    amount: order.total_price.clone(),
                    day: now.day() as i32,
                    month: now.month() as i32,
                    year: now.year(),
                })
                .execute(conn)?;
        }
        _ => {}
    }

    append_history(conn, order.id, target, note, actor_id)?;
    log::info!(
        "Order {} moved {} -> {} by {}",
        order.id,
        order.status,
        target,
        actor_id
    );
    Ok(())
}

// ── Repository ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn quote(
        &self,
        user_id: Uuid,
        request: &CheckoutRequest,
        shipping_price: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<Totals, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            checkout::price_cart(conn, user_id, request, shipping_price, now, false)
                .map(|priced| priced.totals)
        })
    }

    fn checkout(
        &self,
        user_id: Uuid,
        request: &CheckoutRequest,
        shipping_price: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            checkout::commit(conn, user_id, request, shipping_price, now)
        })
        .map_err(checkout::into_checkout_failure)
    }

    fn find_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .filter(orders::user_id.eq(user_id))
            .filter(orders::status.ne(OrderStatus::Deleted.as_str()))
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };
        Ok(load_views(&mut conn, vec![order])?.pop())
    }

    fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table
            .filter(orders::user_id.eq(user_id))
            .filter(orders::status.ne(OrderStatus::Deleted.as_str()))
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.desc()))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        let rows = query.load::<OrderRow>(&mut conn)?;
        load_views(&mut conn, rows)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;
        load_view(&mut conn, id)
    }

    fn list(
        &self,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let offset = page_offset(page, limit)?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let mut count_query = orders::table.into_boxed();
            let mut rows_query = orders::table
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.desc()))
                .limit(limit)
                .offset(offset)
                .into_boxed();
            if let Some(status) = status {
                count_query = count_query.filter(orders::status.eq(status.as_str()));
                rows_query = rows_query.filter(orders::status.eq(status.as_str()));
            }

            let total: i64 = count_query.count().get_result(conn)?;
            let rows = rows_query.load::<OrderRow>(conn)?;

            Ok(ListResult {
                items: load_views(conn, rows)?,
                total,
            })
        })
    }

    fn transition(
        &self,
        id: Uuid,
        target: OrderStatus,
        actor_id: Uuid,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, id)?.ok_or(DomainError::OrderNotFound)?;
            stored_status(&order.status)?.ensure_admin_transition(target)?;
            apply_transition(conn, &order, target, actor_id, note, now)?;
            load_view(conn, id)?.ok_or(DomainError::OrderNotFound)
        })
    }

    fn cancel(
        &self,
        user_id: Uuid,
        id: Uuid,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, id)?
                .filter(|o| o.user_id == user_id)
                .ok_or(DomainError::OrderNotFound)?;
            stored_status(&order.status)?.ensure_customer_cancel()?;
            apply_transition(conn, &order, OrderStatus::Canceled, user_id, Some(reason), now)?;
            load_view(conn, id)?.ok_or(DomainError::OrderNotFound)
        })
    }
}
