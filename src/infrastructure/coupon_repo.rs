use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::coupon::{
    self, Coupon, CouponQuote, CouponRef, CouponStatus, RedemptionContext, SavedCouponStatus,
};
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::domain::ports::CouponRepository;
use crate::schema::{coupons, orders, saved_coupons};

use super::models::{CouponRow, SavedCouponRow};

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        Ok(Coupon {
            status: CouponStatus::from_str(&row.status)?,
            id: row.id,
            code: row.code,
            discount_percent: row.discount_percent,
            max_discount_amount: row.max_discount_amount,
            min_order_total: row.min_order_total,
            max_redemptions_per_user: row.max_redemptions_per_user,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
        })
    }
}

/// Validates a coupon for `user_id` against `subtotal` and prices the discount.
///
/// The user's unused saved coupon row is locked so two checkouts cannot
/// spend the same saved coupon.
pub(crate) fn quote_in(
    conn: &mut PgConnection,
    user_id: Uuid,
    coupon_ref: &CouponRef,
    subtotal: &BigDecimal,
    now: DateTime<Utc>,
) -> Result<CouponQuote, DomainError> {
    let query = coupons::table.select(CouponRow::as_select()).into_boxed();
    let query = match coupon_ref {
        CouponRef::Id(id) => query.filter(coupons::id.eq(*id)),
        CouponRef::Code(code) => query.filter(coupons::code.eq(code.clone())),
    };
    let coupon: Coupon = query
        .first::<CouponRow>(conn)
        .optional()?
        .ok_or(DomainError::CouponNotFound)?
        .try_into()?;

    let saved = saved_coupons::table
        .filter(saved_coupons::user_id.eq(user_id))
        .filter(saved_coupons::coupon_id.eq(coupon.id))
        .filter(saved_coupons::status.eq(SavedCouponStatus::Unused.as_str()))
        .order(saved_coupons::created_at.asc())
        .select(SavedCouponRow::as_select())
        .for_update()
        .first::<SavedCouponRow>(conn)
        .optional()?;

    let prior_redemptions: i64 = orders::table
        .filter(orders::user_id.eq(user_id))
        .filter(orders::coupon_id.eq(coupon.id))
        .filter(orders::status.ne(OrderStatus::Canceled.as_str()))
        .count()
        .get_result(conn)?;

    let discount_amount = coupon::redeem(
        &coupon,
        subtotal,
        now,
        RedemptionContext {
            holds_unused_saved_coupon: saved.is_some(),
            prior_redemptions,
        },
    )?;
    let saved = saved.ok_or(DomainError::CouponNotSaved)?;

    Ok(CouponQuote {
        coupon_id: coupon.id,
        code: coupon.code,
        subtotal: subtotal.clone(),
        discount_amount,
        saved_coupon_id: saved.id,
    })
}

pub(crate) fn mark_used(
    conn: &mut PgConnection,
    saved_coupon_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    diesel::update(saved_coupons::table.find(saved_coupon_id))
        .set((
            saved_coupons::status.eq(SavedCouponStatus::Used.as_str()),
            saved_coupons::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

// ── Repository ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DieselCouponRepository {
    pool: DbPool,
}

impl DieselCouponRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CouponRepository for DieselCouponRepository {
    fn quote(
        &self,
        user_id: Uuid,
        coupon: &CouponRef,
        subtotal: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<CouponQuote, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| quote_in(conn, user_id, coupon, subtotal, now))
    }
}
