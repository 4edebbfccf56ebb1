use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing::round_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponStatus {
    Active,
    Inactive,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Active => "ACTIVE",
            CouponStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for CouponStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(CouponStatus::Active),
            "INACTIVE" => Ok(CouponStatus::Inactive),
            other => Err(DomainError::Internal(format!("unknown coupon status '{other}'"))),
        }
    }
}

/// State of a coupon a user has saved to their wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedCouponStatus {
    Unused,
    Used,
    Expired,
}

impl SavedCouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavedCouponStatus::Unused => "UNUSED",
            SavedCouponStatus::Used => "USED",
            SavedCouponStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for SavedCouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a client names a coupon: either its id or its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRef {
    Id(Uuid),
    Code(String),
}

impl CouponRef {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::InvalidInput("coupon must not be blank".to_string()));
        }
        Ok(match Uuid::parse_str(raw) {
            Ok(id) => CouponRef::Id(id),
            Err(_) => CouponRef::Code(raw.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: i32,
    pub max_discount_amount: BigDecimal,
    pub min_order_total: BigDecimal,
    pub max_redemptions_per_user: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: CouponStatus,
}

impl Coupon {
    /// Percentage discount on `subtotal`, capped at `max_discount_amount`.
    pub fn discount_for(&self, subtotal: &BigDecimal) -> Result<BigDecimal, DomainError> {
        if subtotal < &self.min_order_total {
            return Err(DomainError::CouponBelowMinimum {
                minimum: self.min_order_total.clone(),
            });
        }
        let raw = round_money(
            &(subtotal * BigDecimal::from(self.discount_percent) / BigDecimal::from(100)),
        );
        let capped = if raw > self.max_discount_amount {
            self.max_discount_amount.clone()
        } else {
            raw
        };
        Ok(if capped < BigDecimal::zero() {
            BigDecimal::zero()
        } else {
            capped
        })
    }
}

/// What the user knows about their own use of a coupon.
#[derive(Debug, Clone, Copy)]
pub struct RedemptionContext {
    pub holds_unused_saved_coupon: bool,
    pub prior_redemptions: i64,
}

/// Full redemption check: status, window, wallet, per-user limit, minimum.
pub fn redeem(
    coupon: &Coupon,
    subtotal: &BigDecimal,
    now: DateTime<Utc>,
    context: RedemptionContext,
) -> Result<BigDecimal, DomainError> {
    if coupon.status != CouponStatus::Active {
        return Err(DomainError::CouponNotFound);
    }
    if now < coupon.starts_at || now > coupon.ends_at {
        return Err(DomainError::CouponExpired);
    }
    if !context.holds_unused_saved_coupon {
        return Err(DomainError::CouponNotSaved);
    }
    if context.prior_redemptions >= i64::from(coupon.max_redemptions_per_user) {
        return Err(DomainError::CouponLimitReached);
    }
    coupon.discount_for(subtotal)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CouponQuote {
    pub coupon_id: Uuid,
    pub code: String,
    #[schema(value_type = String)]
    pub subtotal: BigDecimal,
    #[schema(value_type = String)]
    pub discount_amount: BigDecimal,
    #[serde(skip)]
    pub saved_coupon_id: Uuid,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn coupon(percent: i32, max: &str, min: &str) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4(),
            code: "SALE10".to_string(),
            discount_percent: percent,
            max_discount_amount: dec(max),
            min_order_total: dec(min),
            max_redemptions_per_user: 1,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            status: CouponStatus::Active,
        }
    }

    fn fresh() -> RedemptionContext {
        RedemptionContext {
            holds_unused_saved_coupon: true,
            prior_redemptions: 0,
        }
    }

    #[test]
    fn discount_is_capped_at_maximum() {
        let c = coupon(10, "40000", "100000");
        let discount = redeem(&c, &dec("500000"), Utc::now(), fresh()).unwrap();
        assert_eq!(discount, dec("40000"));
    }

    #[test]
    fn discount_below_cap_is_percentage() {
        let c = coupon(10, "40000", "100000");
        assert_eq!(c.discount_for(&dec("200000")).unwrap(), dec("20000"));
    }

    #[test]
    fn discount_never_exceeds_cap() {
        for percent in [0, 1, 15, 50, 99, 100] {
            for subtotal in ["0", "1", "99.99", "1000", "123456.78", "99999999"] {
                let c = coupon(percent, "250", "0");
                let d = c.discount_for(&dec(subtotal)).unwrap();
                assert!(d <= dec("250"), "{percent}% of {subtotal} gave {d}");
                assert!(d >= BigDecimal::zero());
            }
        }
    }

    #[test]
    fn subtotal_below_minimum_rejected() {
        let c = coupon(10, "40000", "100000");
        let err = redeem(&c, &dec("99999"), Utc::now(), fresh()).unwrap_err();
        assert!(matches!(err, DomainError::CouponBelowMinimum { .. }));
    }

    #[test]
    fn inactive_coupon_is_not_found() {
        let mut c = coupon(10, "40000", "0");
        c.status = CouponStatus::Inactive;
        let err = redeem(&c, &dec("1000"), Utc::now(), fresh()).unwrap_err();
        assert!(matches!(err, DomainError::CouponNotFound));
    }

    #[test]
    fn coupon_outside_window_is_expired() {
        let c = coupon(10, "40000", "0");
        let later = c.ends_at + Duration::seconds(1);
        let err = redeem(&c, &dec("1000"), later, fresh()).unwrap_err();
        assert!(matches!(err, DomainError::CouponExpired));
    }

    #[test]
    fn unsaved_coupon_rejected() {
        let c = coupon(10, "40000", "0");
        let context = RedemptionContext {
            holds_unused_saved_coupon: false,
            prior_redemptions: 0,
        };
        let err = redeem(&c, &dec("1000"), Utc::now(), context).unwrap_err();
        assert!(matches!(err, DomainError::CouponNotSaved));
    }

    #[test]
    fn per_user_limit_enforced() {
        let c = coupon(10, "40000", "0");
        let context = RedemptionContext {
            holds_unused_saved_coupon: true,
            prior_redemptions: 1,
        };
        let err = redeem(&c, &dec("1000"), Utc::now(), context).unwrap_err();
        assert!(matches!(err, DomainError::CouponLimitReached));
    }

    #[test]
    fn coupon_ref_accepts_id_or_code() {
        let id = Uuid::new_v4();
        assert_eq!(CouponRef::parse(&id.to_string()).unwrap(), CouponRef::Id(id));
        assert_eq!(
            CouponRef::parse(" SALE10 ").unwrap(),
            CouponRef::Code("SALE10".to_string())
        );
        assert!(CouponRef::parse("   ").is_err());
    }
}
