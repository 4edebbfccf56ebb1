use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use uuid::Uuid;

use crate::domain::coupon::{CouponQuote, CouponRef};
use crate::domain::errors::DomainError;
use crate::domain::ports::CouponRepository;

pub struct CouponService<R> {
    repo: R,
}

impl<R: CouponRepository> CouponService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Previews the discount `coupon` would give on `subtotal`. Nothing is redeemed.
    pub fn apply(
        &self,
        user_id: Uuid,
        coupon: &str,
        subtotal: &BigDecimal,
    ) -> Result<CouponQuote, DomainError> {
        if subtotal < &BigDecimal::zero() {
            return Err(DomainError::InvalidInput(
                "order subtotal must not be negative".to_string(),
            ));
        }
        let coupon_ref = CouponRef::parse(coupon)?;
        self.repo
            .quote(user_id, &coupon_ref, subtotal, Utc::now())
            .inspect_err(|e| log::debug!("Coupon {:?} rejected for user {}: {}", coupon_ref, user_id, e))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, Utc};

    use super::*;

    #[derive(Default)]
    struct RecordingRepo {
        calls: Mutex<Vec<CouponRef>>,
    }

    impl CouponRepository for RecordingRepo {
        fn quote(
            &self,
            _user_id: Uuid,
            coupon: &CouponRef,
            subtotal: &BigDecimal,
            _now: DateTime<Utc>,
        ) -> Result<CouponQuote, DomainError> {
            self.calls.lock().unwrap().push(coupon.clone());
            Ok(CouponQuote {
                coupon_id: Uuid::nil(),
                code: "SALE10".to_string(),
                subtotal: subtotal.clone(),
                discount_amount: BigDecimal::from(10),
                saved_coupon_id: Uuid::nil(),
            })
        }
    }

    #[test]
    fn blank_code_never_reaches_repository() {
        let service = CouponService::new(RecordingRepo::default());
        let err = service
            .apply(Uuid::new_v4(), "   ", &BigDecimal::from(100))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert!(service.repo.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn negative_subtotal_is_rejected() {
        let service = CouponService::new(RecordingRepo::default());
        assert!(matches!(
            service.apply(Uuid::new_v4(), "SALE10", &BigDecimal::from(-1)),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn code_is_trimmed_before_lookup() {
        let service = CouponService::new(RecordingRepo::default());
        service
            .apply(Uuid::new_v4(), "  SALE10 ", &BigDecimal::from(100))
            .unwrap();
        assert_eq!(
            service.repo.calls.lock().unwrap().as_slice(),
            &[CouponRef::Code("SALE10".to_string())]
        );
    }
}
