use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, OrderStatus, OrderView};
use crate::domain::ports::OrderRepository;

/// Largest page the admin listing will return.
pub const MAX_PAGE_SIZE: i64 = 100;

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    // ── Customer ─────────────────────────────────────────────────────────────

    pub fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderView>, DomainError> {
        self.repo.list_for_user(user_id, status)
    }

    pub fn detail_for_user(&self, user_id: Uuid, id: Uuid) -> Result<OrderView, DomainError> {
        self.repo
            .find_for_user(user_id, id)?
            .ok_or(DomainError::OrderNotFound)
    }

    pub fn cancel(&self, user_id: Uuid, id: Uuid, reason: &str) -> Result<OrderView, DomainError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::InvalidInput(
                "reason_cancel is required".to_string(),
            ));
        }
        let order = self
            .repo
            .cancel(user_id, id, reason.to_string(), Utc::now())
            .inspect_err(|e| log::warn!("User {} could not cancel order {}: {}", user_id, id, e))?;
        log::info!("Order {} canceled by its owner {}", id, user_id);
        Ok(order)
    }

    // ── Admin ────────────────────────────────────────────────────────────────

    pub fn get(&self, id: Uuid) -> Result<OrderView, DomainError> {
        self.repo.find_by_id(id)?.ok_or(DomainError::OrderNotFound)
    }

    pub fn list(
        &self,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.repo
            .list(status, page.max(1), limit.clamp(1, MAX_PAGE_SIZE))
    }

    pub fn advance(
        &self,
        id: Uuid,
        target: OrderStatus,
        actor_id: Uuid,
        note: Option<String>,
    ) -> Result<OrderView, DomainError> {
        let note = note.filter(|n| !n.trim().is_empty());
        self.repo
            .transition(id, target, actor_id, note, Utc::now())
            .inspect_err(|e| log::warn!("Transition of order {} to {} rejected: {}", id, target, e))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::domain::order::CheckoutRequest;
    use crate::domain::pricing::Totals;

    /// Records what reaches the repository; everything else is out of scope here.
    #[derive(Default)]
    struct RecordingRepo {
        pages: Mutex<Vec<(i64, i64)>>,
        notes: Mutex<Vec<Option<String>>>,
    }

    impl OrderRepository for RecordingRepo {
        fn quote(
            &self,
            _: Uuid,
            _: &CheckoutRequest,
            _: &BigDecimal,
            _: DateTime<Utc>,
        ) -> Result<Totals, DomainError> {
            unimplemented!()
        }
        fn checkout(
            &self,
            _: Uuid,
            _: &CheckoutRequest,
            _: &BigDecimal,
            _: DateTime<Utc>,
        ) -> Result<OrderView, DomainError> {
            unimplemented!()
        }
        fn find_for_user(&self, _: Uuid, _: Uuid) -> Result<Option<OrderView>, DomainError> {
            Ok(None)
        }
        fn list_for_user(
            &self,
            _: Uuid,
            _: Option<OrderStatus>,
        ) -> Result<Vec<OrderView>, DomainError> {
            Ok(Vec::new())
        }
        fn find_by_id(&self, _: Uuid) -> Result<Option<OrderView>, DomainError> {
            Ok(None)
        }
        fn list(
            &self,
            _: Option<OrderStatus>,
            page: i64,
            limit: i64,
        ) -> Result<ListResult, DomainError> {
            self.pages.lock().unwrap().push((page, limit));
            Ok(ListResult {
                items: Vec::new(),
                total: 0,
            })
        }
        fn transition(
            &self,
            _: Uuid,
            _: OrderStatus,
            _: Uuid,
            note: Option<String>,
            _: DateTime<Utc>,
        ) -> Result<OrderView, DomainError> {
            self.notes.lock().unwrap().push(note);
            Err(DomainError::OrderNotFound)
        }
        fn cancel(
            &self,
            _: Uuid,
            _: Uuid,
            _: String,
            _: DateTime<Utc>,
        ) -> Result<OrderView, DomainError> {
            panic!("cancel must not reach the repository")
        }
    }

    #[test]
    fn blank_cancel_reason_is_rejected() {
        let service = OrderService::new(RecordingRepo::default());
        let err = service
            .cancel(Uuid::new_v4(), Uuid::new_v4(), "  \n")
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn missing_orders_are_not_found() {
        let service = OrderService::new(RecordingRepo::default());
        assert!(matches!(
            service.detail_for_user(Uuid::new_v4(), Uuid::new_v4()),
            Err(DomainError::OrderNotFound)
        ));
        assert!(matches!(
            service.get(Uuid::new_v4()),
            Err(DomainError::OrderNotFound)
        ));
    }

    #[test]
    fn admin_paging_is_clamped() {
        let service = OrderService::new(RecordingRepo::default());
        service.list(None, 0, 0).unwrap();
        service.list(None, 3, 5_000).unwrap();
        assert_eq!(
            service.repo.pages.lock().unwrap().as_slice(),
            &[(1, 1), (3, MAX_PAGE_SIZE)]
        );
    }

    #[test]
    fn blank_transition_note_is_dropped() {
        let service = OrderService::new(RecordingRepo::default());
        let _ = service.advance(
            Uuid::new_v4(),
            OrderStatus::Confirmed,
            Uuid::new_v4(),
            Some("   ".to_string()),
        );
        let _ = service.advance(
            Uuid::new_v4(),
            OrderStatus::Confirmed,
            Uuid::new_v4(),
            Some("packed".to_string()),
        );
        assert_eq!(
            service.repo.notes.lock().unwrap().as_slice(),
            &[None, Some("packed".to_string())]
        );
    }
}
