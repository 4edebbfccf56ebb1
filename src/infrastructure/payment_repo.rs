use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{CheckoutRequest, OrderView, PaymentMethod};
use crate::domain::payment::{GatewayOutcome, PaymentAttempt, PaymentAttemptStatus};
use crate::domain::ports::PaymentRepository;
use crate::schema::payment_attempts;

use super::models::{NewPaymentAttemptRow, PaymentAttemptRow};
use super::{checkout, order_repo};

impl TryFrom<PaymentAttemptRow> for PaymentAttempt {
    type Error = DomainError;

    fn try_from(row: PaymentAttemptRow) -> Result<Self, Self::Error> {
        Ok(PaymentAttempt {
            request: serde_json::from_value(row.request)
                .map_err(|e| DomainError::Internal(format!("stored checkout request: {e}")))?,
            status: PaymentAttemptStatus::from_str(&row.status)?,
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            order_id: row.order_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

/// What a callback did to its attempt. Rejections are returned as values so
/// the status they record is committed before the caller sees the error.
enum Settlement {
    Settled(OrderView),
    Rejected(DomainError),
}

fn mark(
    conn: &mut PgConnection,
    id: Uuid,
    status: PaymentAttemptStatus,
    order_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    diesel::update(payment_attempts::table.find(id))
        .set((
            payment_attempts::status.eq(status.as_str()),
            payment_attempts::order_id.eq(order_id),
            payment_attempts::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

fn settle_in(
    conn: &mut PgConnection,
    outcome: &GatewayOutcome,
    shipping_price: &BigDecimal,
    now: DateTime<Utc>,
) -> Result<Settlement, DomainError> {
    let attempt: PaymentAttempt = payment_attempts::table
        .find(outcome.txn_ref)
        .select(PaymentAttemptRow::as_select())
        .for_update()
        .first::<PaymentAttemptRow>(conn)
        .optional()?
        .ok_or(DomainError::NotFound("payment attempt"))?
        .try_into()?;

    match attempt.status {
        PaymentAttemptStatus::Committed => {
            let order_id = attempt.order_id.ok_or_else(|| {
                DomainError::Internal(format!("committed attempt {} has no order", attempt.id))
            })?;
            log::info!("Payment {} already committed as order {}", attempt.id, order_id);
            return order_repo::load_view(conn, order_id)?
                .map(Settlement::Settled)
                .ok_or(DomainError::OrderNotFound);
        }
        PaymentAttemptStatus::Expired => {
            return Ok(Settlement::Rejected(DomainError::PaymentExpired))
        }
        PaymentAttemptStatus::Failed => {
            return Ok(Settlement::Rejected(DomainError::PaymentDeclined(
                outcome.response_code.clone(),
            )))
        }
        PaymentAttemptStatus::Pending => {}
    }

    if attempt.is_expired(now) {
        mark(conn, attempt.id, PaymentAttemptStatus::Expired, None, now)?;
        return Ok(Settlement::Rejected(DomainError::PaymentExpired));
    }
    if !outcome.is_approved() {
        mark(conn, attempt.id, PaymentAttemptStatus::Failed, None, now)?;
        return Ok(Settlement::Rejected(DomainError::PaymentDeclined(
            outcome.response_code.clone(),
        )));
    }
    if let Err(mismatch) = outcome.ensure_amount(&attempt.amount) {
        log::warn!("Payment {} charged the wrong amount: {}", attempt.id, mismatch);
        mark(conn, attempt.id, PaymentAttemptStatus::Failed, None, now)?;
        return Ok(Settlement::Rejected(mismatch));
    }

    let request = CheckoutRequest {
        payment_method: PaymentMethod::Vnpay,
        ..attempt.request
    };
    // Savepoint: a total that drifted from the paid amount undoes the order
    // but keeps the FAILED mark.
    let committed = conn.transaction::<_, DomainError, _>(|conn| {
        let order = checkout::commit(conn, attempt.user_id, &request, shipping_price, now)?;
        if order.total_price != attempt.amount {
            return Err(DomainError::PaymentAmountMismatch {
                expected: order.total_price,
                paid: attempt.amount.clone(),
            });
        }
        Ok(order)
    });
    let order = match committed {
        Ok(order) => order,
        Err(mismatch @ DomainError::PaymentAmountMismatch { .. }) => {
            log::warn!("Payment {} no longer matches the cart: {}", attempt.id, mismatch);
            mark(conn, attempt.id, PaymentAttemptStatus::Failed, None, now)?;
            return Ok(Settlement::Rejected(mismatch));
        }
        Err(other) => return Err(other),
    };
    mark(
        conn,
        attempt.id,
        PaymentAttemptStatus::Committed,
        Some(order.id),
        now,
    )?;
    Ok(Settlement::Settled(order))
}

// ── Repository ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl PaymentRepository for DieselPaymentRepository {
    fn create_attempt(
        &self,
        user_id: Uuid,
        request: &CheckoutRequest,
        amount: &BigDecimal,
        expires_at: DateTime<Utc>,
    ) -> Result<PaymentAttempt, DomainError> {
        let mut conn = self.pool.get()?;

        let payload = serde_json::to_value(request)
            .map_err(|e| DomainError::Internal(format!("serialize checkout request: {e}")))?;
        let row = diesel::insert_into(payment_attempts::table)
            .values(&NewPaymentAttemptRow {
                id: Uuid::new_v4(),
                user_id,
                request: payload,
                amount: amount.clone(),
                status: PaymentAttemptStatus::Pending.as_str().to_string(),
                expires_at,
            })
            .returning(PaymentAttemptRow::as_returning())
            .get_result::<PaymentAttemptRow>(&mut conn)?;
        row.try_into()
    }

    fn settle(
        &self,
        outcome: &GatewayOutcome,
        shipping_price: &BigDecimal,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        let settlement = conn
            .transaction::<_, DomainError, _>(|conn| settle_in(conn, outcome, shipping_price, now))
            .map_err(checkout::into_checkout_failure)?;
        match settlement {
            Settlement::Settled(order) => Ok(order),
            Settlement::Rejected(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::{BigDecimal, Zero};
    use chrono::{Duration, Utc};
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselPaymentRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{OrderStatus, PaymentMethod};
    use crate::domain::payment::GatewayOutcome;
    use crate::domain::ports::{CartRepository, PaymentRepository};
    use crate::infrastructure::cart_repo::DieselCartRepository;
    use crate::infrastructure::test_support::{checkout_request, product_stock, seed_product, setup_db};
    use crate::schema::payment_attempts;

    fn outcome(txn_ref: Uuid, code: &str, amount: i64) -> GatewayOutcome {
        GatewayOutcome {
            txn_ref,
            response_code: code.to_string(),
            amount: BigDecimal::from(amount),
        }
    }

    fn stored_status(pool: &crate::db::DbPool, id: Uuid) -> String {
        let mut conn = pool.get().expect("conn");
        payment_attempts::table
            .find(id)
            .select(payment_attempts::status)
            .first(&mut conn)
            .expect("attempt")
    }

    #[tokio::test]
    async fn approved_callback_commits_once() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselPaymentRepository::new(pool.clone());
        let user = Uuid::new_v4();
        let product = {
            let mut conn = pool.get().expect("conn");
            seed_product(&mut conn, "120000", None, 3)
        };
        carts.add(user, product, None, 2).expect("add");

        let attempt = repo
            .create_attempt(
                user,
                &checkout_request(None),
                &BigDecimal::from(240_000),
                Utc::now() + Duration::minutes(15),
            )
            .expect("create attempt");

        let order = repo
            .settle(&outcome(attempt.id, "00", 240_000), &BigDecimal::zero(), Utc::now())
            .expect("settle");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_method, PaymentMethod::Vnpay);
        assert_eq!(stored_status(&pool, attempt.id), "COMMITTED");

        let replay = repo
            .settle(&outcome(attempt.id, "00", 240_000), &BigDecimal::zero(), Utc::now())
            .expect("replayed callback");
        assert_eq!(replay.id, order.id);

        let mut conn = pool.get().expect("conn");
        assert_eq!(product_stock(&mut conn, product), 1);
    }

    #[tokio::test]
    async fn declined_callback_marks_attempt_failed() {
        let (_container, pool) = setup_db().await;
        let repo = DieselPaymentRepository::new(pool.clone());
        let attempt = repo
            .create_attempt(
                Uuid::new_v4(),
                &checkout_request(None),
                &BigDecimal::from(1000),
                Utc::now() + Duration::minutes(15),
            )
            .expect("create attempt");

        let err = repo
            .settle(&outcome(attempt.id, "24", 1000), &BigDecimal::zero(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::PaymentDeclined(ref code) if code == "24"));
        assert_eq!(stored_status(&pool, attempt.id), "FAILED");
    }

    #[tokio::test]
    async fn late_callback_marks_attempt_expired() {
        let (_container, pool) = setup_db().await;
        let repo = DieselPaymentRepository::new(pool.clone());
        let attempt = repo
            .create_attempt(
                Uuid::new_v4(),
                &checkout_request(None),
                &BigDecimal::from(1000),
                Utc::now() + Duration::minutes(15),
            )
            .expect("create attempt");

        let err = repo
            .settle(
                &outcome(attempt.id, "00", 1000),
                &BigDecimal::zero(),
                Utc::now() + Duration::minutes(16),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::PaymentExpired));
        assert_eq!(stored_status(&pool, attempt.id), "EXPIRED");
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselPaymentRepository::new(pool);
        let err = repo
            .settle(&outcome(Uuid::new_v4(), "00", 1000), &BigDecimal::zero(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound("payment attempt")));
    }

    #[tokio::test]
    async fn cart_changed_after_payment_started_fails_the_attempt() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselPaymentRepository::new(pool.clone());
        let user = Uuid::new_v4();
        let product = {
            let mut conn = pool.get().expect("conn");
            seed_product(&mut conn, "120000", None, 5)
        };
        carts.add(user, product, None, 2).expect("add");

        let attempt = repo
            .create_attempt(
                user,
                &checkout_request(None),
                &BigDecimal::from(240_000),
                Utc::now() + Duration::minutes(15),
            )
            .expect("create attempt");
        carts.add(user, product, None, 1).expect("add more");

        let err = repo
            .settle(&outcome(attempt.id, "00", 240_000), &BigDecimal::zero(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::PaymentAmountMismatch { .. }), "{err:?}");
        assert_eq!(stored_status(&pool, attempt.id), "FAILED");

        let mut conn = pool.get().expect("conn");
        assert_eq!(product_stock(&mut conn, product), 5);
        let orders: i64 = crate::schema::orders::table
            .count()
            .get_result(&mut conn)
            .expect("count orders");
        assert_eq!(orders, 0);
        assert_eq!(carts.list(user).expect("cart").len(), 1);
    }

    #[tokio::test]
    async fn underpaid_callback_fails_the_attempt() {
        let (_container, pool) = setup_db().await;
        let carts = DieselCartRepository::new(pool.clone());
        let repo = DieselPaymentRepository::new(pool.clone());
        let user = Uuid::new_v4();
        let product = {
            let mut conn = pool.get().expect("conn");
            seed_product(&mut conn, "120000", None, 3)
        };
        carts.add(user, product, None, 2).expect("add");

        let attempt = repo
            .create_attempt(
                user,
                &checkout_request(None),
                &BigDecimal::from(240_000),
                Utc::now() + Duration::minutes(15),
            )
            .expect("create attempt");

        let err = repo
            .settle(&outcome(attempt.id, "00", 1), &BigDecimal::zero(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::PaymentAmountMismatch { .. }), "{err:?}");
        assert_eq!(stored_status(&pool, attempt.id), "FAILED");

        let mut conn = pool.get().expect("conn");
        assert_eq!(product_stock(&mut conn, product), 3);
    }
}
