pub mod admin_orders;
pub mod cart;
pub mod checkout;
pub mod coupons;
pub mod orders;
pub mod response;

use crate::errors::AppError;

/// Status filters arrive as free text; blank means "any".
pub(crate) fn parse_status(
    raw: Option<&str>,
) -> Result<Option<crate::domain::order::OrderStatus>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(Some(s.parse()?)),
        None => Ok(None),
    }
}
