use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::Principal;
use crate::domain::coupon::CouponQuote;
use crate::errors::AppError;
use crate::handlers::response;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    /// Coupon code, or the coupon's UUID.
    pub coupon: String,
    /// Decimal as a string, e.g. "500000".
    #[schema(value_type = String)]
    pub order_subtotal: BigDecimal,
}

/// POST /api/coupons/apply
///
/// Previews the discount a coupon gives on a subtotal. The coupon is only
/// redeemed when an order using it is placed.
#[utoipa::path(
    post,
    path = "/api/coupons/apply",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Discount the coupon would give", body = CouponQuote),
        (status = 400, description = "Coupon expired, not saved, below minimum or used up"),
        (status = 404, description = "Coupon not found or inactive"),
    ),
    security(("bearer_auth" = [])),
    tag = "coupons"
)]
pub async fn apply_coupon(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<ApplyCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let quote = web::block(move || {
        state
            .coupons
            .apply(principal.user_id, &body.coupon, &body.order_subtotal)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Coupon applied", quote))
}
