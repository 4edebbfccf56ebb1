use std::collections::BTreeMap;

use actix_web::{web, HttpRequest, HttpResponse};
// Aliased so utoipa's actix extension does not try to derive a schema for `Bytes`.
use actix_web::web::Bytes as RawBody;

use crate::auth::Principal;
use crate::domain::order::{CheckoutRequest, OrderView};
use crate::domain::payment::PaymentRedirect;
use crate::errors::AppError;
use crate::handlers::response;
use crate::state::AppState;

/// POST /api/checkout
///
/// Turns the caller's cart into an order in a single transaction: lines are
/// priced, the coupon redeemed, stock taken and the cart cleared, or nothing
/// happens at all.
#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed", body = OrderView),
        (status = 400, description = "Empty cart, invalid shipping info, coupon rejected, insufficient stock or checkout failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "checkout"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();

    let order = web::block(move || state.checkout.checkout(principal.user_id, request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Order placed", order))
}

/// POST /api/checkout_vnpay
///
/// Opens a payment attempt and returns the signed VNPay URL to redirect the
/// buyer to. The order is only created once the gateway reports success.
#[utoipa::path(
    post,
    path = "/api/checkout_vnpay",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Gateway redirect", body = PaymentRedirect),
        (status = 400, description = "Empty cart, invalid shipping info or coupon rejected"),
    ),
    security(("bearer_auth" = [])),
    tag = "checkout"
)]
pub async fn checkout_vnpay(
    state: web::Data<AppState>,
    principal: Principal,
    req: HttpRequest,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let client_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("127.0.0.1")
        .to_string();

    let redirect = web::block(move || {
        state
            .checkout
            .initiate_payment(principal.user_id, request, &client_ip)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Redirect to payment gateway", redirect))
}

/// Gateway parameters arrive as the query string the buyer was returned with,
/// or re-posted by the storefront as a flat JSON object.
fn callback_params(req: &HttpRequest, body: &[u8]) -> Result<BTreeMap<String, String>, AppError> {
    let mut params: BTreeMap<String, String> = serde_urlencoded::from_str(req.query_string())
        .map_err(|e| AppError::BadRequest(format!("malformed query string: {e}")))?;
    if !body.iter().all(u8::is_ascii_whitespace) {
        let posted: BTreeMap<String, String> = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("malformed callback body: {e}")))?;
        params.extend(posted);
    }
    Ok(params)
}

/// POST /api/return_checkout_vnpay
///
/// Verifies the gateway signature and settles the payment attempt. The
/// signature authenticates the call; replays return the order already placed.
#[utoipa::path(
    post,
    path = "/api/return_checkout_vnpay",
    responses(
        (status = 200, description = "Payment settled, order placed", body = OrderView),
        (status = 400, description = "Bad signature, payment declined, expired or amount mismatch"),
        (status = 404, description = "Unknown transaction reference"),
    ),
    tag = "checkout"
)]
pub async fn return_checkout_vnpay(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: RawBody,
) -> Result<HttpResponse, AppError> {
    let params = callback_params(&req, &body)?;

    let order = web::block(move || state.checkout.complete_payment(&params))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Payment completed", order))
}
