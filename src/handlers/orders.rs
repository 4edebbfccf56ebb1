use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::Principal;
use crate::domain::order::OrderView;
use crate::errors::AppError;
use crate::handlers::{parse_status, response};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Only orders in this status, e.g. `SHIPPING`.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CancelOrderRequest {
    pub reason_cancel: String,
}

/// GET /api/orders/list
///
/// The caller's orders, newest first. Deleted orders are never listed.
#[utoipa::path(
    get,
    path = "/api/orders/list",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Caller's orders", body = [OrderView]),
        (status = 400, description = "Unknown status"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    principal: Principal,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let status = parse_status(query.status.as_deref())?;

    let orders = web::block(move || state.orders.list_for_user(principal.user_id, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Orders loaded", orders))
}

/// GET /api/orders/detail/{id}
#[utoipa::path(
    get,
    path = "/api/orders/detail/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order with lines and history", body = OrderView),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn order_detail(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || state.orders.detail_for_user(principal.user_id, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Order loaded", order))
}

async fn cancel(
    state: web::Data<AppState>,
    principal: Principal,
    order_id: Uuid,
    reason: String,
) -> Result<HttpResponse, AppError> {
    let order = web::block(move || state.orders.cancel(principal.user_id, order_id, &reason))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Order canceled", order))
}

/// POST /api/orders/cancel/{id}
///
/// Cancels one of the caller's orders while it is still PROCESSING or
/// CONFIRMED and puts its stock back.
#[utoipa::path(
    post,
    path = "/api/orders/cancel/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order canceled", body = OrderView),
        (status = 400, description = "Missing reason, or the order can no longer be canceled"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<CancelOrderRequest>,
) -> Result<HttpResponse, AppError> {
    cancel(state, principal, path.into_inner(), body.into_inner().reason_cancel).await
}

/// GET /api/orders/cancel/{id}?reason_cancel=
///
/// Older storefront builds cancel with a GET and a query parameter.
#[utoipa::path(
    get,
    path = "/api/orders/cancel/{id}",
    params(("id" = Uuid, Path, description = "Order UUID"), CancelOrderRequest),
    responses(
        (status = 200, description = "Order canceled", body = OrderView),
        (status = 400, description = "Missing reason, or the order can no longer be canceled"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn cancel_order_compat(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
    query: web::Query<CancelOrderRequest>,
) -> Result<HttpResponse, AppError> {
    cancel(state, principal, path.into_inner(), query.into_inner().reason_cancel).await
}
