use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::Admin;
use crate::domain::order::OrderView;
use crate::errors::AppError;
use crate::handlers::{parse_status, response};
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpdateStatusParams {
    /// Target status: the next step, `CANCELED` or `DELETED`.
    pub status: String,
    /// Stored in the order history (and as the reason when canceling).
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminListParams {
    pub status: Option<String>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPage {
    pub items: Vec<OrderView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// PUT /api/admin/orders/update/{id}
///
/// Moves an order to an explicit target status. Only the next step of
/// PROCESSING → CONFIRMED → SHIPPING → DELIVERED → COMPLETED, CANCELED (before
/// shipping) and DELETED (after CANCELED/COMPLETED) are accepted.
#[utoipa::path(
    put,
    path = "/api/admin/orders/update/{id}",
    params(("id" = Uuid, Path, description = "Order UUID"), UpdateStatusParams),
    responses(
        (status = 200, description = "Order after the transition", body = OrderView),
        (status = 400, description = "Unknown status or transition not allowed"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    admin: Admin,
    path: web::Path<Uuid>,
    query: web::Query<UpdateStatusParams>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let UpdateStatusParams { status, note } = query.into_inner();
    let target = parse_status(Some(status.as_str()))?
        .ok_or_else(|| AppError::BadRequest("status is required".to_string()))?;

    let order = web::block(move || state.orders.advance(order_id, target, admin.0.user_id, note))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Order status updated", order))
}

/// GET /api/admin/orders/list
#[utoipa::path(
    get,
    path = "/api/admin/orders/list",
    params(AdminListParams),
    responses(
        (status = 200, description = "Paginated list of orders, deleted ones included", body = OrderPage),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    _admin: Admin,
    query: web::Query<AdminListParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let status = parse_status(params.status.as_deref())?;
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || state.orders.list(status, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok(
        "Orders loaded",
        OrderPage {
            items: result.items,
            total: result.total,
            page,
            limit,
        },
    ))
}

/// GET /api/admin/orders/detail/{id}
#[utoipa::path(
    get,
    path = "/api/admin/orders/detail/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order with lines and history", body = OrderView),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn order_detail(
    state: web::Data<AppState>,
    _admin: Admin,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || state.orders.get(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Order loaded", order))
}
