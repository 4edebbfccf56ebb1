use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;
use crate::domain::cart::{CartLineView, VariantSelector};
use crate::errors::AppError;
use crate::handlers::response;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    /// Attribute/property picks; omitted means the product's first variant.
    #[serde(default)]
    pub variant: Option<VariantSelector>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartLineRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearCartResponse {
    pub removed: usize,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/cart
#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with live price and stock", body = [CartLineView]),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "cart"
)]
pub async fn list_cart(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let lines = web::block(move || state.carts.list(principal.user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Cart loaded", lines))
}

/// POST /api/cart
///
/// Adds units of a product variant. Adding a variant already in the cart
/// sums the quantities; the total may not exceed available stock.
#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Resulting cart line", body = CartLineView),
        (status = 400, description = "Invalid quantity or insufficient stock"),
        (status = 404, description = "Product or variant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "cart"
)]
pub async fn add_to_cart(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let line = web::block(move || {
        state
            .carts
            .add(principal.user_id, body.product_id, body.variant, body.quantity)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Added to cart", line))
}

/// PUT /api/cart/{line_id}
#[utoipa::path(
    put,
    path = "/api/cart/{line_id}",
    params(("line_id" = Uuid, Path, description = "Cart line UUID")),
    request_body = UpdateCartLineRequest,
    responses(
        (status = 200, description = "Updated cart line", body = CartLineView),
        (status = 400, description = "Invalid quantity or insufficient stock"),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "cart"
)]
pub async fn update_cart_line(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCartLineRequest>,
) -> Result<HttpResponse, AppError> {
    let line_id = path.into_inner();
    let quantity = body.quantity;

    let line = web::block(move || state.carts.set_quantity(principal.user_id, line_id, quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Cart updated", line))
}

/// DELETE /api/cart/{line_id}
///
/// Idempotent: removing a line that is already gone succeeds.
#[utoipa::path(
    delete,
    path = "/api/cart/{line_id}",
    params(("line_id" = Uuid, Path, description = "Cart line UUID")),
    responses((status = 200, description = "Line removed")),
    security(("bearer_auth" = [])),
    tag = "cart"
)]
pub async fn remove_cart_line(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let line_id = path.into_inner();

    web::block(move || state.carts.remove(principal.user_id, line_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Removed from cart", serde_json::Value::Null))
}

/// DELETE /api/cart
#[utoipa::path(
    delete,
    path = "/api/cart",
    responses((status = 200, description = "Cart emptied", body = ClearCartResponse)),
    security(("bearer_auth" = [])),
    tag = "cart"
)]
pub async fn clear_cart(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let removed = web::block(move || state.carts.clear(principal.user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(response::ok("Cart cleared", ClearCartResponse { removed }))
}
