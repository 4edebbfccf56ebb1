use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::cart::{CartLineView, VariantChoice, VariantSelector};
use crate::domain::coupon::CouponQuote;
use crate::domain::order::{
    CheckoutRequest, HistoryEntry, OrderLineView, OrderStatus, OrderView, PaymentMethod, ShippingInfo,
};
use crate::domain::payment::PaymentRedirect;
use crate::handlers;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// Every response body is wrapped as `{type, status, message, data}`; the
/// schemas below describe `data`.
#[derive(OpenApi)]
#[openapi(
    info(title = "Storefront order service"),
    paths(
        handlers::cart::list_cart,
        handlers::cart::add_to_cart,
        handlers::cart::update_cart_line,
        handlers::cart::remove_cart_line,
        handlers::cart::clear_cart,
        handlers::coupons::apply_coupon,
        handlers::checkout::checkout,
        handlers::checkout::checkout_vnpay,
        handlers::checkout::return_checkout_vnpay,
        handlers::orders::list_orders,
        handlers::orders::order_detail,
        handlers::orders::cancel_order,
        handlers::orders::cancel_order_compat,
        handlers::admin_orders::update_status,
        handlers::admin_orders::list_orders,
        handlers::admin_orders::order_detail,
    ),
    components(schemas(
        CartLineView,
        VariantChoice,
        VariantSelector,
        CouponQuote,
        CheckoutRequest,
        ShippingInfo,
        PaymentMethod,
        OrderStatus,
        OrderView,
        OrderLineView,
        HistoryEntry,
        PaymentRedirect,
        handlers::cart::AddToCartRequest,
        handlers::cart::UpdateCartLineRequest,
        handlers::cart::ClearCartResponse,
        handlers::coupons::ApplyCouponRequest,
        handlers::orders::CancelOrderRequest,
        handlers::admin_orders::OrderPage,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "cart", description = "Shopping cart"),
        (name = "coupons", description = "Coupon preview"),
        (name = "checkout", description = "Order placement and VNPay payments"),
        (name = "orders", description = "Customer order history and cancellation"),
        (name = "admin", description = "Order fulfilment for administrators"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/cart",
            "/api/cart/{line_id}",
            "/api/coupons/apply",
            "/api/checkout",
            "/api/checkout_vnpay",
            "/api/return_checkout_vnpay",
            "/api/orders/list",
            "/api/orders/detail/{id}",
            "/api/orders/cancel/{id}",
            "/api/admin/orders/update/{id}",
            "/api/admin/orders/list",
            "/api/admin/orders/detail/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
