use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{
    cart_lines, coupons, order_history, order_lines, orders, payment_attempts, product_variants,
    products, revenues, saved_coupons,
};

// ── Catalog (owned by the catalog service, read here) ────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub quantity: i32,
    pub status: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub quantity: i32,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = product_variants)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub attribute_values: Value,
    pub price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub quantity: i32,
    pub position: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_variants)]
pub struct NewVariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub attribute_values: Value,
    pub price: BigDecimal,
    pub sale_price: Option<BigDecimal>,
    pub quantity: i32,
    pub position: i32,
}

// ── Cart ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = cart_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartLineRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub variant_selector: String,
    pub quantity: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_lines)]
pub struct NewCartLineRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub variant_selector: String,
    pub quantity: i32,
}

// ── Coupons ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CouponRow {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: i32,
    pub max_discount_amount: BigDecimal,
    pub min_order_total: BigDecimal,
    pub max_redemptions_per_user: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = coupons)]
pub struct NewCouponRow {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: i32,
    pub max_discount_amount: BigDecimal,
    pub min_order_total: BigDecimal,
    pub max_redemptions_per_user: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = saved_coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SavedCouponRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub coupon_id: Uuid,
    pub status: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = saved_coupons)]
pub struct NewSavedCouponRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub coupon_id: Uuid,
    pub status: String,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub products_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub discount_price: BigDecimal,
    pub total_price: BigDecimal,
    pub notes: Option<String>,
    pub payment_method: String,
    pub coupon_id: Option<Uuid>,
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub products_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub discount_price: BigDecimal,
    pub total_price: BigDecimal,
    pub notes: Option<String>,
    pub payment_method: String,
    pub coupon_id: Option<Uuid>,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub variant_selector: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub position: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub variant_selector: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub position: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_history)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderHistoryRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: String,
    pub note: Option<String>,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_history)]
pub struct NewOrderHistoryRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: String,
    pub note: Option<String>,
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = revenues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RevenueRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub day: i32,
    pub month: i32,
    pub year: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = revenues)]
pub struct NewRevenueRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub day: i32,
    pub month: i32,
    pub year: i32,
}

// ── Payments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payment_attempts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentAttemptRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub request: Value,
    pub amount: BigDecimal,
    pub status: String,
    pub order_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payment_attempts)]
pub struct NewPaymentAttemptRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub request: Value,
    pub amount: BigDecimal,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}
