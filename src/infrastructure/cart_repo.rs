use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{self, CartLineView, VariantSelector};
use crate::domain::errors::DomainError;
use crate::domain::inventory::{self, StockSlot};
use crate::domain::ports::CartRepository;
use crate::domain::pricing;
use crate::schema::{cart_lines, product_variants, products};

use super::models::{CartLineRow, NewCartLineRow, ProductRow, VariantRow};

const ACTIVE: &str = "ACTIVE";

/// A cart line joined with the catalog data needed to price and stock it.
#[derive(Debug, Clone)]
pub(crate) struct PricedLine {
    pub row: CartLineRow,
    pub product_name: String,
    pub selector: VariantSelector,
    pub unit_price: BigDecimal,
    pub slot: StockSlot,
    pub available: i32,
    /// False once the product is deactivated or soft-deleted.
    pub purchasable: bool,
}

impl PricedLine {
    pub fn view(&self) -> CartLineView {
        CartLineView {
            id: self.row.id,
            product_id: self.row.product_id,
            product_name: self.product_name.clone(),
            variant_id: self.row.variant_id,
            variant: self.selector.clone(),
            quantity: self.row.quantity,
            unit_price: self.unit_price.clone(),
            line_total: pricing::line_total(&self.unit_price, self.row.quantity),
            available: if self.purchasable { self.available } else { 0 },
        }
    }
}

fn is_purchasable(product: &ProductRow) -> bool {
    product.status == ACTIVE && product.deleted_at.is_none()
}

fn price_rows(conn: &mut PgConnection, rows: Vec<CartLineRow>) -> Result<Vec<PricedLine>, DomainError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
    let variant_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.variant_id).collect();

    let products: HashMap<Uuid, ProductRow> = products::table
        .filter(products::id.eq_any(product_ids))
        .select(ProductRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let variants: HashMap<Uuid, VariantRow> = product_variants::table
        .filter(product_variants::id.eq_any(variant_ids))
        .select(VariantRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    rows.into_iter()
        .map(|row| {
            let product = products
                .get(&row.product_id)
                .ok_or(DomainError::NotFound("product"))?;
            let variant = match row.variant_id {
                Some(id) => Some(variants.get(&id).ok_or(DomainError::NotFound("variant"))?),
                None => None,
            };
            let unit_price = pricing::effective_unit_price(
                &product.price,
                product.sale_price.as_ref(),
                variant.map(|v| (&v.price, v.sale_price.as_ref())),
            );
            let selector = VariantSelector::parse(&row.variant_selector)
                .map_err(|e| DomainError::Internal(e.to_string()))?;
            Ok(PricedLine {
                slot: StockSlot::for_line(row.product_id, row.variant_id),
                available: variant.map_or(product.quantity, |v| v.quantity),
                product_name: product.name.clone(),
                purchasable: is_purchasable(product),
                selector,
                unit_price,
                row,
            })
        })
        .collect()
}

/// Loads the user's cart lines, oldest first.
///
/// With `lock` the lines are held `FOR UPDATE` until the surrounding
/// transaction ends, which serializes concurrent checkouts of one cart.
pub(crate) fn load_lines(
    conn: &mut PgConnection,
    user_id: Uuid,
    lock: bool,
) -> Result<Vec<PricedLine>, DomainError> {
    let query = cart_lines::table
        .filter(cart_lines::user_id.eq(user_id))
        .order((cart_lines::created_at.asc(), cart_lines::id.asc()))
        .select(CartLineRow::as_select());
    let rows = if lock {
        query.for_update().load::<CartLineRow>(conn)?
    } else {
        query.load::<CartLineRow>(conn)?
    };
    price_rows(conn, rows)
}

/// Picks the variant a selector names, or the first variant when none is given.
fn resolve_variant<'a>(
    variants: &'a [VariantRow],
    selector: Option<VariantSelector>,
) -> Result<(Option<&'a VariantRow>, VariantSelector), DomainError> {
    let wanted = selector.filter(|s| !s.is_empty());
    let Some(first) = variants.first() else {
        return match wanted {
            Some(_) => Err(DomainError::NotFound("variant")),
            None => Ok((None, VariantSelector::default())),
        };
    };
    let Some(wanted) = wanted else {
        let selector = VariantSelector::from_json(&first.attribute_values)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        return Ok((Some(first), selector));
    };
    for variant in variants {
        let values = VariantSelector::from_json(&variant.attribute_values)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if values == wanted {
            return Ok((Some(variant), wanted));
        }
    }
    Err(DomainError::NotFound("variant"))
}

// ── Repository ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    fn list(&self, user_id: Uuid) -> Result<Vec<CartLineView>, DomainError> {
        let mut conn = self.pool.get()?;
        let lines = load_lines(&mut conn, user_id, false)?;
        Ok(lines.iter().map(PricedLine::view).collect())
    }

    fn add(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        selector: Option<VariantSelector>,
        quantity: i32,
    ) -> Result<CartLineView, DomainError> {
        cart::validate_quantity(quantity)?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let product = products::table
                .filter(products::id.eq(product_id))
                .select(ProductRow::as_select())
                .first::<ProductRow>(conn)
                .optional()?
                .filter(is_purchasable)
                .ok_or(DomainError::NotFound("product"))?;

            let variants = product_variants::table
                .filter(product_variants::product_id.eq(product.id))
                .order((product_variants::position.asc(), product_variants::created_at.asc()))
                .select(VariantRow::as_select())
                .load::<VariantRow>(conn)?;
            let (variant, selector) = resolve_variant(&variants, selector)?;
            let canonical = selector.canonical()?;

            let existing = cart_lines::table
                .filter(cart_lines::user_id.eq(user_id))
                .filter(cart_lines::product_id.eq(product.id))
                .filter(cart_lines::variant_selector.eq(&canonical))
                .select(CartLineRow::as_select())
                .for_update()
                .first::<CartLineRow>(conn)
                .optional()?;

            let merged = cart::merged_quantity(existing.as_ref().map(|l| l.quantity), quantity)?;
            let slot = StockSlot::for_line(product.id, variant.map(|v| v.id));
            let available = variant.map_or(product.quantity, |v| v.quantity);
            inventory::ensure_available(slot, merged, available)?;

            let line_id = match existing {
                Some(line) => {
                    diesel::update(cart_lines::table.find(line.id))
                        .set((
                            cart_lines::quantity.eq(merged),
                            cart_lines::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                    line.id
                }
                None => {
                    let id = Uuid::new_v4();
                    diesel::insert_into(cart_lines::table)
                        .values(&NewCartLineRow {
                            id,
                            user_id,
                            product_id: product.id,
                            variant_id: variant.map(|v| v.id),
                            variant_selector: canonical,
                            quantity: merged,
                        })
                        .execute(conn)?;
                    id
                }
            };

            let row = cart_lines::table
                .find(line_id)
                .select(CartLineRow::as_select())
                .first::<CartLineRow>(conn)?;
            price_rows(conn, vec![row])?
                .pop()
                .map(|line| line.view())
                .ok_or(DomainError::NotFound("cart line"))
        })
    }

    fn set_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<CartLineView, DomainError> {
        cart::validate_quantity(quantity)?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = cart_lines::table
                .filter(cart_lines::id.eq(line_id))
                .filter(cart_lines::user_id.eq(user_id))
                .select(CartLineRow::as_select())
                .for_update()
                .first::<CartLineRow>(conn)
                .optional()?
                .ok_or(DomainError::NotFound("cart line"))?;

            let mut line = price_rows(conn, vec![row])?
                .pop()
                .ok_or(DomainError::NotFound("cart line"))?;
            if !line.purchasable {
                return Err(DomainError::NotFound("product"));
            }
            inventory::ensure_available(line.slot, quantity, line.available)?;

            diesel::update(cart_lines::table.find(line_id))
                .set((
                    cart_lines::quantity.eq(quantity),
                    cart_lines::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            line.row.quantity = quantity;
            Ok(line.view())
        })
    }

    fn remove(&self, user_id: Uuid, line_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(
            cart_lines::table
                .filter(cart_lines::id.eq(line_id))
                .filter(cart_lines::user_id.eq(user_id)),
        )
        .execute(&mut conn)?;
        Ok(())
    }

    fn clear(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(clear_lines(&mut conn, user_id)?)
    }
}

pub(crate) fn clear_lines(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<usize> {
    diesel::delete(cart_lines::table.filter(cart_lines::user_id.eq(user_id))).execute(conn)
}
