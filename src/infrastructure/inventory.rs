use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::domain::errors::DomainError;
use crate::domain::inventory::StockSlot;
use crate::schema::{product_variants, products};

pub(crate) fn available(conn: &mut PgConnection, slot: StockSlot) -> Result<i32, DomainError> {
    let quantity = match slot {
        StockSlot::Variant(id) => product_variants::table
            .filter(product_variants::id.eq(id))
            .select(product_variants::quantity)
            .first::<i32>(conn)
            .optional()?,
        StockSlot::Product(id) => products::table
            .filter(products::id.eq(id))
            .select(products::quantity)
            .first::<i32>(conn)
            .optional()?,
    };
    Ok(quantity.unwrap_or(0))
}

/// Atomically removes `quantity` units from the slot.
///
/// The `quantity >= n` guard and the decrement are one statement; a concurrent
/// UPDATE re-checks the guard once the other transaction commits.
pub(crate) fn take(conn: &mut PgConnection, slot: StockSlot, quantity: i32) -> Result<(), DomainError> {
    let updated = match slot {
        StockSlot::Variant(id) => diesel::update(
            product_variants::table
                .filter(product_variants::id.eq(id))
                .filter(product_variants::quantity.ge(quantity)),
        )
        .set(product_variants::quantity.eq(product_variants::quantity - quantity))
        .execute(conn)?,
        StockSlot::Product(id) => diesel::update(
            products::table
                .filter(products::id.eq(id))
                .filter(products::quantity.ge(quantity)),
        )
        .set(products::quantity.eq(products::quantity - quantity))
        .execute(conn)?,
    };

    if updated == 0 {
        let available = available(conn, slot)?;
        log::warn!(
            "Stock reservation failed for {:?}: requested {}, available {}",
            slot,
            quantity,
            available
        );
        return Err(DomainError::InsufficientStock {
            item: slot.id(),
            requested: quantity,
            available,
        });
    }
    Ok(())
}

/// Puts `quantity` units back into the slot.
pub(crate) fn restore(conn: &mut PgConnection, slot: StockSlot, quantity: i32) -> Result<(), DomainError> {
    let updated = match slot {
        StockSlot::Variant(id) => diesel::update(product_variants::table.filter(product_variants::id.eq(id)))
            .set(product_variants::quantity.eq(product_variants::quantity + quantity))
            .execute(conn)?,
        StockSlot::Product(id) => diesel::update(products::table.filter(products::id.eq(id)))
            .set(products::quantity.eq(products::quantity + quantity))
            .execute(conn)?,
    };

    if updated == 0 {
        log::warn!("Stock slot {:?} no longer exists; {} units not restored", slot, quantity);
    }
    Ok(())
}
