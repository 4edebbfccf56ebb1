use uuid::Uuid;

use super::errors::DomainError;

/// The stock counter a cart or order line draws from.
///
/// Products that define variants keep stock per variant; products without
/// variants keep a single counter on the product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockSlot {
    Variant(Uuid),
    Product(Uuid),
}

impl StockSlot {
    pub fn for_line(product_id: Uuid, variant_id: Option<Uuid>) -> Self {
        match variant_id {
            Some(id) => StockSlot::Variant(id),
            None => StockSlot::Product(product_id),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            StockSlot::Variant(id) | StockSlot::Product(id) => *id,
        }
    }
}

/// Sorts stock changes by slot id. Every transaction touching several stock
/// rows locks them in this order.
pub fn sort_for_locking<T>(items: &mut [T], slot: impl Fn(&T) -> StockSlot) {
    items.sort_by_key(|item| slot(item).id());
}

pub fn ensure_available(slot: StockSlot, requested: i32, available: i32) -> Result<(), DomainError> {
    if requested > available {
        return Err(DomainError::InsufficientStock {
            item: slot.id(),
            requested,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_without_variant_draws_from_product() {
        let product = Uuid::new_v4();
        assert_eq!(StockSlot::for_line(product, None), StockSlot::Product(product));

        let variant = Uuid::new_v4();
        assert_eq!(
            StockSlot::for_line(product, Some(variant)),
            StockSlot::Variant(variant)
        );
    }

    #[test]
    fn exact_stock_is_enough() {
        let slot = StockSlot::Variant(Uuid::new_v4());
        assert!(ensure_available(slot, 3, 3).is_ok());
    }

    #[test]
    fn over_request_reports_counts() {
        let slot = StockSlot::Product(Uuid::new_v4());
        match ensure_available(slot, 4, 3) {
            Err(DomainError::InsufficientStock {
                item,
                requested,
                available,
            }) => {
                assert_eq!(item, slot.id());
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn locking_order_ignores_line_order() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);
        let mut first = vec![(c, None), (a, Some(b))];
        let mut second = vec![(a, Some(b)), (c, None)];
        sort_for_locking(&mut first, |(p, v)| StockSlot::for_line(*p, *v));
        sort_for_locking(&mut second, |(p, v)| StockSlot::for_line(*p, *v));
        assert_eq!(first, second);
        assert_eq!(first[0], (a, Some(b)));
    }
}
