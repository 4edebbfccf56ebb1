use bigdecimal::{BigDecimal, RoundingMode, Zero};
use serde::Serialize;
use utoipa::ToSchema;

/// Money amounts are kept at two decimal places.
pub const MONEY_SCALE: i64 = 2;

pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
}

/// Price a buyer pays for one unit.
///
/// The variant's sale price, else the product's sale price, else the list
/// price (the variant's when the line targets one, the product's otherwise).
pub fn effective_unit_price(
    product_price: &BigDecimal,
    product_sale_price: Option<&BigDecimal>,
    variant_prices: Option<(&BigDecimal, Option<&BigDecimal>)>,
) -> BigDecimal {
    let (list_price, variant_sale) = match variant_prices {
        Some((price, sale)) => (price, sale),
        None => (product_price, None),
    };
    variant_sale
        .or(product_sale_price)
        .unwrap_or(list_price)
        .clone()
}

pub fn line_total(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    round_money(&(unit_price * BigDecimal::from(quantity)))
}

pub fn subtotal<'a, I>(lines: I) -> BigDecimal
where
    I: IntoIterator<Item = (&'a BigDecimal, i32)>,
{
    lines
        .into_iter()
        .fold(BigDecimal::zero(), |acc, (unit, qty)| acc + line_total(unit, qty))
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Totals {
    #[schema(value_type = String)]
    pub products_price: BigDecimal,
    #[schema(value_type = String)]
    pub shipping_price: BigDecimal,
    #[schema(value_type = String)]
    pub discount_price: BigDecimal,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
}

impl Totals {
    /// `total = max(0, products + shipping - discount)`.
    pub fn compute(
        products_price: BigDecimal,
        shipping_price: BigDecimal,
        discount_price: BigDecimal,
    ) -> Self {
        let raw = &products_price + &shipping_price - &discount_price;
        let total_price = if raw < BigDecimal::zero() {
            BigDecimal::zero()
        } else {
            round_money(&raw)
        };
        Self {
            products_price: round_money(&products_price),
            shipping_price: round_money(&shipping_price),
            discount_price: round_money(&discount_price),
            total_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn variant_sale_price_wins() {
        let price = effective_unit_price(
            &dec("100"),
            Some(&dec("80")),
            Some((&dec("120"), Some(&dec("90")))),
        );
        assert_eq!(price, dec("90"));
    }

    #[test]
    fn variant_without_sale_falls_back_to_product_sale_price() {
        let price = effective_unit_price(&dec("100"), Some(&dec("80")), Some((&dec("120"), None)));
        assert_eq!(price, dec("80"));
    }

    #[test]
    fn variant_list_price_applies_when_nothing_is_on_sale() {
        let price = effective_unit_price(&dec("100"), None, Some((&dec("120"), None)));
        assert_eq!(price, dec("120"));
    }

    #[test]
    fn product_sale_price_applies_without_variant() {
        assert_eq!(effective_unit_price(&dec("100"), Some(&dec("80")), None), dec("80"));
        assert_eq!(effective_unit_price(&dec("100"), None, None), dec("100"));
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let a = dec("150000");
        let b = dec("100000");
        let total = subtotal([(&a, 2), (&b, 2)]);
        assert_eq!(total, dec("500000"));
    }

    #[test]
    fn total_subtracts_discount_and_adds_shipping() {
        let totals = Totals::compute(dec("500000"), dec("0"), dec("40000"));
        assert_eq!(totals.total_price, dec("460000"));

        let totals = Totals::compute(dec("100"), dec("30"), dec("10"));
        assert_eq!(totals.total_price, dec("120"));
    }

    #[test]
    fn total_is_floored_at_zero() {
        let totals = Totals::compute(dec("10"), dec("0"), dec("25"));
        assert_eq!(totals.total_price, BigDecimal::zero());
    }
}
