//! Money arithmetic for products, packs, carts and orders.
//!
//! Everything here is pure: callers fetch the rows, this module only does
//! decimal math and range checks.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Discount applied to a pack when none is supplied.
pub const DEFAULT_PACK_DISCOUNT: i32 = 5;

/// Minor-unit precision of the shop currency.
const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Discount percentage must be between 0 and 100, got {0}")]
    InvalidDiscount(i32),
    #[error("Quantity must be greater than 0")]
    InvalidQuantity,
    #[error("Shipping cost cannot be negative")]
    NegativeShipping,
}

/// Anything that can be put in a cart or on an order line.
pub trait Priced {
    fn effective_unit_price(&self) -> Decimal;
}

/// Discount price wins over list price when present.
pub fn effective_product_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    discount_price.unwrap_or(price)
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn validate_discount(discount_percentage: i32) -> Result<i32, PricingError> {
    if (0..=100).contains(&discount_percentage) {
        Ok(discount_percentage)
    } else {
        Err(PricingError::InvalidDiscount(discount_percentage))
    }
}

/// `(a + b + c) * (100 - d) / 100`, rounded to cents.
pub fn compute_pack_price(
    component_prices: [Decimal; 3],
    discount_percentage: Option<i32>,
) -> Result<Decimal, PricingError> {
    let discount = validate_discount(discount_percentage.unwrap_or(DEFAULT_PACK_DISCOUNT))?;
    let sum: Decimal = component_prices.iter().copied().sum();
    let factor = Decimal::from(100 - discount) / Decimal::ONE_HUNDRED;
    Ok(round_money(sum * factor))
}

pub fn compute_line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, PricingError> {
    if quantity < 1 {
        return Err(PricingError::InvalidQuantity);
    }
    Ok(unit_price * Decimal::from(quantity))
}

/// A priced line ready for aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl PricedLine {
    pub fn new(unit_price: Decimal, quantity: i32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    pub fn total(&self) -> Result<Decimal, PricingError> {
        compute_line_total(self.unit_price, self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

/// Sums line totals and adds a non-negative shipping cost.
pub fn compute_total(
    lines: &[PricedLine],
    shipping_cost: Decimal,
) -> Result<Totals, PricingError> {
    if shipping_cost.is_sign_negative() && !shipping_cost.is_zero() {
        return Err(PricingError::NegativeShipping);
    }
    let subtotal = lines
        .iter()
        .map(PricedLine::total)
        .sum::<Result<Decimal, _>>()?;
    Ok(Totals {
        subtotal,
        shipping_cost,
        total: subtotal + shipping_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1200.00), None, dec!(1200.00))]
    #[case(dec!(1200.00), Some(dec!(999.90)), dec!(999.90))]
    #[case(dec!(50), Some(dec!(0)), dec!(0))]
    fn discount_price_overrides_list_price(
        #[case] price: Decimal,
        #[case] discount: Option<Decimal>,
        #[case] expected: Decimal,
    ) {
        assert_eq!(effective_product_price(price, discount), expected);
    }

    #[test]
    fn pack_price_uses_default_discount() {
        let price = compute_pack_price([dec!(100), dec!(200), dec!(300)], None).unwrap();
        assert_eq!(price, dec!(570.00));
    }

    #[rstest]
    #[case(0, dec!(600.00))]
    #[case(10, dec!(540.00))]
    #[case(100, dec!(0.00))]
    fn pack_price_applies_discount(#[case] discount: i32, #[case] expected: Decimal) {
        let price = compute_pack_price([dec!(100), dec!(200), dec!(300)], Some(discount)).unwrap();
        assert_eq!(price, expected);
    }

    #[test]
    fn pack_price_rounds_half_away_from_zero() {
        // 0.15 * 0.95 = 0.1425 -> 0.14 ; 10.01 * 0.95 = 9.5095 -> 9.51
        assert_eq!(
            compute_pack_price([dec!(0.05), dec!(0.05), dec!(0.05)], Some(5)).unwrap(),
            dec!(0.14)
        );
        assert_eq!(
            compute_pack_price([dec!(10.01), dec!(0), dec!(0)], Some(5)).unwrap(),
            dec!(9.51)
        );
        assert_eq!(
            compute_pack_price([dec!(0.10), dec!(0), dec!(0)], Some(75)).unwrap(),
            dec!(0.03)
        );
    }

    #[rstest]
    #[case(-1)]
    #[case(101)]
    fn pack_price_rejects_out_of_range_discount(#[case] discount: i32) {
        assert_matches!(
            compute_pack_price([dec!(1), dec!(1), dec!(1)], Some(discount)),
            Err(PricingError::InvalidDiscount(d)) if d == discount
        );
    }

    #[test]
    fn line_total_multiplies_exactly() {
        assert_eq!(compute_line_total(dec!(10.000), 3).unwrap(), dec!(30.000));
    }

    #[rstest]
    #[case(0)]
    #[case(-4)]
    fn line_total_rejects_non_positive_quantity(#[case] quantity: i32) {
        assert_matches!(
            compute_line_total(dec!(10), quantity),
            Err(PricingError::InvalidQuantity)
        );
    }

    #[test]
    fn total_adds_shipping() {
        let lines = [
            PricedLine::new(dec!(1200.50), 2),
            PricedLine::new(dec!(99.99), 1),
        ];
        let totals = compute_total(&lines, dec!(7)).unwrap();
        assert_eq!(totals.subtotal, dec!(2500.99));
        assert_eq!(totals.shipping_cost, dec!(7));
        assert_eq!(totals.total, dec!(2507.99));
    }

    #[test]
    fn total_rejects_negative_shipping_and_bad_lines() {
        assert_matches!(
            compute_total(&[], dec!(-1)),
            Err(PricingError::NegativeShipping)
        );
        assert_matches!(
            compute_total(&[PricedLine::new(dec!(5), 0)], dec!(0)),
            Err(PricingError::InvalidQuantity)
        );
    }

    #[test]
    fn empty_total_is_just_shipping() {
        let totals = compute_total(&[], dec!(10)).unwrap();
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total, dec!(10));
    }
}
