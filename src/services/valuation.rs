//! Weighted-average cost rules.
//!
//! The average is a function of inbound movements only:
//!
//! ```text
//! A_new = (Q_old * A_old + q * c) / (Q_old + q)
//! ```
//!
//! where `Q_old` is the cumulative inbound quantity of the inventory record
//! (the sum of its lots' initial quantities) before the stock-in. Stock-outs
//! never reach this module.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::ServiceError;

/// Decimal places kept for unit costs (`DECIMAL(12,4)`).
pub const COST_SCALE: u32 = 4;

pub fn round_cost(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rejects a stock-in whose quantity or unit cost is out of range.
pub fn validate_inbound(quantity: Decimal, unit_cost: Decimal) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::InvalidMovementQuantity(format!(
            "quantity must be greater than zero, got {}",
            quantity
        )));
    }
    if unit_cost < Decimal::ZERO {
        return Err(ServiceError::InvalidCost(format!(
            "unit cost must not be negative, got {}",
            unit_cost
        )));
    }
    Ok(())
}

/// New weighted-average unit cost after receiving `quantity` at `unit_cost`.
pub fn recalculate_average(
    prior_inbound_quantity: Decimal,
    current_average: Decimal,
    quantity: Decimal,
    unit_cost: Decimal,
) -> Result<Decimal, ServiceError> {
    validate_inbound(quantity, unit_cost)?;

    let denominator = prior_inbound_quantity + quantity;
    if denominator.is_zero() {
        return Ok(current_average);
    }

    let out_of_range = || {
        ServiceError::InvalidMovementQuantity(
            "quantity and cost exceed the supported range".to_string(),
        )
    };
    let prior_value = prior_inbound_quantity
        .checked_mul(current_average)
        .ok_or_else(out_of_range)?;
    let incoming_value = quantity.checked_mul(unit_cost).ok_or_else(out_of_range)?;
    let total_value = prior_value
        .checked_add(incoming_value)
        .ok_or_else(out_of_range)?;
    let average = total_value
        .checked_div(denominator)
        .ok_or_else(out_of_range)?;

    Ok(round_cost(average))
}

/// Stock value at the record's current average.
pub fn stock_value(on_hand: Decimal, average_cost: Decimal) -> Decimal {
    round_cost(on_hand * average_cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn blends_prior_stock_with_new_receipt() {
        let avg = recalculate_average(dec!(100), dec!(10.00), dec!(50), dec!(13.00)).unwrap();
        assert_eq!(avg, dec!(11.00));
    }

    #[test]
    fn first_receipt_takes_its_own_cost() {
        let avg = recalculate_average(dec!(0), dec!(0), dec!(25), dec!(4.2)).unwrap();
        assert_eq!(avg, dec!(4.2));
    }

    #[rstest]
    #[case(dec!(10), dec!(1), dec!(20), dec!(2), dec!(1.6667))]
    #[case(dec!(3), dec!(0.3333), dec!(3), dec!(0.3334), dec!(0.3334))]
    #[case(dec!(1), dec!(0), dec!(1), dec!(0.00015), dec!(0.0001))]
    #[case(dec!(1), dec!(0), dec!(1), dec!(0.00005), dec!(0))]
    fn rounds_to_four_places_away_from_zero(
        #[case] q_old: Decimal,
        #[case] a_old: Decimal,
        #[case] q: Decimal,
        #[case] c: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(recalculate_average(q_old, a_old, q, c).unwrap(), expected);
    }

    #[test]
    fn zero_cost_receipt_lowers_average() {
        let avg = recalculate_average(dec!(10), dec!(8), dec!(10), dec!(0)).unwrap();
        assert_eq!(avg, dec!(4));
    }

    #[test]
    fn receiving_at_current_average_keeps_it() {
        let avg = recalculate_average(dec!(40), dec!(7.1234), dec!(5), dec!(7.1234)).unwrap();
        assert_eq!(avg, dec!(7.1234));
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-5))]
    fn rejects_non_positive_quantity(#[case] q: Decimal) {
        assert_matches!(
            recalculate_average(dec!(10), dec!(1), q, dec!(1)),
            Err(ServiceError::InvalidMovementQuantity(_))
        );
    }

    #[test]
    fn rejects_negative_cost() {
        assert_matches!(
            recalculate_average(dec!(10), dec!(1), dec!(1), dec!(-0.01)),
            Err(ServiceError::InvalidCost(_))
        );
    }

    #[test]
    fn stock_value_is_rounded() {
        assert_eq!(stock_value(dec!(3), dec!(1.33335)), dec!(4.0001));
        assert_eq!(stock_value(dec!(0), dec!(12.5)), dec!(0));
    }
}
