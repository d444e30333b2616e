// src/utils/precision.rs
use rust_decimal::Decimal;

/// Rounds a quantity DOWN to the nearest multiple of `step_size`.
/// Example: amount=0.0583, step=0.01 -> 0.05
pub fn normalize_quantity(amount: Decimal, step_size: Decimal) -> Decimal {
    if step_size.is_zero() {
        return amount;
    }
    (amount / step_size).floor() * step_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_truncates_not_rounds() {
        let step = Decimal::from_str("0.01").unwrap();
        assert_eq!(
            normalize_quantity(Decimal::from_str("0.0599").unwrap(), step),
            Decimal::from_str("0.05").unwrap()
        );
        assert_eq!(
            normalize_quantity(Decimal::from_str("10.999").unwrap(), Decimal::ONE),
            Decimal::from(10)
        );
    }

    #[test]
    fn test_zero_step_is_passthrough() {
        let amount = Decimal::from_str("1.2345").unwrap();
        assert_eq!(normalize_quantity(amount, Decimal::ZERO), amount);
    }
}
