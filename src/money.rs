//! Money helpers. Sums stay in `Decimal`; rounding happens only when a value
//! leaves the engine (JSON or export cells).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serializer;

/// Decimal places shown to callers.
pub const DISPLAY_DP: u32 = 2;

/// `total / count`, zero when `count` is zero.
pub fn average(total: Decimal, count: u64) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total / Decimal::from(count)
}

pub fn round_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Render with exactly two decimals, e.g. `"12.50"`.
pub fn format_display(value: Decimal) -> String {
    format!("{:.2}", round_display(value))
}

/// `serialize_with` helper: 2-dp rounded JSON number.
pub fn serialize_rounded<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_display(*value).to_f64().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(Decimal::new(1000, 2), 0), Decimal::ZERO);
    }

    #[test]
    fn average_keeps_precision_until_display() {
        let avg = average(Decimal::new(1000, 2), 3);
        assert!(avg > Decimal::new(333, 2));
        assert_eq!(round_display(avg), Decimal::new(333, 2));
        assert_eq!(format_display(avg), "3.33");
        assert_eq!(format_display(Decimal::new(125, 1)), "12.50");
        assert_eq!(format_display(Decimal::new(2125, 3)), "2.13");
    }

    #[test]
    fn many_small_additions_do_not_drift() {
        let total: Decimal = std::iter::repeat(Decimal::new(1, 1)).take(1000).sum();
        assert_eq!(total, Decimal::new(100, 0));
    }
}
