//! [`Numeric`] column bounds.

use rust_decimal::Decimal;

/// Bounds of a SQL `NUMERIC(precision, scale)` column.
///
/// Values outside them are either rejected by the database or silently
/// rounded, so they are checked before being stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Numeric {
    /// Total number of significant digits.
    pub precision: u32,

    /// Number of digits after the decimal point.
    pub scale: u32,
}

impl Numeric {
    /// Creates new [`Numeric`] bounds.
    #[must_use]
    pub const fn new(precision: u32, scale: u32) -> Self {
        Self { precision, scale }
    }

    /// Checks whether the `value` is stored by a column of these [`Numeric`]
    /// bounds exactly as it is.
    #[must_use]
    pub fn fits(self, value: Decimal) -> bool {
        if value.normalize().scale() > self.scale {
            return false;
        }

        let integer_digits = self.precision.saturating_sub(self.scale);
        10_i128
            .checked_pow(integer_digits)
            .and_then(|bound| Decimal::try_from_i128_with_scale(bound, 0).ok())
            .map_or(true, |bound| value.abs().trunc() < bound)
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::Numeric;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn limits_integer_digits() {
        let price = Numeric::new(12, 2);

        assert!(price.fits(dec("9999999999.99")));
        assert!(price.fits(dec("-9999999999")));
        assert!(!price.fits(dec("10000000000")));
        assert!(!price.fits(dec("100000000000")));
    }

    #[test]
    fn limits_fraction_digits() {
        let price = Numeric::new(12, 2);

        assert!(price.fits(dec("100.99")));
        assert!(price.fits(dec("100.9900")));
        assert!(!price.fits(dec("100.999")));
    }

    #[test]
    fn allows_no_integer_digits() {
        let ratio = Numeric::new(2, 2);

        assert!(ratio.fits(dec("0.25")));
        assert!(!ratio.fits(dec("1")));
    }
}
