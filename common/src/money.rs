//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::Numeric;

/// Non-negative exact amount of money.
///
/// Amounts are never represented as floating point numbers, so comparisons
/// and range filters over them are exact. Only amounts stored exactly by a
/// [`Money::COLUMN`] are representable.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// [`Numeric`] bounds of the columns storing [`Money`].
    pub const COLUMN: Numeric = Numeric::new(12, 2);

    /// Creates a new [`Money`] if the given `amount` is non-negative and fits
    /// into the [`Money::COLUMN`].
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        ((!amount.is_sign_negative() || amount.is_zero())
            && Self::COLUMN.fits(amount))
        .then(|| Self(amount.normalize()))
    }

    /// Returns the underlying [`Decimal`] amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Formats this [`Money`] rounded to whole units with `,` separating
    /// thousands, e.g. `1,250,000`.
    #[must_use]
    pub fn grouped(&self) -> String {
        let whole = self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .trunc()
            .to_string();

        let len = whole.len();
        let mut out = String::with_capacity(len + len / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = &'static str;

    /// Parses a [`Money`] amount, ignoring surrounding whitespace and `,`
    /// or `_` digit separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ',' | '_'))
            .collect::<String>();
        if cleaned.is_empty() {
            return Err("empty amount");
        }

        let amount = Decimal::from_str(&cleaned).map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("negative or out of range amount")
    }
}

impl From<Money> for Decimal {
    fn from(m: Money) -> Self {
        m.0
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    //! Module providing integration with [`postgres_types`] crate.

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };
    use rust_decimal::Decimal;

    use super::Money;

    impl<'a> FromSql<'a> for Money {
        accepts!(NUMERIC);

        fn from_sql(
            ty: &Type,
            raw: &'a [u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            Ok(Self(Decimal::from_sql(ty, raw)?))
        }
    }

    impl ToSql for Money {
        accepts!(NUMERIC);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            self.0.to_sql(ty, w)
        }
    }
}

mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    use super::Money;

    impl Serialize for Money {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Money {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            Self::from_str(&s).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Money;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(money("150000").amount(), Decimal::from(150_000));
        assert_eq!(money(" 1,250,000.50 ").amount(), "1250000.5".parse().unwrap());
        assert_eq!(money("100_000"), money("100000"));

        assert!(Money::from_str("").is_err());
        assert!(Money::from_str("abc").is_err());
        assert!(Money::from_str("-5").is_err());
        assert!(Money::from_str("12.5.1").is_err());
    }

    #[test]
    fn compares_exactly() {
        assert!(money("0.1") < money("0.11"));
        assert_eq!(money("100.00"), money("100"));
    }

    #[test]
    fn rejects_amounts_not_stored_exactly() {
        assert!(Money::from_str("9999999999.99").is_ok());
        assert!(Money::from_str("100000000000").is_err());
        assert!(Money::from_str("100.999").is_err());
    }

    #[test]
    fn grouped() {
        assert_eq!(money("0").grouped(), "0");
        assert_eq!(money("999").grouped(), "999");
        assert_eq!(money("1000").grouped(), "1,000");
        assert_eq!(money("1234567.49").grouped(), "1,234,567");
        assert_eq!(money("15000000").grouped(), "15,000,000");
    }
}
