//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Decimal percentage in the `[0, 100]` range.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Percent(Decimal);

impl Percent {
    /// Zero [`Percent`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Whole `100` [`Percent`].
    pub const HUNDRED: Self = Self(Decimal::ONE_HUNDRED);

    /// Creates a whole [`Percent`] in a `const` context.
    ///
    /// # Panics
    ///
    /// If the provided `val` is greater than `100`.
    #[must_use]
    pub const fn whole(val: u8) -> Self {
        assert!(val <= 100, "`Percent` cannot exceed 100");

        #[expect(clippy::cast_lossless, reason = "`From` is not `const`")]
        let lo = val as u32;
        Self(Decimal::from_parts(lo, 0, 0, false, 0))
    }

    /// Creates a new [`Percent`] if the provided value lies in the `[0, 100]`
    /// range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&val)
            .then_some(Self(val))
    }

    /// Returns the raw value of this [`Percent`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns the exact share of the provided `amount` this [`Percent`]
    /// represents.
    #[must_use]
    pub fn of(self, amount: Decimal) -> Decimal {
        amount * self.0 / Decimal::ONE_HUNDRED
    }

    /// Returns the [`Percent`] complementing this one to `100`.
    #[must_use]
    pub fn complement(self) -> Self {
        Self(Decimal::ONE_HUNDRED - self.0)
    }
}

impl Default for Percent {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Decimal percentage in the `[0, 100]` range.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(m: &Percent) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Percent` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Percent;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn bounds() {
        assert!(Percent::new(decimal("-0.01")).is_none());
        assert!(Percent::new(decimal("100.01")).is_none());
        assert_eq!(Percent::new(Decimal::ZERO), Some(Percent::ZERO));
        assert_eq!(Percent::new(decimal("100")), Some(Percent::HUNDRED));

        assert!(Percent::from_str("12.5").is_ok());
        assert!(Percent::from_str("101").is_err());
        assert!(Percent::from_str("ten").is_err());
    }

    #[test]
    fn whole() {
        assert_eq!(Percent::whole(48).value(), decimal("48"));
        assert_eq!(Percent::whole(30).complement(), Percent::whole(70));
    }

    #[test]
    fn share_is_exact() {
        assert_eq!(Percent::whole(30).of(decimal("2800")), decimal("840"));
        assert_eq!(Percent::whole(48).of(decimal("1960")), decimal("940.8"));
        assert_eq!(
            Percent::from_str("12.5").unwrap().of(decimal("0.01")),
            decimal("0.00125"),
        );
    }
}
