//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

use crate::define_kind;

/// Number of decimal places [`Money`] is settled with.
pub const SCALE: u32 = 2;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns this [`Money`] rounded to [`SCALE`] decimal places.
    #[must_use]
    pub fn round(self) -> Self {
        Self {
            amount: round(self.amount),
            currency: self.currency,
        }
    }

    /// Adds the provided [`Money`] to this one.
    ///
    /// [`None`] is returned if the currencies differ or the sum overflows.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then_some(())?;
        Some(Self {
            amount: self.amount.checked_add(rhs.amount)?,
            currency: self.currency,
        })
    }

    /// Subtracts the provided [`Money`] from this one.
    ///
    /// [`None`] is returned if the currencies differ or the difference
    /// overflows.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then_some(())?;
        Some(Self {
            amount: self.amount.checked_sub(rhs.amount)?,
            currency: self.currency,
        })
    }

    /// Returns a human-readable representation of this [`Money`], like
    /// `R 1200.00`.
    #[must_use]
    pub fn pretty(&self) -> Pretty<'_> {
        Pretty(self)
    }
}

/// Rounds the provided `amount` to [`SCALE`] decimal places, with midpoints
/// rounded away from zero, and fixes its scale.
#[must_use]
pub fn round(amount: Decimal) -> Decimal {
    let mut rounded = amount
        .round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SCALE);
    rounded
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        match amount.is_integer().then(|| amount.to_i128()).flatten() {
            Some(int) => write!(f, "{int}{currency}"),
            None => write!(f, "{}{currency}", amount.normalize()),
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

/// Human-readable [`Display`] of a [`Money`] amount.
///
/// [`Display`]: fmt::Display
#[derive(Clone, Copy, Debug)]
pub struct Pretty<'m>(&'m Money);

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Money { amount, currency } = self.0;
        write!(f, "{} {}", currency.symbol(), round(*amount))
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    #[serialize_all = "SCREAMING_SNAKE_CASE"]
    enum Currency {
        #[doc = "South African Rand."]
        Zar = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Euro."]
        Eur = 3,
    }
}

impl Currency {
    /// Returns the symbol this [`Currency`] is written with.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Zar => "R",
            Self::Usd => "$",
            Self::Eur => "€",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Zar
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer;
    /// - `currency` is a three-letter currency code (`ZAR`, `USD`, `EUR`).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{round, Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn zar(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Zar,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("840.50ZAR").unwrap(), zar("840.50"));
        assert_eq!(
            Money::from_str("123.45EUR").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Eur,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Za").is_err());
        assert!(Money::from_str("123.45Zarand").is_err());
        assert!(Money::from_str("1RUB").is_err());

        assert!(Money::from_str("123.00ZAR").is_ok());
        assert!(Money::from_str("123ZAR").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(zar("940.80").to_string(), "940.8ZAR");
        assert_eq!(zar("123.00").to_string(), "123ZAR");
        assert_eq!(zar("123").to_string(), "123ZAR");
        assert_eq!(
            Money {
                amount: decimal("0.5"),
                currency: Currency::Usd,
            }
            .to_string(),
            "0.5USD",
        );
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(round(decimal("0.125")).to_string(), "0.13");
        assert_eq!(round(decimal("-0.125")).to_string(), "-0.13");
        assert_eq!(round(decimal("100")).to_string(), "100.00");
        assert_eq!(round(decimal("274.4")).to_string(), "274.40");
    }

    #[test]
    fn pretty() {
        assert_eq!(zar("840").pretty().to_string(), "R 840.00");
        assert_eq!(zar("431.2").pretty().to_string(), "R 431.20");
    }

    #[test]
    fn refuses_mixed_currency_arithmetic() {
        let usd = Money {
            amount: decimal("1"),
            currency: Currency::Usd,
        };

        assert_eq!(zar("1").checked_add(zar("2.5")), Some(zar("3.5")));
        assert_eq!(zar("1").checked_sub(zar("2.5")), Some(zar("-1.5")));
        assert_eq!(zar("1").checked_add(usd), None);
        assert_eq!(zar("1").checked_sub(usd), None);
    }
}
