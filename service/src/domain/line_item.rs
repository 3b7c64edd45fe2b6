//! [`LineItem`] definitions.

use std::str::FromStr;

use common::Money;
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

use super::InvalidArgument;

/// Single row of a quotation or an invoice.
///
/// Its `amount` always equals `quantity * unit_price` exactly: it's computed
/// on construction and recomputed on every quantity or unit price change.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineItem {
    /// [`Description`] of this [`LineItem`].
    description: Description,

    /// Quantity of this [`LineItem`].
    quantity: Decimal,

    /// Price of a single unit of this [`LineItem`].
    unit_price: Money,

    /// Amount of this [`LineItem`].
    amount: Money,
}

impl LineItem {
    /// Creates a new [`LineItem`] out of the provided parameters.
    ///
    /// # Errors
    ///
    /// - [`InvalidArgument::NonPositiveQuantity`] if the `quantity` is not
    ///   greater than zero.
    /// - [`InvalidArgument::NegativeUnitPrice`] if the `unit_price` is
    ///   negative.
    /// - [`InvalidArgument::AmountOutOfRange`] if the amount overflows.
    pub fn new(
        description: Description,
        quantity: Decimal,
        unit_price: Money,
    ) -> Result<Self, InvalidArgument> {
        Ok(Self {
            description,
            quantity,
            unit_price,
            amount: amount(quantity, unit_price)?,
        })
    }

    /// Creates a new [`LineItem`] of a single unit.
    ///
    /// `price` must not be negative.
    pub(crate) fn single(description: Description, price: Money) -> Self {
        Self {
            description,
            quantity: Decimal::ONE,
            unit_price: price,
            amount: price,
        }
    }

    /// Returns [`Description`] of this [`LineItem`].
    #[must_use]
    pub fn description(&self) -> &Description {
        &self.description
    }

    /// Returns quantity of this [`LineItem`].
    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Returns unit price of this [`LineItem`].
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns amount of this [`LineItem`].
    #[must_use]
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Replaces [`Description`] of this [`LineItem`].
    pub fn set_description(&mut self, description: Description) {
        self.description = description;
    }

    /// Changes quantity of this [`LineItem`], recomputing its amount.
    ///
    /// # Errors
    ///
    /// See [`LineItem::new()`]. This [`LineItem`] is left untouched on error.
    pub fn set_quantity(
        &mut self,
        quantity: Decimal,
    ) -> Result<(), InvalidArgument> {
        self.amount = amount(quantity, self.unit_price)?;
        self.quantity = quantity;
        Ok(())
    }

    /// Changes unit price of this [`LineItem`], recomputing its amount.
    ///
    /// # Errors
    ///
    /// See [`LineItem::new()`]. This [`LineItem`] is left untouched on error.
    pub fn set_unit_price(
        &mut self,
        unit_price: Money,
    ) -> Result<(), InvalidArgument> {
        self.amount = amount(self.quantity, unit_price)?;
        self.unit_price = unit_price;
        Ok(())
    }
}

/// Computes the amount of a [`LineItem`], checking its parts.
fn amount(quantity: Decimal, unit_price: Money) -> Result<Money, InvalidArgument> {
    use InvalidArgument as E;

    if quantity <= Decimal::ZERO {
        return Err(E::NonPositiveQuantity);
    }
    if unit_price.amount.is_sign_negative() && !unit_price.amount.is_zero() {
        return Err(E::NegativeUnitPrice);
    }

    Ok(Money {
        amount: quantity
            .checked_mul(unit_price.amount)
            .ok_or(E::AmountOutOfRange)?,
        currency: unit_price.currency,
    })
}

/// Description of a [`LineItem`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `description` matches the
    /// format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(description: impl Into<String>) -> Self {
        Self(description.into())
    }

    /// Creates a new [`Description`] if the given `description` is valid.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Option<Self> {
        let description = description.into();
        Self::check(&description).then_some(Self(description))
    }

    /// Checks whether the given `description` is a valid [`Description`].
    fn check(description: impl AsRef<str>) -> bool {
        let description = description.as_ref();
        description.trim() == description
            && !description.is_empty()
            && description.chars().count() <= 1000
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use crate::domain::InvalidArgument;

    use super::{Description, LineItem};

    fn zar(amount: Decimal) -> Money {
        Money {
            amount,
            currency: Currency::Zar,
        }
    }

    fn description() -> Description {
        Description::new("Logo design").unwrap()
    }

    #[test]
    fn rejects_invalid_parts() {
        assert_eq!(
            LineItem::new(description(), Decimal::ZERO, zar(Decimal::ONE)),
            Err(InvalidArgument::NonPositiveQuantity),
        );
        assert_eq!(
            LineItem::new(description(), Decimal::ONE, zar(Decimal::NEGATIVE_ONE)),
            Err(InvalidArgument::NegativeUnitPrice),
        );
        assert_eq!(
            LineItem::new(description(), Decimal::MAX, zar(Decimal::TWO)),
            Err(InvalidArgument::AmountOutOfRange),
        );
        assert!(LineItem::new(description(), Decimal::ONE, zar(Decimal::ZERO))
            .is_ok());
    }

    #[test]
    fn failed_mutation_leaves_item_untouched() {
        let mut item =
            LineItem::new(description(), Decimal::TWO, zar(Decimal::TEN))
                .unwrap();
        let before = item.clone();

        assert!(item.set_quantity(Decimal::NEGATIVE_ONE).is_err());
        assert!(item.set_unit_price(zar(Decimal::NEGATIVE_ONE)).is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn checks_description() {
        assert!(Description::new("Hosting").is_some());
        assert!(Description::new("").is_none());
        assert!(Description::new(" Hosting").is_none());
        assert!(Description::new("x".repeat(1001)).is_none());
    }

    prop_compose! {
        fn quantity()(units in 1_i64..10_000, scale in 0_u32..3) -> Decimal {
            Decimal::new(units, scale)
        }
    }

    prop_compose! {
        fn price()(cents in 0_i64..100_000_000) -> Money {
            zar(Decimal::new(cents, 2))
        }
    }

    proptest! {
        #[test]
        fn amount_is_quantity_times_unit_price(
            (q1, p1) in (quantity(), price()),
            (q2, p2) in (quantity(), price()),
        ) {
            let mut item = LineItem::new(description(), q1, p1).unwrap();
            prop_assert_eq!(item.amount().amount, q1 * p1.amount);

            item.set_quantity(q2).unwrap();
            prop_assert_eq!(item.amount().amount, q2 * p1.amount);

            item.set_unit_price(p2).unwrap();
            prop_assert_eq!(item.amount().amount, q2 * p2.amount);
            prop_assert_eq!(
                item.amount().round(),
                Money { amount: item.quantity() * item.unit_price().amount, ..p2 }
                    .round(),
            );
        }
    }
}
