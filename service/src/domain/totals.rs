//! [`Totals`] definitions.

use common::{money, Currency, Money, Percent};
use rust_decimal::Decimal;

use super::{InvalidArgument, LineItem};

/// Totals of a document, derived from its [`LineItem`]s and discount.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Totals {
    /// Exact sum of the [`LineItem`] amounts.
    pub subtotal: Money,

    /// Discount applied to the [`Totals::subtotal`].
    pub discount: Percent,

    /// Discount amount, rounded to [`money::SCALE`] decimal places.
    pub discount_amount: Money,

    /// [`Totals::subtotal`] minus [`Totals::discount_amount`].
    ///
    /// Not clamped at zero.
    pub total: Money,
}

impl Totals {
    /// Computes the [`Totals`] of the provided [`LineItem`]s in the provided
    /// document [`Currency`].
    ///
    /// No [`LineItem`]s yield zero [`Totals`].
    ///
    /// # Errors
    ///
    /// - [`InvalidArgument::CurrencyMismatch`] if any [`LineItem`] is priced
    ///   in another [`Currency`].
    /// - [`InvalidArgument::AmountOutOfRange`] if the sum overflows.
    pub fn compute<'i>(
        items: impl IntoIterator<Item = &'i LineItem>,
        discount: Percent,
        currency: Currency,
    ) -> Result<Self, InvalidArgument> {
        use InvalidArgument as E;

        let subtotal = items.into_iter().try_fold(
            Money::zero(currency),
            |sum, item| {
                let amount = item.amount();
                if amount.currency != currency {
                    return Err(E::CurrencyMismatch);
                }
                sum.checked_add(amount).ok_or(E::AmountOutOfRange)
            },
        )?;

        let discount_amount = subtotal
            .amount
            .checked_mul(discount.value())
            .and_then(|a| a.checked_div(Decimal::ONE_HUNDRED))
            .map(money::round)
            .ok_or(E::AmountOutOfRange)?;
        let discount_amount = Money {
            amount: discount_amount,
            currency,
        };

        Ok(Self {
            subtotal,
            discount,
            discount_amount,
            total: subtotal
                .checked_sub(discount_amount)
                .ok_or(E::AmountOutOfRange)?,
        })
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money, Percent};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use crate::domain::{line_item::Description, InvalidArgument, LineItem};

    use super::Totals;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(quantity: &str, price: &str, currency: Currency) -> LineItem {
        LineItem::new(
            Description::new("Work").unwrap(),
            decimal(quantity),
            Money {
                amount: decimal(price),
                currency,
            },
        )
        .unwrap()
    }

    #[test]
    fn applies_discount() {
        let items = [
            item("2", "250", Currency::Zar),
            item("1", "500", Currency::Zar),
        ];

        let t =
            Totals::compute(&items, Percent::whole(10), Currency::Zar).unwrap();

        assert_eq!(t.subtotal.amount, decimal("1000.00"));
        assert_eq!(t.discount_amount.amount, decimal("100.00"));
        assert_eq!(t.total.amount, decimal("900.00"));
    }

    #[test]
    fn rounds_discount_amount_only() {
        let items = [item("1", "0.05", Currency::Zar)];
        let discount = "50".parse().unwrap();

        let t = Totals::compute(&items, discount, Currency::Zar).unwrap();

        assert_eq!(t.subtotal.amount, decimal("0.05"));
        assert_eq!(t.discount_amount.amount.to_string(), "0.03");
        assert_eq!(t.total.amount, decimal("0.02"));
    }

    #[test]
    fn empty_items_yield_zeros() {
        let t = Totals::compute([], Percent::whole(25), Currency::Usd).unwrap();

        assert_eq!(t.subtotal, Money::zero(Currency::Usd));
        assert_eq!(t.discount_amount.amount, Decimal::ZERO);
        assert_eq!(t.total.amount, Decimal::ZERO);
    }

    #[test]
    fn refuses_mixed_currencies() {
        let items = [
            item("1", "10", Currency::Zar),
            item("1", "10", Currency::Eur),
        ];

        assert_eq!(
            Totals::compute(&items, Percent::ZERO, Currency::Zar),
            Err(InvalidArgument::CurrencyMismatch),
        );
        assert_eq!(
            Totals::compute(&items[..1], Percent::ZERO, Currency::Eur),
            Err(InvalidArgument::CurrencyMismatch),
        );
    }

    prop_compose! {
        fn items()(
            parts in prop::collection::vec((1_i64..100, 0_i64..10_000_000), 0..8),
        ) -> Vec<LineItem> {
            parts
                .into_iter()
                .map(|(q, cents)| {
                    LineItem::new(
                        Description::new("Work").unwrap(),
                        Decimal::from(q),
                        Money {
                            amount: Decimal::new(cents, 2),
                            currency: Currency::Zar,
                        },
                    )
                    .unwrap()
                })
                .collect()
        }
    }

    prop_compose! {
        fn discount()(basis_points in 0_i64..=10_000) -> Percent {
            Percent::new(Decimal::new(basis_points, 2)).unwrap()
        }
    }

    proptest! {
        #[test]
        fn larger_discount_never_increases_total(
            items in items(),
            d1 in discount(),
            d2 in discount(),
        ) {
            let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };

            let lo = Totals::compute(&items, lo, Currency::Zar).unwrap();
            let hi = Totals::compute(&items, hi, Currency::Zar).unwrap();

            prop_assert!(hi.total.amount <= lo.total.amount);
            prop_assert_eq!(
                lo.subtotal.amount,
                items.iter().map(|i| i.amount().amount).sum::<Decimal>(),
            );
        }
    }
}
