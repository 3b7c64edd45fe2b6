//! Domain definitions.

pub mod client;
pub mod document;
pub mod form;
pub mod invoice;
pub mod line_item;
pub mod pricing;
pub mod project;
pub mod quotation;
pub mod totals;

use derive_more::{Display, Error};

pub use self::{
    form::Form, invoice::Invoice, line_item::LineItem, quotation::Quotation,
    totals::Totals,
};

/// Argument rejected by a domain computation before anything is computed.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum InvalidArgument {
    /// Total of a pricing breakdown is negative.
    #[display("total cannot be negative")]
    NegativeTotal,

    /// Total of a pricing breakdown exceeds the supported range.
    #[display("total exceeds the supported range")]
    TotalOutOfRange,

    /// Quantity of a [`LineItem`] is zero or negative.
    #[display("quantity must be greater than 0")]
    NonPositiveQuantity,

    /// Unit price of a [`LineItem`] is negative.
    #[display("unit price cannot be negative")]
    NegativeUnitPrice,

    /// Computed amount doesn't fit into a decimal.
    #[display("amount exceeds the supported range")]
    AmountOutOfRange,

    /// Amounts of different currencies were mixed.
    #[display("amounts of different currencies cannot be mixed")]
    CurrencyMismatch,

    /// Document expires before it's issued.
    #[display("validity cannot end before the issue date")]
    ExpiresBeforeIssue,
}
