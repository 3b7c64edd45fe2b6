//! [`Quotation`] definitions.

use std::time::Duration;

#[cfg(doc)]
use common::{Date, DateTime};
use common::{define_kind, unit, Currency, DateOf, DateTimeOf, Percent};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    client,
    document::{self, Notes, Prefix, Scope},
    invoice, project, InvalidArgument, Invoice, LineItem, Totals,
};

/// Priced offer made to a client, which may be converted into an
/// [`Invoice`] once accepted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Quotation {
    /// ID of this [`Quotation`].
    pub id: Id,

    /// [`Number`] of this [`Quotation`].
    pub number: Number,

    /// ID of the client this [`Quotation`] is made to.
    pub client_id: client::Id,

    /// ID of the project this [`Quotation`] is about, if any.
    pub project_id: Option<project::Id>,

    /// [`Date`] this [`Quotation`] was issued on.
    pub date: IssueDate,

    /// [`Date`] this [`Quotation`] is valid until.
    pub valid_until: ExpirationDate,

    /// [`Status`] of this [`Quotation`].
    pub status: Status,

    /// [`Currency`] this [`Quotation`] is priced in.
    pub currency: Currency,

    /// [`LineItem`]s of this [`Quotation`], in their display order.
    pub items: Vec<LineItem>,

    /// Discount applied to the subtotal of this [`Quotation`].
    pub discount: Percent,

    /// [`Notes`] of this [`Quotation`], if any.
    pub notes: Option<Notes>,

    /// [`Terms`] of this [`Quotation`], if any.
    pub terms: Option<Terms>,

    /// ID of the [`Invoice`] this [`Quotation`] was converted into, if it
    /// was.
    pub invoice_id: Option<invoice::Id>,

    /// [`DateTime`] when this [`Quotation`] was created.
    pub created_at: CreationDateTime,
}

impl Quotation {
    /// Computes [`Totals`] of this [`Quotation`].
    ///
    /// # Errors
    ///
    /// See [`Totals::compute()`].
    pub fn totals(&self) -> Result<Totals, InvalidArgument> {
        Totals::compute(&self.items, self.discount, self.currency)
    }

    /// Indicates whether this [`Quotation`] is marked as converted into an
    /// [`Invoice`].
    #[must_use]
    pub fn is_converted(&self) -> bool {
        self.invoice_id.is_some()
    }

    /// Converts this [`Quotation`] into a new draft [`Invoice`].
    ///
    /// The [`invoice::Number`] is allocated in the `prefix` [`Scope`] of the
    /// `today`'s year, out of the `existing` invoice numbers. The [`Invoice`]
    /// is due the `payment_term` after `today`, and charges the discounted
    /// total of this [`Quotation`]. The [`Conversion::quotation`] is
    /// [`Status::Accepted`] and marked with the [`Invoice`] ID.
    ///
    /// # Errors
    ///
    /// If [`Totals`] of this [`Quotation`] cannot be computed.
    pub fn convert<S: AsRef<str>>(
        &self,
        prefix: &Prefix,
        existing: impl IntoIterator<Item = S>,
        today: common::Date,
        payment_term: Duration,
    ) -> Result<Conversion, InvalidArgument> {
        let totals = self.totals()?;

        let number = invoice::Number::allocate(
            Scope {
                prefix: prefix.clone(),
                year: today.year(),
            },
            existing,
        );

        let description = self
            .items
            .iter()
            .map(|i| {
                let price = i.unit_price();
                format!(
                    "{} ({}x {}{})",
                    i.description(),
                    i.quantity().normalize(),
                    price.currency.symbol(),
                    price.amount.normalize(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let description = invoice::Description::new(description)
            .unwrap_or_else(invoice::Description::conversion_fallback);

        let notes =
            Notes::new(format!("Converted from quotation {}", self.number));

        let invoice = Invoice {
            id: invoice::Id::new(),
            number,
            client_id: self.client_id,
            project_id: self.project_id,
            quotation_id: Some(self.id),
            amount: totals.total,
            date: today.coerce(),
            due_date: (today + payment_term).coerce(),
            paid_date: None,
            status: invoice::Status::Draft,
            description,
            notes,
            created_at: DateTimeOf::now(),
        };

        let mut quotation = self.clone();
        quotation.status = Status::Accepted;
        quotation.invoice_id = Some(invoice.id);

        Ok(Conversion { invoice, quotation })
    }
}

/// Result of converting a [`Quotation`] into an [`Invoice`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Conversion {
    /// Draft [`Invoice`] the [`Quotation`] was converted into.
    pub invoice: Invoice,

    /// [`Quotation`] in its converted state.
    pub quotation: Quotation,
}

define_kind! {
    #[doc = "Half of a [`Conversion`] that might be missing from a store."]
    #[serialize_all = "snake_case"]
    enum Half {
        #[doc = "Invoice converted from a quotation."]
        Invoice = 1,

        #[doc = "Mark of a quotation pointing to its invoice."]
        QuotationMark = 2,
    }
}

/// ID of a [`Quotation`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// [`document::Number`] of a [`Quotation`].
pub type Number = document::Number;

/// Terms a [`Quotation`] is offered on.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Terms(String);

impl Terms {
    /// [`Terms`] a new [`Quotation`] is offered on by default.
    pub const DEFAULT: &'static str =
        "This quotation is valid for 30 days from the date of issue.\n\
         Payment terms: 50% upfront, 50% on completion.";

    /// Creates new [`Terms`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `terms` match the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(terms: impl Into<String>) -> Self {
        Self(terms.into())
    }

    /// Creates new [`Terms`] if the given `terms` are valid.
    #[must_use]
    pub fn new(terms: impl Into<String>) -> Option<Self> {
        let terms = terms.into();
        Self::check(&terms).then_some(Self(terms))
    }

    /// Checks whether the given `terms` are valid [`Terms`].
    fn check(terms: impl AsRef<str>) -> bool {
        let terms = terms.as_ref();
        terms.trim() == terms
            && !terms.is_empty()
            && terms.chars().count() <= 2000
    }
}

impl FromStr for Terms {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Terms`")
    }
}

define_kind! {
    #[doc = "Status of a [`Quotation`]."]
    #[serialize_all = "snake_case"]
    enum Status {
        #[doc = "[`Quotation`] is being prepared."]
        Draft = 1,

        #[doc = "[`Quotation`] was sent to the client."]
        Sent = 2,

        #[doc = "[`Quotation`] was accepted by the client."]
        Accepted = 3,

        #[doc = "[`Quotation`] was rejected by the client."]
        Rejected = 4,

        #[doc = "[`Quotation`] wasn't answered in time."]
        Expired = 5,
    }
}

/// [`Date`] a [`Quotation`] was issued on.
pub type IssueDate = DateOf<(Quotation, unit::Issue)>;

/// [`Date`] a [`Quotation`] is valid until.
pub type ExpirationDate = DateOf<(Quotation, unit::Expiration)>;

/// [`DateTime`] when a [`Quotation`] was created.
pub type CreationDateTime = DateTimeOf<(Quotation, unit::Creation)>;

/// Data of a new [`Quotation`] to be created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    /// Manually chosen [`Number`], if any.
    ///
    /// [`None`] means the next [`Number`] is allocated automatically.
    pub number: Option<Number>,

    /// ID of the client the [`Quotation`] is made to.
    pub client_id: client::Id,

    /// ID of the project the [`Quotation`] is about, if any.
    pub project_id: Option<project::Id>,

    /// [`Date`] the [`Quotation`] is issued on.
    pub date: IssueDate,

    /// [`Date`] the [`Quotation`] is valid until.
    pub valid_until: ExpirationDate,

    /// [`Currency`] the [`Quotation`] is priced in.
    pub currency: Currency,

    /// [`LineItem`]s of the [`Quotation`].
    pub items: Vec<LineItem>,

    /// Discount applied to the subtotal of the [`Quotation`].
    pub discount: Percent,

    /// [`Notes`] of the [`Quotation`], if any.
    pub notes: Option<Notes>,

    /// [`Terms`] of the [`Quotation`], if any.
    pub terms: Option<Terms>,
}

impl Draft {
    /// Turns this [`Draft`] into a [`Status::Draft`] [`Quotation`] numbered
    /// with the provided [`Number`].
    #[must_use]
    pub fn into_quotation(self, number: Number) -> Quotation {
        Quotation {
            id: Id::new(),
            number,
            client_id: self.client_id,
            project_id: self.project_id,
            date: self.date,
            valid_until: self.valid_until,
            status: Status::Draft,
            currency: self.currency,
            items: self.items,
            discount: self.discount,
            notes: self.notes,
            terms: self.terms,
            invoice_id: None,
            created_at: DateTimeOf::now(),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Currency, Date, Money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{
        client,
        document::Prefix,
        invoice,
        line_item::{self, LineItem},
    };

    use super::{Draft, Quotation, Status};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(description: &str, quantity: &str, price: &str) -> LineItem {
        LineItem::new(
            line_item::Description::new(description).unwrap(),
            decimal(quantity),
            Money {
                amount: decimal(price),
                currency: Currency::Zar,
            },
        )
        .unwrap()
    }

    fn quotation(items: Vec<LineItem>, discount: Percent) -> Quotation {
        Draft {
            number: None,
            client_id: client::Id::new(),
            project_id: None,
            date: "2025-01-10".parse::<Date>().unwrap().coerce(),
            valid_until: "2025-02-09".parse::<Date>().unwrap().coerce(),
            currency: Currency::Zar,
            items,
            discount,
            notes: None,
            terms: None,
        }
        .into_quotation("QUO-2025-007".parse().unwrap())
    }

    const THIRTY_DAYS: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    #[test]
    fn converts_into_invoice() {
        let q = quotation(
            vec![
                item("Website Development", "1", "3500"),
                item("Hosting", "12", "125"),
            ],
            Percent::ZERO,
        );
        let today: Date = "2025-06-01".parse().unwrap();

        let c = q
            .convert(
                &Prefix::new("MZK").unwrap(),
                ["MZK-2025-001", "MZK-2025-003", "MZK-2024-010"],
                today,
                THIRTY_DAYS,
            )
            .unwrap();

        assert_eq!(c.invoice.amount.amount, decimal("5000.00"));
        assert_eq!(c.invoice.number.to_string(), "MZK-2025-004");
        assert_eq!(
            c.invoice.description.to_string(),
            "Website Development (1x R3500)\nHosting (12x R125)",
        );
        assert_eq!(c.invoice.status, invoice::Status::Draft);
        assert_eq!(c.invoice.quotation_id, Some(q.id));
        assert_eq!(c.invoice.client_id, q.client_id);
        assert_eq!(c.invoice.date, today.coerce());
        assert_eq!(
            c.invoice.due_date,
            "2025-07-01".parse::<Date>().unwrap().coerce(),
        );
        assert_eq!(
            c.invoice.notes.as_ref().map(AsRef::<str>::as_ref),
            Some("Converted from quotation QUO-2025-007"),
        );

        assert_eq!(c.quotation.status, Status::Accepted);
        assert_eq!(c.quotation.invoice_id, Some(c.invoice.id));
        assert!(c.quotation.is_converted());
        assert!(!q.is_converted());
    }

    #[test]
    fn charges_discounted_total() {
        let q = quotation(
            vec![item("Design", "2", "250.25")],
            Percent::whole(10),
        );

        let c = q
            .convert(
                &Prefix::new("MZK").unwrap(),
                Vec::<&str>::new(),
                "2025-06-01".parse().unwrap(),
                THIRTY_DAYS,
            )
            .unwrap();

        assert_eq!(c.invoice.amount.amount, decimal("450.45"));
        assert_eq!(c.invoice.number.to_string(), "MZK-2025-001");
    }

    #[test]
    fn falls_back_to_generic_description() {
        let q = quotation(vec![], Percent::ZERO);

        let c = q
            .convert(
                &Prefix::new("MZK").unwrap(),
                Vec::<&str>::new(),
                "2025-06-01".parse().unwrap(),
                THIRTY_DAYS,
            )
            .unwrap();

        assert_eq!(
            c.invoice.description.to_string(),
            invoice::Description::CONVERSION_FALLBACK,
        );
        assert_eq!(c.invoice.amount, Money::zero(Currency::Zar));
    }
}
