//! [`Invoice`] definitions.

#[cfg(doc)]
use common::{Date, DateTime};
use common::{define_kind, unit, DateOf, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    client,
    document::{self, Notes},
    project, quotation,
};
#[cfg(doc)]
use super::Quotation;

/// Request for a payment issued to a client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invoice {
    /// ID of this [`Invoice`].
    pub id: Id,

    /// [`Number`] of this [`Invoice`].
    pub number: Number,

    /// ID of the client this [`Invoice`] is issued to.
    pub client_id: client::Id,

    /// ID of the project this [`Invoice`] is about, if any.
    pub project_id: Option<project::Id>,

    /// ID of the [`Quotation`] this [`Invoice`] was converted from, if any.
    pub quotation_id: Option<quotation::Id>,

    /// Amount to be paid.
    pub amount: Money,

    /// [`Date`] this [`Invoice`] was issued on.
    pub date: IssueDate,

    /// [`Date`] this [`Invoice`] should be paid by.
    pub due_date: DueDate,

    /// [`Date`] this [`Invoice`] was paid on, if it was.
    pub paid_date: Option<PaymentDate>,

    /// [`Status`] of this [`Invoice`].
    pub status: Status,

    /// [`Description`] of what this [`Invoice`] is for.
    pub description: Description,

    /// [`Notes`] of this [`Invoice`], if any.
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Invoice`] was created.
    pub created_at: CreationDateTime,
}

impl Invoice {
    /// Indicates whether this [`Invoice`] is overdue on the provided `today`.
    ///
    /// An [`Invoice`] is overdue once its due [`Date`] has passed without it
    /// being paid.
    #[must_use]
    pub fn is_overdue(&self, today: common::Date) -> bool {
        self.status != Status::Paid && self.due_date.coerce() < today
    }

    /// Changes [`Status`] of this [`Invoice`].
    ///
    /// Marking it [`Status::Paid`] records `today` as its payment [`Date`],
    /// any other [`Status`] clears it.
    pub fn set_status(&mut self, status: Status, today: common::Date) {
        self.paid_date = (status == Status::Paid).then(|| today.coerce());
        self.status = status;
    }
}

/// ID of an [`Invoice`].
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

/// [`document::Number`] of an [`Invoice`].
pub type Number = document::Number;

/// Description of what an [`Invoice`] is for.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// [`Description`] of a converted [`Quotation`] having no items.
    pub const CONVERSION_FALLBACK: &'static str = "Services as per quotation";

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

    /// Returns the [`Description::CONVERSION_FALLBACK`].
    #[must_use]
    pub fn conversion_fallback() -> Self {
        Self(Self::CONVERSION_FALLBACK.into())
    }

    /// Checks whether the given `description` is a valid [`Description`].
    fn check(description: impl AsRef<str>) -> bool {
        let description = description.as_ref();
        description.trim() == description && !description.is_empty()
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

define_kind! {
    #[doc = "Status of an [`Invoice`]."]
    #[serialize_all = "snake_case"]
    enum Status {
        #[doc = "[`Invoice`] is being prepared."]
        Draft = 1,

        #[doc = "[`Invoice`] was sent to the client."]
        Sent = 2,

        #[doc = "[`Invoice`] was paid."]
        Paid = 3,

        #[doc = "[`Invoice`] wasn't paid in time."]
        Overdue = 4,
    }
}

/// [`Date`] an [`Invoice`] was issued on.
pub type IssueDate = DateOf<(Invoice, unit::Issue)>;

/// [`Date`] an [`Invoice`] should be paid by.
pub type DueDate = DateOf<(Invoice, unit::Due)>;

/// [`Date`] an [`Invoice`] was paid on.
pub type PaymentDate = DateOf<(Invoice, unit::Payment)>;

/// [`DateTime`] when an [`Invoice`] was created.
pub type CreationDateTime = DateTimeOf<(Invoice, unit::Creation)>;

/// Data of a new [`Invoice`] to be created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    /// Manually chosen [`Number`], if any.
    ///
    /// [`None`] means the next [`Number`] is allocated automatically.
    pub number: Option<Number>,

    /// ID of the client the [`Invoice`] is issued to.
    pub client_id: client::Id,

    /// ID of the project the [`Invoice`] is about, if any.
    pub project_id: Option<project::Id>,

    /// Amount to be paid.
    pub amount: Money,

    /// [`Date`] the [`Invoice`] is issued on.
    pub date: IssueDate,

    /// [`Date`] the [`Invoice`] should be paid by.
    pub due_date: DueDate,

    /// Initial [`Status`] of the [`Invoice`].
    pub status: Status,

    /// [`Description`] of what the [`Invoice`] is for.
    pub description: Description,

    /// [`Notes`] of the [`Invoice`], if any.
    pub notes: Option<Notes>,
}

impl Draft {
    /// Turns this [`Draft`] into an [`Invoice`] numbered with the provided
    /// [`Number`].
    #[must_use]
    pub fn into_invoice(self, number: Number) -> Invoice {
        let today = DateTimeOf::now();
        let paid_date =
            (self.status == Status::Paid).then(|| today.date::<()>().coerce());
        Invoice {
            id: Id::new(),
            number,
            client_id: self.client_id,
            project_id: self.project_id,
            quotation_id: None,
            amount: self.amount,
            date: self.date,
            due_date: self.due_date,
            paid_date,
            status: self.status,
            description: self.description,
            notes: self.notes,
            created_at: today,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Date, Money};

    use super::{Description, Draft, Invoice, Status};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn invoice(status: Status) -> Invoice {
        Draft {
            number: None,
            client_id: crate::domain::client::Id::new(),
            project_id: None,
            amount: Money::zero(Currency::Zar),
            date: date("2025-03-01").coerce(),
            due_date: date("2025-03-31").coerce(),
            status,
            description: Description::new("Website").unwrap(),
            notes: None,
        }
        .into_invoice("MZK-2025-001".parse().unwrap())
    }

    #[test]
    fn overdue_once_due_date_passed_unpaid() {
        let mut i = invoice(Status::Sent);

        assert!(!i.is_overdue(date("2025-03-31")));
        assert!(i.is_overdue(date("2025-04-01")));

        i.set_status(Status::Paid, date("2025-04-02"));
        assert!(!i.is_overdue(date("2025-04-03")));
    }

    #[test]
    fn tracks_payment_date() {
        let mut i = invoice(Status::Draft);
        assert_eq!(i.paid_date, None);

        i.set_status(Status::Paid, date("2025-03-15"));
        assert_eq!(i.paid_date, Some(date("2025-03-15").coerce()));

        i.set_status(Status::Sent, date("2025-03-16"));
        assert_eq!(i.paid_date, None);
    }
}
