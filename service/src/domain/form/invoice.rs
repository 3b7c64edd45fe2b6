//! Invoice [`Form`] definitions.

use std::{fmt, time::Duration};

use common::{Currency, Date, Money};
use rust_decimal::Decimal;

use crate::domain::{
    client,
    document::Notes,
    invoice::{Description, Draft, Number, Status},
    project,
};

use super::{optional_text, Errors, REQUIRED};

/// Draft of a new invoice being edited.
#[derive(Clone, Debug)]
pub struct Form {
    /// Manually entered number, or an empty one to allocate it
    /// automatically.
    number: String,

    /// ID of the client the invoice is issued to.
    client_id: Option<client::Id>,

    /// ID of the project the invoice is about.
    project_id: Option<project::Id>,

    /// Amount to be paid.
    amount: Option<Decimal>,

    /// Issue date of the invoice.
    date: Option<Date>,

    /// Date the invoice should be paid by.
    due_date: Option<Date>,

    /// Initial status of the invoice.
    status: Status,

    /// Description of what the invoice is for.
    description: String,

    /// Notes of the invoice.
    notes: String,

    /// Validation [`Errors`] of this [`Form`].
    errors: Errors<Field>,
}

/// Field of an invoice [`Form`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Field {
    /// Number of the invoice.
    Number,

    /// Client of the invoice.
    Client,

    /// Amount of the invoice.
    Amount,

    /// Issue date of the invoice.
    Date,

    /// Date the invoice should be paid by.
    DueDate,

    /// Description of the invoice.
    Description,

    /// Notes of the invoice.
    Notes,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "invoice_number",
            Self::Client => "client_id",
            Self::Amount => "amount",
            Self::Date => "date",
            Self::DueDate => "due_date",
            Self::Description => "description",
            Self::Notes => "notes",
        })
    }
}

/// Single edit of an invoice [`Form`].
#[derive(Clone, Debug)]
pub enum Edit {
    /// Enters the number, an empty one meaning an automatic one.
    Number(String),

    /// Chooses the client.
    Client(Option<client::Id>),

    /// Chooses the project.
    Project(Option<project::Id>),

    /// Enters the amount.
    Amount(Option<Decimal>),

    /// Sets the issue date.
    Date(Option<Date>),

    /// Sets the date the invoice should be paid by.
    DueDate(Option<Date>),

    /// Chooses the initial status.
    Status(Status),

    /// Enters the description.
    Description(String),

    /// Enters the notes.
    Notes(String),
}

/// Greatest amount an invoice can be drafted with.
const MAX_AMOUNT: i64 = 99_999_999;

impl Form {
    /// Creates a new [`Form`] issued `today` and due the provided
    /// `payment_term` later.
    #[must_use]
    pub fn new(today: Date, payment_term: Duration) -> Self {
        Self {
            number: String::new(),
            client_id: None,
            project_id: None,
            amount: None,
            date: Some(today),
            due_date: Some(today + payment_term),
            status: Status::Draft,
            description: String::new(),
            notes: String::new(),
            errors: Errors::default(),
        }
    }

    /// Returns the recorded validation [`Errors`] of this [`Form`].
    #[must_use]
    pub fn errors(&self) -> &Errors<Field> {
        &self.errors
    }

    /// Applies the provided [`Edit`], clearing the error of the edited field.
    pub fn apply(&mut self, edit: Edit) {
        let field = match edit {
            Edit::Number(n) => {
                self.number = n;
                Field::Number
            }
            Edit::Client(id) => {
                self.client_id = id;
                Field::Client
            }
            Edit::Project(id) => {
                self.project_id = id;
                return;
            }
            Edit::Amount(a) => {
                self.amount = a;
                Field::Amount
            }
            Edit::Date(d) => {
                self.date = d;
                Field::Date
            }
            Edit::DueDate(d) => {
                self.due_date = d;
                Field::DueDate
            }
            Edit::Status(s) => {
                self.status = s;
                return;
            }
            Edit::Description(d) => {
                self.description = d;
                Field::Description
            }
            Edit::Notes(n) => {
                self.notes = n;
                Field::Notes
            }
        };
        self.errors.clear(&field);
    }

    /// Validates this [`Form`] against the provided `today`, producing a
    /// [`Draft`] priced in the provided [`Currency`] if every field is valid.
    ///
    /// # Errors
    ///
    /// With the recorded [`Errors`] of every invalid field otherwise.
    pub fn validate(
        &mut self,
        today: Date,
        currency: Currency,
    ) -> Result<Draft, &Errors<Field>> {
        self.errors.reset();
        let errors = &mut self.errors;

        let number = self.number.trim();
        let number = if number.is_empty() {
            None
        } else {
            number
                .parse::<Number>()
                .map_err(|_| {
                    errors.set(
                        Field::Number,
                        "Invoice number must look like MZK-2025-001",
                    );
                })
                .ok()
        };

        if self.client_id.is_none() {
            errors.set(Field::Client, REQUIRED);
        }

        match self.amount {
            None => errors.set(Field::Amount, "Amount must be greater than 0"),
            Some(a) if a <= Decimal::ZERO => {
                errors.set(Field::Amount, "Amount must be greater than 0");
            }
            Some(a)
                if a < Decimal::new(1, 2) || a > Decimal::new(MAX_AMOUNT, 2) =>
            {
                errors.set(
                    Field::Amount,
                    "Amount must be between 0.01 and 999,999.99",
                );
            }
            Some(a) if a.normalize().scale() > common::money::SCALE => {
                errors.set(
                    Field::Amount,
                    "Amount must have at most 2 decimal places",
                );
            }
            Some(_) => {}
        }

        match self.date {
            None => errors.set(Field::Date, REQUIRED),
            Some(d)
                if today.add_years(-1).is_some_and(|min| d < min)
                    || today.add_years(1).is_some_and(|max| d > max) =>
            {
                errors.set(Field::Date, "Date must be within 1 year of today");
            }
            Some(_) => {}
        }

        match (self.date, self.due_date) {
            (_, None) => errors.set(Field::DueDate, REQUIRED),
            (Some(date), Some(due)) if due < date => errors.set(
                Field::DueDate,
                "Due date must be on or after invoice date",
            ),
            (Some(date), Some(due))
                if date.add_years(1).is_some_and(|max| due > max) =>
            {
                errors.set(
                    Field::DueDate,
                    "Due date must be within 1 year of invoice date",
                );
            }
            (None | Some(_), Some(_)) => {}
        }

        let description = self.description.trim();
        let description = if description.is_empty() {
            errors.set(Field::Description, REQUIRED);
            None
        } else if !(5..=1000).contains(&description.chars().count()) {
            errors.set(
                Field::Description,
                "Description must be between 5 and 1000 characters",
            );
            None
        } else {
            Description::new(description)
        };

        let notes = optional_text(&self.notes, errors, |s| {
            Notes::new(s).ok_or((
                Field::Notes,
                "Notes must not exceed 2000 characters",
            ))
        });

        if !self.errors.is_empty() {
            return Err(&self.errors);
        }
        let (
            Some(client_id),
            Some(amount),
            Some(date),
            Some(due_date),
            Some(description),
        ) = (
            self.client_id,
            self.amount,
            self.date,
            self.due_date,
            description,
        )
        else {
            return Err(&self.errors);
        };

        Ok(Draft {
            number,
            client_id,
            project_id: self.project_id,
            amount: Money { amount, currency },
            date: date.coerce(),
            due_date: due_date.coerce(),
            status: self.status,
            description,
            notes,
        })
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Currency, Date};
    use rust_decimal::Decimal;

    use crate::domain::{client, invoice::Status};

    use super::{Edit, Field, Form};

    const THIRTY_DAYS: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn today() -> Date {
        date("2025-06-01")
    }

    fn filled() -> Form {
        let mut f = Form::new(today(), THIRTY_DAYS);
        f.apply(Edit::Client(Some(client::Id::new())));
        f.apply(Edit::Amount(Some("1500.50".parse().unwrap())));
        f.apply(Edit::Description("Website redesign".into()));
        f
    }

    fn amount_error(amount: &str) -> Option<&'static str> {
        let mut f = filled();
        f.apply(Edit::Amount(Some(amount.parse().unwrap())));
        _ = f.validate(today(), Currency::Zar);
        f.errors().get(&Field::Amount)
    }

    #[test]
    fn defaults_due_date_to_payment_term() {
        let f = Form::new(today(), THIRTY_DAYS);

        assert_eq!(f.date, Some(today()));
        assert_eq!(f.due_date, Some(date("2025-07-01")));
        assert_eq!(f.status, Status::Draft);
    }

    #[test]
    fn checks_amount() {
        assert_eq!(amount_error("0"), Some("Amount must be greater than 0"));
        assert_eq!(amount_error("-5"), Some("Amount must be greater than 0"));
        assert_eq!(
            amount_error("0.001"),
            Some("Amount must be between 0.01 and 999,999.99"),
        );
        assert_eq!(
            amount_error("1000000"),
            Some("Amount must be between 0.01 and 999,999.99"),
        );
        assert_eq!(
            amount_error("10.123"),
            Some("Amount must have at most 2 decimal places"),
        );
        assert_eq!(amount_error("10.10"), None);
        assert_eq!(amount_error("999999.99"), None);
    }

    #[test]
    fn checks_dates() {
        let mut f = filled();
        f.apply(Edit::Date(Some(date("2024-05-31"))));
        f.apply(Edit::DueDate(Some(date("2024-05-30"))));
        assert!(f.validate(today(), Currency::Zar).is_err());
        assert_eq!(
            f.errors().get(&Field::Date),
            Some("Date must be within 1 year of today"),
        );
        assert_eq!(
            f.errors().get(&Field::DueDate),
            Some("Due date must be on or after invoice date"),
        );

        f.apply(Edit::Date(Some(date("2025-06-01"))));
        f.apply(Edit::DueDate(Some(date("2026-06-02"))));
        assert!(f.validate(today(), Currency::Zar).is_err());
        assert_eq!(f.errors().get(&Field::Date), None);
        assert_eq!(
            f.errors().get(&Field::DueDate),
            Some("Due date must be within 1 year of invoice date"),
        );
    }

    #[test]
    fn checks_dates_at_end_of_calendar() {
        let mut f = filled();
        f.apply(Edit::Date(Some(date("9999-12-31"))));
        f.apply(Edit::DueDate(Some(date("9999-12-31"))));
        assert!(f.validate(today(), Currency::Zar).is_err());
        assert_eq!(
            f.errors().get(&Field::Date),
            Some("Date must be within 1 year of today"),
        );
        assert_eq!(f.errors().get(&Field::DueDate), None);

        let draft = f.validate(date("9999-06-01"), Currency::Zar).unwrap();
        assert_eq!(draft.date, date("9999-12-31").coerce());
        assert_eq!(draft.due_date, date("9999-12-31").coerce());
    }

    #[test]
    fn checks_description_length() {
        let mut f = filled();
        f.apply(Edit::Description("Logo".into()));
        assert!(f.validate(today(), Currency::Zar).is_err());
        assert_eq!(
            f.errors().get(&Field::Description),
            Some("Description must be between 5 and 1000 characters"),
        );

        f.apply(Edit::Description(" ".into()));
        assert_eq!(f.errors().get(&Field::Description), None);
        assert!(f.validate(today(), Currency::Zar).is_err());
        assert_eq!(
            f.errors().get(&Field::Description),
            Some("This field is required"),
        );
    }

    #[test]
    fn produces_draft() {
        let mut f = filled();
        f.apply(Edit::Status(Status::Sent));
        f.apply(Edit::Notes(" Thanks! ".into()));

        let draft = f.validate(today(), Currency::Usd).unwrap();

        assert_eq!(draft.number, None);
        assert_eq!(draft.amount.amount, Decimal::new(150_050, 2));
        assert_eq!(draft.amount.currency, Currency::Usd);
        assert_eq!(draft.status, Status::Sent);
        assert_eq!(draft.due_date, date("2025-07-01").coerce());
        assert_eq!(
            draft.notes.as_ref().map(AsRef::<str>::as_ref),
            Some("Thanks!"),
        );
    }
}
