//! Quotation [`Form`] definitions.

use std::{fmt, time::Duration};

use common::{Currency, Date, Money, Percent};
use rust_decimal::Decimal;

use crate::domain::{
    client,
    document::Notes,
    line_item::{self, LineItem},
    project,
    quotation::{Draft, Number, Terms},
};

use super::{optional_text, Errors};

/// Draft of a new quotation being edited.
#[derive(Clone, Debug)]
pub struct Form {
    /// Manually entered number, or an empty one to allocate it
    /// automatically.
    number: String,

    /// ID of the client the quotation is made to.
    client_id: Option<client::Id>,

    /// ID of the project the quotation is about.
    project_id: Option<project::Id>,

    /// Issue date of the quotation.
    date: Option<Date>,

    /// Date the quotation is valid until.
    valid_until: Option<Date>,

    /// Line [`Item`]s of the quotation.
    items: Vec<Item>,

    /// Discount applied to the subtotal.
    discount: Percent,

    /// Notes of the quotation.
    notes: String,

    /// Terms of the quotation.
    terms: String,

    /// Validation [`Errors`] of this [`Form`].
    errors: Errors<Field>,
}

/// Line item of a quotation [`Form`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    /// Description of this [`Item`].
    description: String,

    /// Quantity of this [`Item`].
    quantity: Decimal,

    /// Unit price of this [`Item`].
    unit_price: Decimal,

    /// Amount of this [`Item`], kept equal to `quantity * unit_price`.
    amount: Decimal,
}

impl Item {
    /// Creates a blank [`Item`] of a single free unit.
    fn blank() -> Self {
        Self {
            description: String::new(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
            amount: Decimal::ZERO,
        }
    }

    /// Returns description of this [`Item`].
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns quantity of this [`Item`].
    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Returns unit price of this [`Item`].
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Returns amount of this [`Item`].
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Recomputes the amount of this [`Item`].
    ///
    /// Returns `false` if it overflows, leaving the amount zeroed.
    fn recompute(&mut self) -> bool {
        match self.quantity.checked_mul(self.unit_price) {
            Some(amount) => {
                self.amount = amount;
                true
            }
            None => {
                self.amount = Decimal::ZERO;
                false
            }
        }
    }
}

impl From<&LineItem> for Item {
    fn from(item: &LineItem) -> Self {
        Self {
            description: item.description().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price().amount,
            amount: item.amount().amount,
        }
    }
}

/// Field of a quotation [`Form`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Field {
    /// Number of the quotation.
    Number,

    /// Client of the quotation.
    Client,

    /// Issue date of the quotation.
    Date,

    /// Date the quotation is valid until.
    ValidUntil,

    /// Field of the line [`Item`] at the index.
    Item(usize, ItemField),

    /// Notes of the quotation.
    Notes,

    /// Terms of the quotation.
    Terms,
}

/// Field of a line [`Item`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ItemField {
    /// Description of the [`Item`].
    Description,

    /// Quantity of the [`Item`].
    Quantity,

    /// Unit price of the [`Item`].
    UnitPrice,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => f.write_str("quotation_number"),
            Self::Client => f.write_str("client_id"),
            Self::Date => f.write_str("date"),
            Self::ValidUntil => f.write_str("valid_until"),
            Self::Item(i, field) => {
                let field = match field {
                    ItemField::Description => "description",
                    ItemField::Quantity => "quantity",
                    ItemField::UnitPrice => "unit_price",
                };
                write!(f, "item_{i}_{field}")
            }
            Self::Notes => f.write_str("notes"),
            Self::Terms => f.write_str("terms"),
        }
    }
}

/// Single edit of a quotation [`Form`].
#[derive(Clone, Debug)]
pub enum Edit {
    /// Enters the number, an empty one meaning an automatic one.
    Number(String),

    /// Chooses the client.
    Client(Option<client::Id>),

    /// Chooses the project.
    Project(Option<project::Id>),

    /// Sets the issue date.
    Date(Option<Date>),

    /// Sets the date the quotation is valid until.
    ValidUntil(Option<Date>),

    /// Sets the discount.
    Discount(Percent),

    /// Enters the notes.
    Notes(String),

    /// Enters the terms.
    Terms(String),

    /// Appends a blank line [`Item`].
    AddItem,

    /// Removes the line [`Item`] at the index, unless it's the only one.
    RemoveItem(usize),

    /// Edits the line [`Item`] at the index.
    Item(usize, ItemEdit),

    /// Replaces all the line [`Item`]s, like with the generated standard
    /// ones.
    ReplaceItems(Vec<LineItem>),
}

/// Single edit of a line [`Item`].
#[derive(Clone, Debug)]
pub enum ItemEdit {
    /// Enters the description.
    Description(String),

    /// Sets the quantity.
    Quantity(Decimal),

    /// Sets the unit price.
    UnitPrice(Decimal),
}

impl Form {
    /// Creates a new [`Form`] issued `today` and valid for the provided
    /// `validity`, with a single blank line [`Item`] and the default
    /// [`Terms`].
    #[must_use]
    pub fn new(today: Date, validity: Duration) -> Self {
        Self {
            number: String::new(),
            client_id: None,
            project_id: None,
            date: Some(today),
            valid_until: Some(today + validity),
            items: vec![Item::blank()],
            discount: Percent::ZERO,
            notes: String::new(),
            terms: Terms::DEFAULT.into(),
            errors: Errors::default(),
        }
    }

    /// Returns line [`Item`]s of this [`Form`].
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns discount of this [`Form`].
    #[must_use]
    pub fn discount(&self) -> Percent {
        self.discount
    }

    /// Returns the recorded validation [`Errors`] of this [`Form`].
    #[must_use]
    pub fn errors(&self) -> &Errors<Field> {
        &self.errors
    }

    /// Applies the provided [`Edit`], clearing the error of the edited field.
    ///
    /// Out of range line [`Item`] indices are ignored.
    pub fn apply(&mut self, edit: Edit) {
        match edit {
            Edit::Number(n) => {
                self.number = n;
                self.errors.clear(&Field::Number);
            }
            Edit::Client(id) => {
                self.client_id = id;
                self.errors.clear(&Field::Client);
            }
            Edit::Project(id) => self.project_id = id,
            Edit::Date(d) => {
                self.date = d;
                self.errors.clear(&Field::Date);
            }
            Edit::ValidUntil(d) => {
                self.valid_until = d;
                self.errors.clear(&Field::ValidUntil);
            }
            Edit::Discount(d) => self.discount = d,
            Edit::Notes(n) => {
                self.notes = n;
                self.errors.clear(&Field::Notes);
            }
            Edit::Terms(t) => {
                self.terms = t;
                self.errors.clear(&Field::Terms);
            }
            Edit::AddItem => self.items.push(Item::blank()),
            Edit::RemoveItem(i) => {
                if self.items.len() > 1 && i < self.items.len() {
                    _ = self.items.remove(i);
                    // Indices of the following items have shifted.
                    self.errors.retain(|f| !matches!(f, Field::Item(..)));
                }
            }
            Edit::Item(i, edit) => self.apply_item(i, edit),
            Edit::ReplaceItems(items) => {
                self.items = items.iter().map(Item::from).collect();
                if self.items.is_empty() {
                    self.items.push(Item::blank());
                }
                self.errors.retain(|f| !matches!(f, Field::Item(..)));
            }
        }
    }

    /// Applies the provided [`ItemEdit`] to the line [`Item`] at the index.
    fn apply_item(&mut self, i: usize, edit: ItemEdit) {
        let Some(item) = self.items.get_mut(i) else {
            return;
        };

        let field = match edit {
            ItemEdit::Description(d) => {
                item.description = d;
                ItemField::Description
            }
            ItemEdit::Quantity(q) => {
                item.quantity = q;
                ItemField::Quantity
            }
            ItemEdit::UnitPrice(p) => {
                item.unit_price = p;
                ItemField::UnitPrice
            }
        };
        self.errors.clear(&Field::Item(i, field));

        if !item.recompute() {
            self.errors.set(Field::Item(i, field), AMOUNT_OUT_OF_RANGE);
        }
    }

    /// Returns the subtotal of the line [`Item`]s of this [`Form`].
    ///
    /// [`None`] is returned if it overflows.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, i| sum.checked_add(i.amount))
    }

    /// Validates this [`Form`], producing a [`Draft`] priced in the provided
    /// [`Currency`] if every field is valid.
    ///
    /// # Errors
    ///
    /// With the recorded [`Errors`] of every invalid field otherwise.
    pub fn validate(
        &mut self,
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
                .map_err(|_| errors.set(Field::Number, INVALID_NUMBER))
                .ok()
        };

        if self.client_id.is_none() {
            errors.set(Field::Client, "Client is required");
        }
        if self.date.is_none() {
            errors.set(Field::Date, "Date is required");
        }
        match (self.date, self.valid_until) {
            (_, None) => {
                errors.set(Field::ValidUntil, "Valid until date is required");
            }
            (Some(date), Some(until)) if until <= date => errors.set(
                Field::ValidUntil,
                "Valid until must be after quotation date",
            ),
            (None | Some(_), Some(_)) => {}
        }

        let items = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| validate_item(i, item, currency, errors))
            .collect::<Vec<_>>();

        let notes = optional_text(&self.notes, errors, |s| {
            Notes::new(s).ok_or((
                Field::Notes,
                "Notes must not exceed 2000 characters",
            ))
        });
        let terms = optional_text(&self.terms, errors, |s| {
            Terms::new(s).ok_or((
                Field::Terms,
                "Terms must not exceed 2000 characters",
            ))
        });

        if !self.errors.is_empty() {
            return Err(&self.errors);
        }
        let (Some(client_id), Some(date), Some(valid_until)) =
            (self.client_id, self.date, self.valid_until)
        else {
            return Err(&self.errors);
        };

        Ok(Draft {
            number,
            client_id,
            project_id: self.project_id,
            date: date.coerce(),
            valid_until: valid_until.coerce(),
            currency,
            items,
            discount: self.discount,
            notes,
            terms,
        })
    }
}

/// Message of a malformed number.
const INVALID_NUMBER: &str = "Quotation number must look like QUO-2025-001";

/// Message of an [`Item`] amount overflow.
const AMOUNT_OUT_OF_RANGE: &str = "Amount is too large";

/// Validates the line [`Item`] at the index, recording its errors.
fn validate_item(
    i: usize,
    item: &Item,
    currency: Currency,
    errors: &mut Errors<Field>,
) -> Option<LineItem> {
    let description = item.description.trim();
    let description = if description.is_empty() {
        errors.set(
            Field::Item(i, ItemField::Description),
            "Description is required",
        );
        None
    } else {
        line_item::Description::new(description).or_else(|| {
            errors.set(
                Field::Item(i, ItemField::Description),
                "Description must not exceed 1000 characters",
            );
            None
        })
    };
    if item.quantity <= Decimal::ZERO {
        errors.set(
            Field::Item(i, ItemField::Quantity),
            "Quantity must be greater than 0",
        );
    }
    if item.unit_price < Decimal::ZERO {
        errors.set(
            Field::Item(i, ItemField::UnitPrice),
            "Unit price cannot be negative",
        );
    }

    let price = Money {
        amount: item.unit_price,
        currency,
    };
    match LineItem::new(description?, item.quantity, price) {
        Ok(item) => Some(item),
        Err(_) => {
            if errors.get(&Field::Item(i, ItemField::Quantity)).is_none() {
                errors.set(
                    Field::Item(i, ItemField::Quantity),
                    AMOUNT_OUT_OF_RANGE,
                );
            }
            None
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
        pricing::{Breakdown, Tier},
        quotation::Terms,
    };

    use super::{Edit, Field, Form, ItemEdit, ItemField};

    const THIRTY_DAYS: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn form() -> Form {
        Form::new(date("2025-06-01"), THIRTY_DAYS)
    }

    #[test]
    fn starts_with_defaults() {
        let f = form();

        assert_eq!(f.valid_until, Some(date("2025-07-01")));
        assert_eq!(f.items().len(), 1);
        assert_eq!(f.items()[0].quantity(), Decimal::ONE);
        assert_eq!(f.terms, Terms::DEFAULT);
        assert_eq!(f.discount(), Percent::ZERO);
    }

    #[test]
    fn recomputes_item_amount_on_edit() {
        let mut f = form();

        f.apply(Edit::Item(0, ItemEdit::Quantity(decimal("3"))));
        f.apply(Edit::Item(0, ItemEdit::UnitPrice(decimal("99.99"))));
        assert_eq!(f.items()[0].amount(), decimal("299.97"));

        f.apply(Edit::Item(0, ItemEdit::Quantity(decimal("2"))));
        assert_eq!(f.items()[0].amount(), decimal("199.98"));
        assert_eq!(f.subtotal(), Some(decimal("199.98")));
    }

    #[test]
    fn records_every_invalid_field() {
        let mut f = form();
        f.apply(Edit::Number("QUO-12".into()));
        f.apply(Edit::ValidUntil(Some(date("2025-06-01"))));
        f.apply(Edit::Item(0, ItemEdit::Quantity(Decimal::ZERO)));
        f.apply(Edit::Item(0, ItemEdit::UnitPrice(decimal("-1"))));

        let errors = f.validate(Currency::Zar).unwrap_err();

        assert_eq!(errors.get(&Field::Number), Some(super::INVALID_NUMBER));
        assert_eq!(errors.get(&Field::Client), Some("Client is required"));
        assert_eq!(
            errors.get(&Field::ValidUntil),
            Some("Valid until must be after quotation date"),
        );
        assert_eq!(
            errors.get(&Field::Item(0, ItemField::Description)),
            Some("Description is required"),
        );
        assert_eq!(
            errors.get(&Field::Item(0, ItemField::Quantity)),
            Some("Quantity must be greater than 0"),
        );
        assert_eq!(
            errors.get(&Field::Item(0, ItemField::UnitPrice)),
            Some("Unit price cannot be negative"),
        );
        assert_eq!(errors.to_keyed()[0].0, "quotation_number");
    }

    #[test]
    fn edit_clears_only_its_field_error() {
        let mut f = form();
        f.apply(Edit::Date(None));
        assert!(f.validate(Currency::Zar).is_err());
        assert!(f.errors().get(&Field::Date).is_some());
        assert!(f.errors().get(&Field::Client).is_some());

        f.apply(Edit::Client(Some(client::Id::new())));

        assert!(f.errors().get(&Field::Client).is_none());
        assert!(f.errors().get(&Field::Date).is_some());
        assert!(f
            .errors()
            .get(&Field::Item(0, ItemField::Description))
            .is_some());

        f.apply(Edit::Item(0, ItemEdit::Description("Logo".into())));
        assert!(f
            .errors()
            .get(&Field::Item(0, ItemField::Description))
            .is_none());
    }

    #[test]
    fn removing_item_keeps_at_least_one() {
        let mut f = form();
        f.apply(Edit::RemoveItem(0));
        assert_eq!(f.items().len(), 1);

        f.apply(Edit::AddItem);
        f.apply(Edit::Item(1, ItemEdit::Description("Second".into())));
        f.apply(Edit::RemoveItem(0));
        assert_eq!(f.items().len(), 1);
        assert_eq!(f.items()[0].description(), "Second");
    }

    #[test]
    fn produces_draft() {
        let mut f = form();
        let client = client::Id::new();
        let breakdown = Breakdown::calculate(
            Money {
                amount: decimal("2800"),
                currency: Currency::Zar,
            },
            Tier::Small,
        )
        .unwrap();
        f.apply(Edit::Client(Some(client)));
        f.apply(Edit::ReplaceItems(breakdown.line_items(None).to_vec()));
        f.apply(Edit::Discount(Percent::whole(10)));
        f.apply(Edit::Notes("  ".into()));

        let draft = f.validate(Currency::Zar).unwrap();

        assert_eq!(draft.number, None);
        assert_eq!(draft.client_id, client);
        assert_eq!(draft.items.len(), 6);
        assert_eq!(draft.notes, None);
        assert_eq!(
            draft.terms.as_ref().map(AsRef::<str>::as_ref),
            Some(Terms::DEFAULT),
        );
        assert_eq!(
            crate::domain::Totals::compute(
                &draft.items,
                draft.discount,
                Currency::Zar,
            )
            .unwrap()
            .total
            .amount,
            decimal("2520"),
        );
    }
}
