//! Typed [`Form`]s drafting new documents.
//!
//! A [`Form`] is edited one field at a time through [`Form::apply()`]. Each
//! [`Edit`] clears the validation error of the field it touches, and line
//! item edits recompute the item amount right away. [`Form::validate()`]
//! either produces a [`Draft`] ready to be created, or records the errors of
//! every invalid field.

pub mod invoice;
pub mod quotation;

use std::{collections::BTreeMap, fmt};

use common::{define_kind, Currency, Date};
use derive_more::{Display, Error, From};

use crate::domain;

/// Draft of a new document being edited.
#[derive(Clone, Debug, From)]
pub enum Form {
    #[doc(hidden)]
    Quotation(quotation::Form),
    #[doc(hidden)]
    Invoice(invoice::Form),
}

/// Single edit of a [`Form`].
#[derive(Clone, Debug, From)]
pub enum Edit {
    #[doc(hidden)]
    Quotation(quotation::Edit),
    #[doc(hidden)]
    Invoice(invoice::Edit),
}

/// Valid data of a new document, produced by [`Form::validate()`].
#[derive(Clone, Debug, From)]
pub enum Draft {
    #[doc(hidden)]
    Quotation(domain::quotation::Draft),
    #[doc(hidden)]
    Invoice(domain::invoice::Draft),
}

define_kind! {
    #[doc = "Kind of a document [`Form`]."]
    #[serialize_all = "snake_case"]
    enum Kind {
        #[doc = "Quotation form."]
        Quotation = 1,

        #[doc = "Invoice form."]
        Invoice = 2,
    }
}

/// [`Edit`] of one [`Kind`] applied to a [`Form`] of another.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("`{edit}` edit cannot be applied to `{form}` form")]
pub struct Mismatch {
    /// [`Kind`] of the edited [`Form`].
    pub form: Kind,

    /// [`Kind`] of the rejected [`Edit`].
    pub edit: Kind,
}

impl Form {
    /// Returns [`Kind`] of this [`Form`].
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Quotation(_) => Kind::Quotation,
            Self::Invoice(_) => Kind::Invoice,
        }
    }

    /// Applies the provided [`Edit`] to this [`Form`].
    ///
    /// # Errors
    ///
    /// If the [`Edit`] targets a [`Form`] of another [`Kind`]. This [`Form`]
    /// is left untouched then.
    pub fn apply(&mut self, edit: Edit) -> Result<(), Mismatch> {
        match (self, edit) {
            (Self::Quotation(f), Edit::Quotation(e)) => f.apply(e),
            (Self::Invoice(f), Edit::Invoice(e)) => f.apply(e),
            (form @ Self::Quotation(_), edit @ Edit::Invoice(_))
            | (form @ Self::Invoice(_), edit @ Edit::Quotation(_)) => {
                return Err(Mismatch {
                    form: form.kind(),
                    edit: edit.kind(),
                });
            }
        }
        Ok(())
    }

    /// Validates this [`Form`], producing a [`Draft`] if every field is
    /// valid, or recording the errors otherwise.
    ///
    /// Amounts are priced in the provided [`Currency`], and dates are checked
    /// against the provided `today`.
    pub fn validate(
        &mut self,
        today: Date,
        currency: Currency,
    ) -> Option<Draft> {
        match self {
            Self::Quotation(f) => f.validate(currency).ok().map(Draft::from),
            Self::Invoice(f) => {
                f.validate(today, currency).ok().map(Draft::from)
            }
        }
    }

    /// Returns the recorded validation errors of this [`Form`], keyed by the
    /// invalid field.
    #[must_use]
    pub fn errors(&self) -> Vec<(String, &'static str)> {
        match self {
            Self::Quotation(f) => f.errors().to_keyed(),
            Self::Invoice(f) => f.errors().to_keyed(),
        }
    }
}

impl Edit {
    /// Returns [`Kind`] of the [`Form`] this [`Edit`] targets.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Quotation(_) => Kind::Quotation,
            Self::Invoice(_) => Kind::Invoice,
        }
    }
}

/// Validation errors of a [`Form`], keyed by its fields `F`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Errors<F>(BTreeMap<F, &'static str>);

impl<F> Default for Errors<F> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<F: Ord> Errors<F> {
    /// Returns the error message of the provided field, if any.
    #[must_use]
    pub fn get(&self, field: &F) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    /// Indicates whether no errors are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of the recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the recorded errors, in the field order.
    pub fn iter(&self) -> impl Iterator<Item = (&F, &'static str)> {
        self.0.iter().map(|(f, m)| (f, *m))
    }

    /// Records the error `message` of the provided `field`, replacing the
    /// previous one.
    fn set(&mut self, field: F, message: &'static str) {
        _ = self.0.insert(field, message);
    }

    /// Clears the error of the provided `field`.
    fn clear(&mut self, field: &F) {
        _ = self.0.remove(field);
    }

    /// Keeps only the errors of the fields satisfying the predicate.
    fn retain(&mut self, mut keep: impl FnMut(&F) -> bool) {
        self.0.retain(|f, _| keep(f));
    }

    /// Clears all the recorded errors.
    fn reset(&mut self) {
        self.0.clear();
    }
}

impl<F: fmt::Display + Ord> Errors<F> {
    /// Lists the recorded errors keyed by the [`Display`]ed fields.
    ///
    /// [`Display`]: fmt::Display
    #[must_use]
    pub fn to_keyed(&self) -> Vec<(String, &'static str)> {
        self.iter().map(|(f, m)| (f.to_string(), m)).collect()
    }
}

/// Message of a missing required field.
const REQUIRED: &str = "This field is required";

/// Validates an optional free-form `text`, recording its error.
///
/// Blank texts are omitted.
fn optional_text<F: Ord, T>(
    text: &str,
    errors: &mut Errors<F>,
    parse: impl FnOnce(&str) -> Result<T, (F, &'static str)>,
) -> Option<T> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse(text)
        .map_err(|(field, message)| errors.set(field, message))
        .ok()
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{Currency, Date};

    use super::{invoice, quotation, Edit, Form, Kind, Mismatch};

    const THIRTY_DAYS: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    fn today() -> Date {
        "2025-06-01".parse().unwrap()
    }

    #[test]
    fn refuses_edits_of_another_kind() {
        let mut form =
            Form::from(quotation::Form::new(today(), THIRTY_DAYS));

        let res = form.apply(Edit::from(invoice::Edit::Description(
            "Website".into(),
        )));

        assert_eq!(
            res,
            Err(Mismatch {
                form: Kind::Quotation,
                edit: Kind::Invoice,
            }),
        );
    }

    #[test]
    fn reports_keyed_errors() {
        let mut form = Form::from(invoice::Form::new(today(), THIRTY_DAYS));

        assert!(form.validate(today(), Currency::Zar).is_none());
        let errors = form.errors();
        assert!(errors.contains(&("client_id".into(), super::REQUIRED)));
        assert!(errors.contains(&(
            "amount".into(),
            "Amount must be greater than 0",
        )));

        form.apply(Edit::from(invoice::Edit::Amount(Some(
            "10".parse().unwrap(),
        ))))
        .unwrap();
        assert!(!form.errors().iter().any(|(k, _)| k == "amount"));
    }
}
