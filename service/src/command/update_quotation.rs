//! [`Command`] for editing a [`Quotation`].

use common::{
    operations::{By, Commit, Select, Transact, Transacted, Update},
    Money, Percent,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        document::Notes, invoice, line_item, quotation, InvalidArgument,
        LineItem, Quotation,
    },
    infra::{database, Database},
    Service,
};

use super::{update, Command};

/// [`Command`] for editing a [`Quotation`] which is not converted yet.
///
/// Omitted fields are left untouched. Provided [`Item`]s replace all the
/// [`LineItem`]s of the [`Quotation`], priced in its [`Currency`].
///
/// [`Currency`]: common::Currency
#[derive(Clone, Debug, Default)]
pub struct UpdateQuotation {
    /// ID of the [`Quotation`] to edit.
    pub quotation_id: quotation::Id,

    /// New [`LineItem`]s of the [`Quotation`], in their display order.
    pub items: Option<Vec<Item>>,

    /// New discount of the [`Quotation`].
    pub discount: Option<Percent>,

    /// New date the [`Quotation`] is valid until.
    pub valid_until: Option<quotation::ExpirationDate>,

    /// New [`Notes`] of the [`Quotation`], [`None`] inside removing them.
    pub notes: Option<Option<Notes>>,

    /// New [`quotation::Terms`], [`None`] inside removing them.
    pub terms: Option<Option<quotation::Terms>>,
}

/// Unpriced [`LineItem`] of an [`UpdateQuotation`].
#[derive(Clone, Debug)]
pub struct Item {
    /// [`line_item::Description`] of the [`LineItem`].
    pub description: line_item::Description,

    /// Quantity of the [`LineItem`].
    pub quantity: Decimal,

    /// Unit price of the [`LineItem`].
    pub unit_price: Decimal,
}

impl<Db> Command<UpdateQuotation> for Service<Db>
where
    Db: Database<
            Select<By<Option<Quotation>, quotation::Id>>,
            Ok = Option<Quotation>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Update<Quotation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Quotation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateQuotation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateQuotation {
            quotation_id,
            items,
            discount,
            valid_until,
            notes,
            terms,
        } = cmd;

        let mut quotation = self
            .database()
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::QuotationNotExists(quotation_id)))?;
        if let Some(id) = quotation.invoice_id {
            return Err(tracerr::new!(E::AlreadyConverted(id)));
        }

        if let Some(items) = items {
            let currency = quotation.currency;
            quotation.items = items
                .into_iter()
                .map(|i| {
                    LineItem::new(
                        i.description,
                        i.quantity,
                        Money {
                            amount: i.unit_price,
                            currency,
                        },
                    )
                })
                .collect::<Result<_, _>>()
                .map_err(|e| tracerr::new!(E::InvalidArgument(e)))?;
        }
        if let Some(discount) = discount {
            quotation.discount = discount;
        }
        if let Some(valid_until) = valid_until {
            if valid_until < quotation.date.coerce() {
                return Err(tracerr::new!(E::InvalidArgument(
                    InvalidArgument::ExpiresBeforeIssue
                )));
            }
            quotation.valid_until = valid_until;
        }
        if let Some(notes) = notes {
            quotation.notes = notes;
        }
        if let Some(terms) = terms {
            quotation.terms = terms;
        }
        _ = quotation
            .totals()
            .map_err(|e| tracerr::new!(E::InvalidArgument(e)))?;

        update(self.database(), quotation.clone())
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        log::debug!(number = %quotation.number, "edited quotation");

        Ok(quotation)
    }
}

/// Error of [`UpdateQuotation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Quotation`] with the provided ID doesn't exist.
    #[display("`Quotation(id: {_0})` doesn't exist")]
    QuotationNotExists(#[error(not(source))] quotation::Id),

    /// [`Quotation`] is converted into the [`Invoice`] with the provided ID,
    /// so cannot be edited.
    ///
    /// [`Invoice`]: crate::domain::Invoice
    #[display("`Quotation` is converted into `Invoice(id: {_0})` already")]
    AlreadyConverted(#[error(not(source))] invoice::Id),

    /// Edited [`Quotation`] is invalid.
    #[display("Invalid `Quotation`: {_0}")]
    InvalidArgument(InvalidArgument),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Percent,
    };
    use rust_decimal::Decimal;

    use crate::{
        command::{
            spec::{quotation_draft, service},
            ConvertQuotation, CreateQuotation,
        },
        domain::{InvalidArgument, Quotation},
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError, Item, UpdateQuotation};

    fn item(description: &str, quantity: &str, unit_price: &str) -> Item {
        Item {
            description: description.parse().unwrap(),
            quantity: quantity.parse().unwrap(),
            unit_price: unit_price.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn replaces_items_and_recomputes_amounts() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        let updated = svc
            .execute(UpdateQuotation {
                quotation_id: q.id,
                items: Some(vec![
                    item("Design", "2", "450.50"),
                    item("SSL", "1", "120"),
                ]),
                discount: Some(Percent::whole(10)),
                ..UpdateQuotation::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.items.len(), 2);
        assert_eq!(updated.items[0].amount().amount, Decimal::new(90_100, 2));
        assert_eq!(updated.items[0].amount().currency, q.currency);
        let totals = updated.totals().unwrap();
        assert_eq!(totals.subtotal.amount, Decimal::new(102_100, 2));
        assert_eq!(totals.total.amount, Decimal::new(91_890, 2));
        assert_eq!(updated.number, q.number);

        let stored = svc
            .database()
            .execute(Select(By::<Option<Quotation>, _>::new(q.id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(updated));
    }

    #[tokio::test]
    async fn keeps_omitted_fields() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        let updated = svc
            .execute(UpdateQuotation {
                quotation_id: q.id,
                notes: Some("Includes a year of hosting".parse().ok()),
                ..UpdateQuotation::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.items, q.items);
        assert_eq!(updated.discount, q.discount);
        assert!(updated.notes.is_some());
    }

    #[tokio::test]
    async fn refuses_invalid_items() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        let err = svc
            .execute(UpdateQuotation {
                quotation_id: q.id,
                items: Some(vec![item("Design", "0", "450")]),
                ..UpdateQuotation::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidArgument(
                InvalidArgument::NonPositiveQuantity,
            ),
        ));
        let stored = svc
            .database()
            .execute(Select(By::<Option<Quotation>, _>::new(q.id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(q));
    }

    #[tokio::test]
    async fn refuses_expiring_before_issue() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        let err = svc
            .execute(UpdateQuotation {
                quotation_id: q.id,
                valid_until: q.date.coerce::<()>().previous_month().map(
                    |d| d.coerce(),
                ),
                ..UpdateQuotation::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidArgument(
                InvalidArgument::ExpiresBeforeIssue,
            ),
        ));
    }

    #[tokio::test]
    async fn refuses_editing_converted() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();
        let c = svc
            .execute(ConvertQuotation { quotation_id: q.id })
            .await
            .unwrap();

        let err = svc
            .execute(UpdateQuotation {
                quotation_id: q.id,
                discount: Some(Percent::whole(50)),
                ..UpdateQuotation::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::AlreadyConverted(id) if *id == c.invoice.id,
        ));
    }
}
