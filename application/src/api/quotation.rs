//! [`Quotation`]-related definitions.

use std::{future, str::FromStr};

use common::{Date, DateTime, Handler as _, Percent};
use derive_more::{Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar,
};
use service::{command, domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// A quotation.
#[derive(Clone, Debug)]
pub struct Quotation {
    /// ID of this [`Quotation`].
    id: Id,

    /// Underlying [`domain::Quotation`].
    quotation: OnceCell<domain::Quotation>,
}

impl From<domain::Quotation> for Quotation {
    fn from(quotation: domain::Quotation) -> Self {
        Self {
            id: quotation.id.into(),
            quotation: OnceCell::new_with(Some(quotation)),
        }
    }
}

impl Quotation {
    /// Creates a new [`Quotation`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Quotation`] with the provided ID exists,
    /// otherwise accessing this [`Quotation`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            quotation: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Quotation`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Quotation`] doesn't exist.
    async fn quotation(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Quotation, Error> {
        let id = self.id.into();
        self.quotation
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::quotation::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|q| {
                        future::ready(q.ok_or_else(|| {
                            api::query::QuotationError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A quotation.
#[graphql_object(context = Context)]
impl Quotation {
    /// Unique identifier of this `Quotation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `DocumentNumber` of this `Quotation`, like `QUO-2025-001`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.number",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn number(&self, ctx: &Context) -> Result<api::Number, Error> {
        Ok(self.quotation(ctx).await?.number.clone().into())
    }

    /// ID of the client this `Quotation` is offered to.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.clientId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn client_id(
        &self,
        ctx: &Context,
    ) -> Result<api::ClientId, Error> {
        Ok(self.quotation(ctx).await?.client_id.into())
    }

    /// ID of the project this `Quotation` is for, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.projectId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn project_id(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::ProjectId>, Error> {
        Ok(self.quotation(ctx).await?.project_id.map(Into::into))
    }

    /// `Date` this `Quotation` was issued on.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.date",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.quotation(ctx).await?.date.coerce())
    }

    /// `Date` this `Quotation` is valid until.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.validUntil",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn valid_until(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.quotation(ctx).await?.valid_until.coerce())
    }

    /// `QuotationStatus` of this `Quotation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.quotation(ctx).await?.status.into())
    }

    /// `Currency` this `Quotation` is priced in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.currency",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn currency(
        &self,
        ctx: &Context,
    ) -> Result<api::Currency, Error> {
        Ok(self.quotation(ctx).await?.currency.into())
    }

    /// `LineItem`s of this `Quotation`, in their order.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.items",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn items(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::pricing::LineItem>, Error> {
        Ok(self
            .quotation(ctx)
            .await?
            .items
            .iter()
            .cloned()
            .map(Into::into)
            .collect())
    }

    /// Discount applied to the subtotal of this `Quotation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.discount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn discount(&self, ctx: &Context) -> Result<Percent, Error> {
        Ok(self.quotation(ctx).await?.discount)
    }

    /// `DocumentTotals` of this `Quotation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.totals",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn totals(
        &self,
        ctx: &Context,
    ) -> Result<api::pricing::Totals, Error> {
        self.quotation(ctx)
            .await?
            .totals()
            .map(Into::into)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Notes of this `Quotation`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.notes",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn notes(&self, ctx: &Context) -> Result<Option<String>, Error> {
        Ok(self.quotation(ctx).await?.notes.as_ref().map(ToString::to_string))
    }

    /// Terms this `Quotation` is offered on, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.terms",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn terms(&self, ctx: &Context) -> Result<Option<String>, Error> {
        Ok(self.quotation(ctx).await?.terms.as_ref().map(ToString::to_string))
    }

    /// `Invoice` this `Quotation` was converted into, if any.
    ///
    /// `null` if the `Quotation` is marked as converted, but its `Invoice` is
    /// missing.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.invoice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn invoice(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Invoice>, Error> {
        let Some(id) = self.quotation(ctx).await?.invoice_id else {
            return Ok(None);
        };
        ctx.service()
            .execute(query::invoice::ById::by(id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|i| i.map(Into::into))
    }

    /// `DateTime` when this `Quotation` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Quotation.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.quotation(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Quotation`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::quotation::Id)]
#[into(domain::quotation::Id)]
#[graphql(name = "QuotationId", transparent)]
pub struct Id(Uuid);

/// Status of a `Quotation`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "QuotationStatus")]
pub enum Status {
    /// `Quotation` is being prepared.
    Draft,

    /// `Quotation` was sent to the client.
    Sent,

    /// `Quotation` was accepted by the client.
    Accepted,

    /// `Quotation` was rejected by the client.
    Rejected,

    /// `Quotation` wasn't answered in time.
    Expired,
}

impl From<domain::quotation::Status> for Status {
    fn from(status: domain::quotation::Status) -> Self {
        use domain::quotation::Status as S;
        match status {
            S::Draft => Self::Draft,
            S::Sent => Self::Sent,
            S::Accepted => Self::Accepted,
            S::Rejected => Self::Rejected,
            S::Expired => Self::Expired,
        }
    }
}

impl From<Status> for domain::quotation::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Sent => Self::Sent,
            Status::Accepted => Self::Accepted,
            Status::Rejected => Self::Rejected,
            Status::Expired => Self::Expired,
        }
    }
}

/// Data of a new `Quotation`.
///
/// Omitted fields fall back to the defaults of a new `Quotation`: the next
/// free `DocumentNumber`, today's issue date, the configured validity and
/// the default terms.
#[derive(Clone, Debug, GraphQLInputObject)]
pub struct QuotationInput {
    /// Manually chosen `DocumentNumber`.
    pub number: Option<String>,

    /// ID of the client the `Quotation` is offered to.
    pub client_id: Option<api::ClientId>,

    /// ID of the project the `Quotation` is for.
    pub project_id: Option<api::ProjectId>,

    /// `Date` the `Quotation` is issued on.
    pub date: Option<Date>,

    /// `Date` the `Quotation` is valid until.
    pub valid_until: Option<Date>,

    /// `LineItem`s of the `Quotation`, at least one.
    pub items: Vec<api::pricing::LineItemInput>,

    /// Discount applied to the subtotal.
    pub discount: Option<Percent>,

    /// Notes of the `Quotation`.
    pub notes: Option<String>,

    /// Terms the `Quotation` is offered on.
    pub terms: Option<String>,
}

impl QuotationInput {
    /// Converts this [`QuotationInput`] into the [`Edit`]s of a new
    /// [`domain::Form`].
    ///
    /// [`Edit`]: domain::form::Edit
    pub(crate) fn into_edits(self) -> Vec<domain::form::Edit> {
        use domain::form::quotation::{Edit, ItemEdit};

        let Self {
            number,
            client_id,
            project_id,
            date,
            valid_until,
            items,
            discount,
            notes,
            terms,
        } = self;

        let mut edits = vec![
            Edit::Number(number.unwrap_or_default()),
            Edit::Client(client_id.map(Into::into)),
            Edit::Project(project_id.map(Into::into)),
        ];
        if let Some(date) = date {
            edits.push(Edit::Date(Some(date)));
        }
        if let Some(valid_until) = valid_until {
            edits.push(Edit::ValidUntil(Some(valid_until)));
        }
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                edits.push(Edit::AddItem);
            }
            edits.extend([
                Edit::Item(i, ItemEdit::Description(item.description)),
                Edit::Item(i, ItemEdit::Quantity(item.quantity.into())),
                Edit::Item(i, ItemEdit::UnitPrice(item.unit_price.into())),
            ]);
        }
        if let Some(discount) = discount {
            edits.push(Edit::Discount(discount));
        }
        if let Some(notes) = notes {
            edits.push(Edit::Notes(notes));
        }
        if let Some(terms) = terms {
            edits.push(Edit::Terms(terms));
        }
        edits.into_iter().map(Into::into).collect()
    }
}

/// Changes of an existing `Quotation`.
///
/// Omitted fields are left untouched. Blank `notes` or `terms` remove them.
#[derive(Clone, Debug, GraphQLInputObject)]
pub struct QuotationUpdateInput {
    /// `LineItem`s replacing all the ones of the `Quotation`.
    pub items: Option<Vec<api::pricing::LineItemInput>>,

    /// Discount applied to the subtotal.
    pub discount: Option<Percent>,

    /// `Date` the `Quotation` is valid until.
    pub valid_until: Option<Date>,

    /// Notes of the `Quotation`.
    pub notes: Option<String>,

    /// Terms the `Quotation` is offered on.
    pub terms: Option<String>,
}

impl QuotationUpdateInput {
    /// Converts this [`QuotationUpdateInput`] into a
    /// [`command::UpdateQuotation`] of the specified [`Quotation`].
    ///
    /// # Errors
    ///
    /// If any of the provided fields is malformed.
    pub(crate) fn into_command(
        self,
        id: Id,
    ) -> Result<command::UpdateQuotation, Error> {
        use command::update_quotation::Item;

        let Self {
            items,
            discount,
            valid_until,
            notes,
            terms,
        } = self;

        let items = items
            .map(|items| {
                items
                    .into_iter()
                    .map(|i| {
                        Ok(Item {
                            description: i
                                .description
                                .trim()
                                .parse()
                                .map_err(|_| invalid("description"))?,
                            quantity: i.quantity.into(),
                            unit_price: i.unit_price.into(),
                        })
                    })
                    .collect::<Result<Vec<_>, Error>>()
            })
            .transpose()?;
        let notes = notes
            .map(|n| optional(&n).map_err(|()| invalid("notes")))
            .transpose()?;
        let terms = terms
            .map(|t| optional(&t).map_err(|()| invalid("terms")))
            .transpose()?;

        Ok(command::UpdateQuotation {
            quotation_id: id.into(),
            items,
            discount,
            valid_until: valid_until.map(Date::coerce),
            notes,
            terms,
        })
    }
}

/// Parses the provided text, being [`None`] if it's blank.
fn optional<T: FromStr>(text: &str) -> Result<Option<T>, ()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(drop)
}

/// Creates an [`api::FormError::Invalid`] pointing at the provided `field`.
fn invalid(field: &str) -> Error {
    Error::from(api::FormError::Invalid).with_detail(field, "is invalid")
}

/// Result of converting a `Quotation` into an `Invoice`.
#[derive(Clone, Debug)]
pub struct Conversion {
    /// Draft [`api::Invoice`] the [`Quotation`] was converted into.
    invoice: api::Invoice,

    /// [`Quotation`] in its converted state.
    quotation: Quotation,
}

impl From<domain::quotation::Conversion> for Conversion {
    fn from(conversion: domain::quotation::Conversion) -> Self {
        Self {
            invoice: conversion.invoice.into(),
            quotation: conversion.quotation.into(),
        }
    }
}

/// Result of converting a `Quotation` into an `Invoice`.
#[graphql_object(name = "QuotationConversion", context = Context)]
impl Conversion {
    /// Draft `Invoice` the `Quotation` was converted into.
    #[must_use]
    pub fn invoice(&self) -> api::Invoice {
        self.invoice.clone()
    }

    /// `Quotation` in its converted state.
    #[must_use]
    pub fn quotation(&self) -> Quotation {
        self.quotation.clone()
    }
}
