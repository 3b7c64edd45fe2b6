//! [`Invoice`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _, Money};
use derive_more::{Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar,
};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// An invoice.
#[derive(Clone, Debug)]
pub struct Invoice {
    /// ID of this [`Invoice`].
    id: Id,

    /// Underlying [`domain::Invoice`].
    invoice: OnceCell<domain::Invoice>,
}

impl From<domain::Invoice> for Invoice {
    fn from(invoice: domain::Invoice) -> Self {
        Self {
            id: invoice.id.into(),
            invoice: OnceCell::new_with(Some(invoice)),
        }
    }
}

impl Invoice {
    /// Returns the underlying [`domain::Invoice`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Invoice`] doesn't exist.
    async fn invoice(&self, ctx: &Context) -> Result<&domain::Invoice, Error> {
        let id = self.id.into();
        self.invoice
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::invoice::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|i| {
                        future::ready(i.ok_or_else(|| {
                            api::query::InvoiceError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// An invoice.
#[graphql_object(context = Context)]
impl Invoice {
    /// Unique identifier of this `Invoice`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `DocumentNumber` of this `Invoice`, like `MZK-2025-014`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.number",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn number(&self, ctx: &Context) -> Result<api::Number, Error> {
        Ok(self.invoice(ctx).await?.number.clone().into())
    }

    /// ID of the client this `Invoice` is issued to.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.clientId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn client_id(
        &self,
        ctx: &Context,
    ) -> Result<api::ClientId, Error> {
        Ok(self.invoice(ctx).await?.client_id.into())
    }

    /// ID of the project this `Invoice` is for, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.projectId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn project_id(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::ProjectId>, Error> {
        Ok(self.invoice(ctx).await?.project_id.map(Into::into))
    }

    /// `Quotation` this `Invoice` was converted from, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.quotation",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn quotation(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Quotation>, Error> {
        Ok(self.invoice(ctx).await?.quotation_id.map(|id| {
            #[expect(
                unsafe_code,
                reason = "`Quotation`s are never removed once converted"
            )]
            unsafe {
                api::Quotation::new_unchecked(id)
            }
        }))
    }

    /// Amount due by this `Invoice`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.amount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn amount(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.invoice(ctx).await?.amount)
    }

    /// `Date` this `Invoice` was issued on.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.date",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.invoice(ctx).await?.date.coerce())
    }

    /// `Date` this `Invoice` should be paid by.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.dueDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn due_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.invoice(ctx).await?.due_date.coerce())
    }

    /// `Date` this `Invoice` was paid on, if it's `PAID`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.paidDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn paid_date(
        &self,
        ctx: &Context,
    ) -> Result<Option<Date>, Error> {
        Ok(self.invoice(ctx).await?.paid_date.map(|d| d.coerce()))
    }

    /// `InvoiceStatus` of this `Invoice`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.invoice(ctx).await?.status.into())
    }

    /// Indicator whether this `Invoice` is past its `dueDate` and still
    /// unpaid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.isOverdue",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_overdue(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.invoice(ctx).await?.is_overdue(Date::today()))
    }

    /// Description of what this `Invoice` is for.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.description",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn description(&self, ctx: &Context) -> Result<String, Error> {
        Ok(self.invoice(ctx).await?.description.to_string())
    }

    /// Notes of this `Invoice`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.notes",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn notes(&self, ctx: &Context) -> Result<Option<String>, Error> {
        Ok(self.invoice(ctx).await?.notes.as_ref().map(ToString::to_string))
    }

    /// `DateTime` when this `Invoice` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Invoice.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.invoice(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of an `Invoice`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::invoice::Id)]
#[into(domain::invoice::Id)]
#[graphql(name = "InvoiceId", transparent)]
pub struct Id(Uuid);

/// Status of an `Invoice`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "InvoiceStatus")]
pub enum Status {
    /// `Invoice` is being prepared.
    Draft,

    /// `Invoice` was sent to the client.
    Sent,

    /// `Invoice` was paid.
    Paid,

    /// `Invoice` wasn't paid in time.
    Overdue,
}

impl From<domain::invoice::Status> for Status {
    fn from(status: domain::invoice::Status) -> Self {
        use domain::invoice::Status as S;
        match status {
            S::Draft => Self::Draft,
            S::Sent => Self::Sent,
            S::Paid => Self::Paid,
            S::Overdue => Self::Overdue,
        }
    }
}

impl From<Status> for domain::invoice::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Sent => Self::Sent,
            Status::Paid => Self::Paid,
            Status::Overdue => Self::Overdue,
        }
    }
}

/// Data of a new `Invoice`.
///
/// Omitted fields fall back to the defaults of a new `Invoice`: the next
/// free `DocumentNumber`, today's issue date, the configured payment term
/// and the `DRAFT` status.
#[derive(Clone, Debug, GraphQLInputObject)]
pub struct InvoiceInput {
    /// Manually chosen `DocumentNumber`.
    pub number: Option<String>,

    /// ID of the client the `Invoice` is issued to.
    pub client_id: Option<api::ClientId>,

    /// ID of the project the `Invoice` is for.
    pub project_id: Option<api::ProjectId>,

    /// Positive amount due by the `Invoice`.
    pub amount: Option<scalar::Decimal>,

    /// `Date` the `Invoice` is issued on.
    pub date: Option<Date>,

    /// `Date` the `Invoice` should be paid by.
    pub due_date: Option<Date>,

    /// `InvoiceStatus` of the `Invoice`.
    pub status: Option<Status>,

    /// Description of what the `Invoice` is for.
    pub description: String,

    /// Notes of the `Invoice`.
    pub notes: Option<String>,
}

impl InvoiceInput {
    /// Converts this [`InvoiceInput`] into the [`Edit`]s of a new
    /// [`domain::Form`].
    ///
    /// [`Edit`]: domain::form::Edit
    pub(crate) fn into_edits(self) -> Vec<domain::form::Edit> {
        use domain::form::invoice::Edit;

        let Self {
            number,
            client_id,
            project_id,
            amount,
            date,
            due_date,
            status,
            description,
            notes,
        } = self;

        let mut edits = vec![
            Edit::Number(number.unwrap_or_default()),
            Edit::Client(client_id.map(Into::into)),
            Edit::Project(project_id.map(Into::into)),
            Edit::Amount(amount.map(Into::into)),
            Edit::Description(description),
        ];
        if let Some(date) = date {
            edits.push(Edit::Date(Some(date)));
        }
        if let Some(due_date) = due_date {
            edits.push(Edit::DueDate(Some(due_date)));
        }
        if let Some(status) = status {
            edits.push(Edit::Status(status.into()));
        }
        if let Some(notes) = notes {
            edits.push(Edit::Notes(notes));
        }
        edits.into_iter().map(Into::into).collect()
    }
}
