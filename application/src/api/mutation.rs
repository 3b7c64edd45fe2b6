//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{
    command,
    domain::{self, form},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Quotation` out of the provided `QuotationInput`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_FORM` - some fields of the `QuotationInput` are invalid;
    /// - `NUMBERING_CONFLICT` - the `DocumentNumber` is taken by another
    ///                          `Quotation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createQuotation",
            number = ?input.number,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_quotation(
        input: api::quotation::QuotationInput,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        let config = ctx.service().config();
        let today = Date::today();

        let form = domain::form::quotation::Form::new(
            today,
            config.terms.quotation_validity,
        );
        let form::Draft::Quotation(draft) =
            validate(form, input.into_edits(), ctx)?
        else {
            return Err(Error::internal(&"`Quotation` form drafted `Invoice`"));
        };

        ctx.service()
            .execute(command::CreateQuotation { draft })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the `QuotationStatus` of the specified `Quotation`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` with the specified ID does
    ///                            not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateQuotationStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_quotation_status(
        id: api::quotation::Id,
        status: api::quotation::Status,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        ctx.service()
            .execute(command::UpdateQuotationStatus {
                quotation_id: id.into(),
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Edits the specified `Quotation` with the provided
    /// `QuotationUpdateInput`, recomputing its `LineItem` amounts.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_FORM` - some fields of the `QuotationUpdateInput` are
    ///                    malformed;
    /// - `INVALID_ARGUMENT` - the edited `Quotation` is invalid;
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` with the specified ID does
    ///                            not exist;
    /// - `ALREADY_CONVERTED` - the `Quotation` is converted already, so
    ///                         cannot be edited.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateQuotation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_quotation(
        id: api::quotation::Id,
        input: api::quotation::QuotationUpdateInput,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        let cmd = input.into_command(id).map_err(ctx.error())?;

        ctx.service()
            .execute(cmd)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Invoice` out of the provided `InvoiceInput`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_FORM` - some fields of the `InvoiceInput` are invalid;
    /// - `NUMBERING_CONFLICT` - the `DocumentNumber` is taken by another
    ///                          `Invoice`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createInvoice",
            number = ?input.number,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_invoice(
        input: api::invoice::InvoiceInput,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        let config = ctx.service().config();
        let today = Date::today();

        let form =
            domain::form::invoice::Form::new(today, config.terms.payment_term);
        let form::Draft::Invoice(draft) =
            validate(form, input.into_edits(), ctx)?
        else {
            return Err(Error::internal(&"`Invoice` form drafted `Quotation`"));
        };

        ctx.service()
            .execute(command::CreateInvoice { draft })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the `InvoiceStatus` of the specified `Invoice`.
    ///
    /// Becoming `PAID` records today as the `paidDate` of the `Invoice`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateInvoiceStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_invoice_status(
        id: api::invoice::Id,
        status: api::invoice::Status,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        ctx.service()
            .execute(command::UpdateInvoiceStatus {
                invoice_id: id.into(),
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Converts the specified `Quotation` into a new draft `Invoice`,
    /// marking the `Quotation` as `ACCEPTED`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` with the specified ID does
    ///                            not exist;
    /// - `ALREADY_CONVERTED` - the `Quotation` is converted already;
    /// - `INCOMPLETE_CONVERSION` - the `Quotation` was converted partially,
    ///                             and should be completed instead;
    /// - `NUMBERING_CONFLICT` - no free `DocumentNumber` could be allocated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "convertQuotationToInvoice",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn convert_quotation_to_invoice(
        id: api::quotation::Id,
        ctx: &Context,
    ) -> Result<api::quotation::Conversion, Error> {
        ctx.service()
            .execute(command::ConvertQuotation {
                quotation_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Completes a partial conversion of the specified `Quotation`, by
    /// restoring its missing `Invoice` or its missing mark.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` with the specified ID does
    ///                            not exist;
    /// - `NOT_CONVERTED` - the `Quotation` was never converted;
    /// - `NOTHING_TO_COMPLETE` - the `Quotation` conversion is complete;
    /// - `NUMBERING_CONFLICT` - no free `DocumentNumber` could be allocated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "completeConversion",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn complete_conversion(
        id: api::quotation::Id,
        ctx: &Context,
    ) -> Result<api::quotation::Conversion, Error> {
        ctx.service()
            .execute(command::CompleteConversion {
                quotation_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Applies the provided [`form::Edit`]s to the provided [`domain::Form`] and
/// validates it.
///
/// # Errors
///
/// If any field of the [`domain::Form`] is invalid.
fn validate(
    form: impl Into<domain::Form>,
    edits: Vec<form::Edit>,
    ctx: &Context,
) -> Result<form::Draft, Error> {
    let mut form = form.into();
    for edit in edits {
        form.apply(edit)
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
    }
    form.validate(Date::today(), ctx.service().config().currency)
        .ok_or_else(|| api::invalid_form(&form))
        .map_err(ctx.error())
}

impl AsError for command::NumberingConflict {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new(
            "NUMBERING_CONFLICT",
            http::StatusCode::CONFLICT,
            self.to_string(),
        ))
    }
}

impl AsError for command::create_quotation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidArgument(e) => e.try_as_error(),
            Self::NumberingConflict(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::create_invoice::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NumberingConflict(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_quotation_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::QuotationNotExists(_) => {
                Some(api::query::QuotationError::NotExists.into())
            }
        }
    }
}

impl AsError for command::update_quotation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ALREADY_CONVERTED"]
                #[status = CONFLICT]
                #[message = "`Quotation` is converted into `Invoice` already, \
                             so cannot be edited"]
                AlreadyConverted,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::QuotationNotExists(_) => {
                Some(api::query::QuotationError::NotExists.into())
            }
            Self::AlreadyConverted(_) => Some(Error::AlreadyConverted.into()),
            Self::InvalidArgument(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_invoice_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvoiceNotExists(_) => {
                Some(api::query::InvoiceError::NotExists.into())
            }
        }
    }
}

impl AsError for command::convert_quotation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ALREADY_CONVERTED"]
                #[status = CONFLICT]
                #[message = "`Quotation` is converted into `Invoice` already"]
                AlreadyConverted,

                #[code = "INCOMPLETE_CONVERSION"]
                #[status = CONFLICT]
                #[message = "`Quotation` was converted partially, complete \
                             its conversion instead"]
                IncompleteConversion,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::QuotationNotExists(_) => {
                Some(api::query::QuotationError::NotExists.into())
            }
            Self::AlreadyConverted(_) => Some(Error::AlreadyConverted.into()),
            Self::IncompleteConversion { missing } => {
                let mut err = crate::Error::from(Error::IncompleteConversion);
                err.message.push_str(&format!(" (missing `{missing}`)"));
                Some(err)
            }
            Self::InvalidArgument(e) => e.try_as_error(),
            Self::NumberingConflict(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::complete_conversion::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOT_CONVERTED"]
                #[status = CONFLICT]
                #[message = "`Quotation` was never converted"]
                NotConverted,

                #[code = "NOTHING_TO_COMPLETE"]
                #[status = CONFLICT]
                #[message = "`Quotation` conversion is complete already"]
                NothingToComplete,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::QuotationNotExists(_) => {
                Some(api::query::QuotationError::NotExists.into())
            }
            Self::NotConverted(_) => Some(Error::NotConverted.into()),
            Self::NothingToComplete(_) => {
                Some(Error::NothingToComplete.into())
            }
            Self::InvalidArgument(e) => e.try_as_error(),
            Self::NumberingConflict(e) => e.try_as_error(),
        }
    }
}
