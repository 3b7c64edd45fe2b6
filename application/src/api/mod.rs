//! GraphQL API definitions.

pub mod invoice;
mod mutation;
pub mod pricing;
mod query;
pub mod quotation;
pub mod report;
pub mod scalar;

use derive_more::{AsRef, Display, From, Into};
use juniper::{GraphQLEnum, GraphQLScalar};
use service::domain::{self, form, InvalidArgument};
use uuid::Uuid;

use crate::{define_error, AsError, Error};

pub use self::{
    invoice::Invoice, mutation::Mutation, query::Query, quotation::Quotation,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<
    'static,
    Query,
    Mutation,
    juniper::EmptySubscription<crate::Context>,
>;

/// Unique identifier of a client.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::client::Id)]
#[into(domain::client::Id)]
#[graphql(name = "ClientId", transparent)]
pub struct ClientId(Uuid);

/// Unique identifier of a project.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::project::Id)]
#[into(domain::project::Id)]
#[graphql(name = "ProjectId", transparent)]
pub struct ProjectId(Uuid);

/// Human-readable sequential number of a document, like `MZK-2025-014`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DocumentNumber",
    with = scalar::Textual::<domain::document::Number>,
)]
pub struct Number(domain::document::Number);

/// Currency of a `Money` amount.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum Currency {
    /// South African Rand.
    Zar,

    /// US Dollar.
    Usd,

    /// Euro.
    Eur,
}

impl From<common::Currency> for Currency {
    fn from(currency: common::Currency) -> Self {
        use common::Currency as C;
        match currency {
            C::Zar => Self::Zar,
            C::Usd => Self::Usd,
            C::Eur => Self::Eur,
        }
    }
}

impl From<Currency> for common::Currency {
    fn from(currency: Currency) -> Self {
        match currency {
            Currency::Zar => Self::Zar,
            Currency::Usd => Self::Usd,
            Currency::Eur => Self::Eur,
        }
    }
}

impl AsError for InvalidArgument {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new(
            "INVALID_ARGUMENT",
            http::StatusCode::BAD_REQUEST,
            self.to_string(),
        ))
    }
}

impl AsError for form::Mismatch {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

/// Converts the validation errors of the provided [`form::Form`] into an
/// [`Error`].
pub(crate) fn invalid_form(form: &form::Form) -> Error {
    form.errors()
        .into_iter()
        .fold(FormError::Invalid.into(), |err: Error, (field, message)| {
            err.with_detail(field, message)
        })
}

define_error! {
    enum FormError {
        #[code = "INVALID_FORM"]
        #[status = BAD_REQUEST]
        #[message = "Form has invalid fields:"]
        Invalid,
    }
}
