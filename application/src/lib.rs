//! Application provides API for interacting with the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::Path,
    response::{IntoResponse, Response},
    Extension, Json,
};
use common::Date;
use derive_more::Debug;
use juniper::{http::GraphQLBatchResponse, DefaultScalarValue, ScalarValue};
use juniper_axum::extract::JuniperRequest;
use service::{export::Csv, query, Query as _};
// Used in binary.
use axum_client_ip as _;
use refinery as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::Context,
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Postgres>;

/// [`juniper`] GraphQL response.
#[derive(Debug)]
pub struct JuniperResponse<S = DefaultScalarValue>
where
    S: ScalarValue,
{
    /// Status code of the response.
    pub status_code: http::StatusCode,

    /// Underlying GraphQL response.
    #[debug(skip)]
    pub response: GraphQLBatchResponse<S>,
}

impl<S> IntoResponse for JuniperResponse<S>
where
    S: ScalarValue,
{
    fn into_response(self) -> Response {
        let Self {
            status_code,
            response,
        } = self;

        if response.is_ok() {
            Json(response).into_response()
        } else {
            (status_code, Json(response)).into_response()
        }
    }
}

/// GraphQL API handler.
pub async fn graphql(
    Extension(schema): Extension<Arc<api::Schema>>,
    context: Context,
    JuniperRequest(gql_request): JuniperRequest,
) -> JuniperResponse {
    JuniperResponse {
        status_code: context.error_status_code(),
        response: gql_request.execute(&*schema, &context).await,
    }
}

/// CSV report download handler.
///
/// Serves `monthly-revenue.csv` and `client-revenue.csv` files as
/// attachments named after the current [`Date`].
#[tracing::instrument(skip_all, fields(file = %file))]
pub async fn report_csv(
    Extension(service): Extension<Service>,
    Path(file): Path<String>,
) -> Response {
    let csv = match file.as_str() {
        "monthly-revenue.csv" => service
            .execute(query::MonthlyRevenue::default())
            .await
            .map_err(AsError::into_error)
            .and_then(|rows| {
                Csv::encode("monthly-revenue", Date::today(), &rows)
                    .map_err(AsError::into_error)
            }),
        "client-revenue.csv" => service
            .execute(query::ClientRevenue)
            .await
            .map_err(AsError::into_error)
            .and_then(|rows| {
                Csv::encode("client-revenue", Date::today(), &rows)
                    .map_err(AsError::into_error)
            }),
        _ => return http::StatusCode::NOT_FOUND.into_response(),
    };

    match csv {
        Ok(Csv { filename, content }) => (
            [
                (http::header::CONTENT_TYPE, Csv::CONTENT_TYPE.to_owned()),
                (
                    http::header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            content,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to export `{file}`: {e}");
            (e.status_code, e.message).into_response()
        }
    }
}
