//! Service contains the pricing, numbering and totals engine of quotations
//! and invoices, along with the commands and queries storing and reading
//! them.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
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

pub mod command;
pub mod domain;
pub mod export;
pub mod infra;
pub mod query;
pub mod read;

use std::time::Duration;

use common::Currency;
use smart_default::SmartDefault;

use crate::domain::document::Prefix;
#[cfg(doc)]
use crate::{
    domain::{document::Number, Invoice, Quotation},
    infra::Database,
};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Document [`Numbering`] configuration.
    pub numbering: Numbering,

    /// Business [`Terms`] of the issued documents.
    pub terms: Terms,

    /// [`Currency`] new documents are priced in.
    pub currency: Currency,
}

/// Document [`Number`]s allocation configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Numbering {
    /// [`Prefix`] of [`Invoice`] [`Number`]s.
    #[default(Prefix::new("MZK").expect("valid `Prefix`"))]
    pub invoice_prefix: Prefix,

    /// [`Prefix`] of [`Quotation`] [`Number`]s.
    #[default(Prefix::new("QUO").expect("valid `Prefix`"))]
    pub quotation_prefix: Prefix,

    /// Maximum number of attempts to store a document under an automatically
    /// allocated [`Number`], before giving up on a conflict.
    #[default(2)]
    pub max_attempts: u8,
}

/// Business terms of the issued documents.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Terms {
    /// Period an [`Invoice`] should be paid within.
    #[default(Duration::from_secs(30 * 24 * 60 * 60))]
    pub payment_term: Duration,

    /// Period a [`Quotation`] stays valid for.
    #[default(Duration::from_secs(30 * 24 * 60 * 60))]
    pub quotation_validity: Duration,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db) -> Self {
        Self { config, database }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}
