//! [`Query`] collection related to a single [`Invoice`].

use common::operations::By;

use crate::domain::{invoice, quotation, Invoice};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Invoice`] by its [`invoice::Id`].
pub type ById = DatabaseQuery<By<Option<Invoice>, invoice::Id>>;

/// Queries an [`Invoice`] by the [`quotation::Id`] it was converted from.
pub type ByQuotationId = DatabaseQuery<By<Option<Invoice>, quotation::Id>>;
