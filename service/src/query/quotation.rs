//! [`Query`] collection related to a single [`Quotation`].

use common::operations::By;

use crate::domain::{quotation, Quotation};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Quotation`] by its [`quotation::Id`].
pub type ById = DatabaseQuery<By<Option<Quotation>, quotation::Id>>;
