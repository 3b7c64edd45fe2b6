//! [`Query`] collection related to the multiple [`Invoice`]s.

use common::operations::By;

use crate::{domain::Invoice, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`Invoice`]s, the most recently issued first.
pub type List =
    DatabaseQuery<By<Vec<Invoice>, read::invoice::list::Filter>>;
