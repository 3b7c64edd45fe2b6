//! [`Quotation`]-related read definitions.

use derive_more::{Deref, From, Into};

#[cfg(doc)]
use crate::domain::{document::Scope, quotation::Number, Quotation};

/// Formatted [`Number`]s of the [`Quotation`]s stored in a [`Scope`].
#[derive(Clone, Debug, Default, Deref, Eq, From, Into, PartialEq)]
pub struct Numbers(pub Vec<String>);

pub mod list {
    //! [`Quotation`] list definitions.

    use crate::domain::{quotation, Quotation};

    /// Filter of a [`Quotation`] list.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Filter {
        /// [`quotation::Status`] the listed [`Quotation`]s must be in.
        pub status: Option<quotation::Status>,
    }

    impl Filter {
        /// Indicates whether the provided [`Quotation`] passes this
        /// [`Filter`].
        #[must_use]
        pub fn matches(&self, q: &Quotation) -> bool {
            self.status.map_or(true, |s| s == q.status)
        }
    }
}
