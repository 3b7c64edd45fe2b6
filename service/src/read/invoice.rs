//! [`Invoice`]-related read definitions.

use derive_more::{Deref, From, Into};

#[cfg(doc)]
use crate::domain::{document::Scope, invoice::Number, Invoice};
use crate::domain::invoice::IssueDate;

/// Formatted [`Number`]s of the [`Invoice`]s stored in a [`Scope`].
#[derive(Clone, Debug, Default, Deref, Eq, From, Into, PartialEq)]
pub struct Numbers(pub Vec<String>);

/// Period [`Invoice`]s were issued in, both bounds being inclusive.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Issued {
    /// Earliest [`IssueDate`], if bounded.
    pub since: Option<IssueDate>,

    /// Latest [`IssueDate`], if bounded.
    pub until: Option<IssueDate>,
}

impl Issued {
    /// Indicates whether the provided [`IssueDate`] falls into this period.
    #[must_use]
    pub fn contains(&self, date: IssueDate) -> bool {
        self.since.map_or(true, |s| s <= date)
            && self.until.map_or(true, |u| date <= u)
    }
}

pub mod list {
    //! [`Invoice`] list definitions.

    use crate::domain::{client, invoice, Invoice};

    /// Filter of an [`Invoice`] list.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Filter {
        /// [`invoice::Status`] the listed [`Invoice`]s must be in.
        pub status: Option<invoice::Status>,

        /// [`client::Id`] the listed [`Invoice`]s must be billed to.
        pub client_id: Option<client::Id>,
    }

    impl Filter {
        /// Indicates whether the provided [`Invoice`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, i: &Invoice) -> bool {
            self.status.map_or(true, |s| s == i.status)
                && self.client_id.map_or(true, |c| c == i.client_id)
        }
    }
}
