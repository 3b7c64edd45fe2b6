//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

pub mod constraint {
    //! Names of the uniqueness constraints guarding stored documents.

    /// Uniqueness of a quotation number.
    pub const QUOTATION_NUMBER: &str = "quotations_number_key";

    /// Uniqueness of an invoice number.
    pub const INVOICE_NUMBER: &str = "invoices_number_key";

    /// Single invoice per converted quotation.
    pub const INVOICE_QUOTATION: &str = "invoices_quotation_id_key";
}

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(any(test, feature = "memory"))]
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks if the error is a unique violation of the specified
    /// [`constraint`] (or of any one, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match *self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(ref e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unique_violation(constraint),
        }
    }
}
