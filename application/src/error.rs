//! API [`Error`] definitions.

use std::fmt;

use derive_more::Error as StdError;
use juniper::IntoFieldError;
use service::{export, infra::database};
use tracerr::{Trace, Traced};

/// Defines a new enum of API errors, each variant with its own [`Code`],
/// HTTP status and message.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// API error kind.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                let (code, status_code) = match err {
                    $( $name::$variant => (
                        $code,
                        ::http::StatusCode::$status_code,
                    ), )*
                };
                Self::new(code, status_code, err.to_string())
            }
        }
    };
}

/// Error returned by the GraphQL API and the report downloads.
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Code`] identifying the kind of this [`Error`].
    pub code: Code,

    /// [`http::StatusCode`] the response is given.
    pub status_code: http::StatusCode,

    /// [`Trace`] of the operation failed with this [`Error`], if any.
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// Human-readable message.
    pub message: String,
}

impl Error {
    /// Creates a new [`Error`] without a [`Trace`].
    #[must_use]
    pub fn new(
        code: Code,
        status_code: http::StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            status_code,
            backtrace: None,
            message: message.into(),
        }
    }

    /// Creates a new [`Error`] of an unexpected failure, like a lost
    /// [`Postgres`] connection.
    ///
    /// [`Postgres`]: service::infra::Postgres
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self::new(
            "INTERNAL_SERVER_ERROR",
            http::StatusCode::INTERNAL_SERVER_ERROR,
            msg.to_string(),
        )
    }

    /// Appends a detail about the provided `subject` (a form field, usually)
    /// to the message of this [`Error`].
    #[must_use]
    pub fn with_detail(
        mut self,
        subject: impl fmt::Display,
        detail: impl fmt::Display,
    ) -> Self {
        self.message.push_str(&format!("\n- `{subject}`: {detail}"));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.code, self.message)?;
        if let Some(trace) = &self.backtrace {
            write!(f, "\n{trace}")?;
        }
        Ok(())
    }
}

impl<S> IntoFieldError<S> for Error
where
    S: From<String>,
{
    fn into_field_error(self) -> juniper::FieldError<S> {
        let Self {
            code,
            status_code,
            backtrace,
            message,
        } = self;

        let mut ext = juniper::Object::with_capacity(3);
        for (name, value) in [
            ("code", juniper::Value::scalar(code.to_owned())),
            ("status", juniper::Value::scalar(status_code.to_string())),
            (
                "backtrace",
                juniper::Value::list(
                    backtrace
                        .iter()
                        .flat_map(|trace| trace.iter())
                        .map(|frame| juniper::Value::scalar(frame.to_string()))
                        .collect(),
                ),
            ),
        ] {
            drop(ext.add_field(name, value));
        }
        juniper::FieldError::new(message, juniper::Value::object(ext))
    }
}

/// Code of an [`Error`], like `QUOTATION_NOT_EXISTS`.
pub type Code = &'static str;

/// Conversion of a failure into an API [`Error`].
pub trait AsError {
    /// Tries to convert the failure into an [`Error`].
    ///
    /// [`None`] is returned for failures clients cannot act on, which are
    /// reported as internal ones.
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the failure into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the failure into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "DOCUMENT_CONFLICT"]
                #[status = CONFLICT]
                #[message = "Document was concurrently stored by another \
                             request, retry the operation"]
                Conflict,
            }
        }

        self.is_unique_violation(None)
            .then(|| Error::Conflict.into())
    }
}

impl AsError for export::Error {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NO_DATA"]
                #[status = NOT_FOUND]
                #[message = "No data to export"]
                NoData,
            }
        }

        match self {
            Self::NoData => Some(Error::NoData.into()),
            Self::Csv(_) | Self::Utf8(_) => None,
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Error;

    #[test]
    fn appends_details() {
        let err = Error::new(
            "INVALID_FORM",
            http::StatusCode::BAD_REQUEST,
            "Form has invalid fields:",
        )
        .with_detail("date", "is required")
        .with_detail("items[0].quantity", "must be greater than 0");

        assert_eq!(
            err.to_string(),
            "[INVALID_FORM]: Form has invalid fields:\n\
             - `date`: is required\n\
             - `items[0].quantity`: must be greater than 0",
        );
    }
}
