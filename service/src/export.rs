//! CSV export of report rows.

use std::string::FromUtf8Error;

use common::Date;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use derive_more::{Display, Error as StdError, From};
use serde::Serialize;
use tracerr::Traced;

/// CSV document ready to be downloaded as a file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Csv {
    /// Name of the file, including its `.csv` extension.
    pub filename: String,

    /// Encoded records, the header one going first.
    ///
    /// Records are separated by `\n`, without a trailing one.
    pub content: String,
}

impl Csv {
    /// MIME type of a [`Csv`] document.
    pub const CONTENT_TYPE: &'static str = "text/csv; charset=utf-8";

    /// Encodes the provided `rows` into a [`Csv`] file named after the
    /// provided `name` and `date` (like `monthly-revenue-2025-06-01.csv`).
    ///
    /// The header record consists of the field names of the `rows`. Fields
    /// containing a comma, a quote or a line break are quoted, with the inner
    /// quotes doubled. Absent values are encoded as empty fields.
    ///
    /// # Errors
    ///
    /// - [`Error::NoData`] if there are no `rows`.
    /// - [`Error::Csv`] if any of the `rows` cannot be serialized as a flat
    ///   record.
    pub fn encode<R: Serialize>(
        name: &str,
        date: Date,
        rows: &[R],
    ) -> Result<Self, Traced<Error>> {
        if rows.is_empty() {
            return Err(tracerr::new!(Error::NoData));
        }

        let mut w = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(vec![]);
        for row in rows {
            w.serialize(row).map_err(tracerr::from_and_wrap!(=> Error))?;
        }
        let bytes = w
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let mut content =
            String::from_utf8(bytes).map_err(tracerr::from_and_wrap!(=> Error))?;
        if content.ends_with('\n') {
            _ = content.pop();
        }

        Ok(Self {
            filename: format!("{name}-{date}.csv"),
            content,
        })
    }
}

/// Error of [`Csv`] encoding.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// There are no rows to export.
    #[display("No data to export")]
    NoData,

    /// Row cannot be encoded.
    #[display("CSV encoding failed: {_0}")]
    #[from]
    Csv(csv::Error),

    /// Encoded rows are not valid UTF-8.
    #[display("Encoded CSV is not UTF-8: {_0}")]
    #[from]
    Utf8(FromUtf8Error),
}

#[cfg(test)]
mod spec {
    use serde::Serialize;

    use super::{Csv, Error};

    #[derive(Serialize)]
    struct Row {
        client: &'static str,
        invoiced: &'static str,
        notes: Option<&'static str>,
    }

    fn encode(rows: &[Row]) -> Csv {
        Csv::encode("client-revenue", "2025-06-01".parse().unwrap(), rows)
            .unwrap()
    }

    #[test]
    fn names_file_after_report_and_date() {
        let csv = encode(&[Row {
            client: "Acme",
            invoiced: "1500.00",
            notes: None,
        }]);

        assert_eq!(csv.filename, "client-revenue-2025-06-01.csv");
        assert_eq!(csv.content, "client,invoiced,notes\nAcme,1500.00,");
    }

    #[test]
    fn quotes_special_fields() {
        let csv = encode(&[
            Row {
                client: "Smith, Jones & Co",
                invoiced: "10.00",
                notes: Some("said \"urgent\""),
            },
            Row {
                client: "Plain",
                invoiced: "20.00",
                notes: Some("two\nlines"),
            },
        ]);

        assert_eq!(
            csv.content,
            "client,invoiced,notes\n\
             \"Smith, Jones & Co\",10.00,\"said \"\"urgent\"\"\"\n\
             Plain,20.00,\"two\nlines\"",
        );
    }

    #[test]
    fn refuses_empty_export() {
        let err = Csv::encode::<Row>("x", "2025-06-01".parse().unwrap(), &[])
            .unwrap_err();

        assert!(matches!(err.as_ref(), Error::NoData));
        assert_eq!(err.as_ref().to_string(), "No data to export");
    }
}
