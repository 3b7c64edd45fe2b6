//! Date and time utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{
    cmp::Ordering, fmt, marker::PhantomData, ops, str::FromStr,
    time::Duration,
};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{
    format_description::well_known::Rfc3339, macros::format_description,
    Month, UtcOffset,
};

/// Untyped date and time.
pub type DateTime = DateTimeOf;

/// UTC date and time.
#[derive(Debug)]
pub struct DateTimeOf<Of: ?Sized = ()> {
    /// Inner representation of the date and time.
    inner: time::OffsetDateTime,

    /// Type parameter describing the kind of date and time.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateTimeOf<Of> {
    /// Creates a new [`DateTime`] representing the current date and time.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn now() -> Self {
        let inner = time::OffsetDateTime::now_utc();
        Self {
            _of: PhantomData,
            inner: inner
                .replace_microsecond(inner.microsecond())
                .expect("infallible"),
        }
    }

    /// Creates a new [`DateTime`] from the provided [RFC 3339] string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid [RFC 3339] date and time.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub fn from_rfc3339(input: &str) -> Result<Self, ParseError> {
        use ParseError as E;

        time::OffsetDateTime::parse(input, &Rfc3339)
            .map_err(E::Parse)?
            .try_into()
            .map_err(E::ComponentRange)
    }

    /// Returns the [`DateTime`] as an [RFC 3339] string.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.inner.format(&Rfc3339).unwrap_or_else(|e| {
            panic!("cannot format `DateTime` as RFC 3339: {e}")
        })
    }

    /// Returns the UTC calendar [`Date`] of this [`DateTime`].
    #[must_use]
    pub fn date<NewOf: ?Sized>(&self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner.date(),
            _of: PhantomData,
        }
    }

    /// Coerces one kind of [`DateTime`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateTimeOf<NewOf> {
        DateTimeOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Error of parsing [`DateTime`] or [`Date`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// Failed to parse the string.
    Parse(time::error::Parse),

    /// Parsed value has an out of range component.
    ComponentRange(time::error::ComponentRange),
}

impl<Of: ?Sized> Copy for DateTimeOf<Of> {}
impl<Of: ?Sized> Clone for DateTimeOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateTimeOf<Of> {}
impl<Of: ?Sized> PartialEq for DateTimeOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateTimeOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateTimeOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> TryFrom<time::OffsetDateTime> for DateTimeOf<Of> {
    type Error = time::error::ComponentRange;

    fn try_from(dt: time::OffsetDateTime) -> Result<Self, Self::Error> {
        dt.to_offset(UtcOffset::UTC)
            .replace_microsecond(dt.microsecond())
            .map(|inner| Self {
                inner,
                _of: PhantomData,
            })
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::OffsetDateTime::from_sql(ty, raw)?
            .try_into()
            .map_err(Box::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

/// Untyped calendar date.
pub type Date = DateOf;

/// Calendar date without a time zone, written as `YYYY-MM-DD`.
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Returns the current UTC [`Date`].
    #[must_use]
    pub fn today() -> Self {
        DateTime::now().date()
    }

    /// Creates a new [`Date`] out of its calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_calendar(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        Some(Self {
            inner: time::Date::from_calendar_date(year, month, day).ok()?,
            _of: PhantomData,
        })
    }

    /// Returns the year of this [`Date`].
    #[must_use]
    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    /// Returns the month of this [`Date`], in `1..=12` range.
    #[must_use]
    pub fn month(&self) -> u8 {
        self.inner.month().into()
    }

    /// Returns the day of month of this [`Date`].
    #[must_use]
    pub fn day(&self) -> u8 {
        self.inner.day()
    }

    /// Shifts this [`Date`] by the provided number of calendar years.
    ///
    /// February 29th falls back to February 28th in non-leap years.
    /// [`None`] is returned if the resulting year is out of the supported
    /// range.
    #[must_use]
    pub fn add_years(self, years: i32) -> Option<Self> {
        let year = self.inner.year().checked_add(years)?;
        let inner = self
            .inner
            .replace_year(year)
            .or_else(|_| {
                time::Date::from_calendar_date(year, self.inner.month(), 28)
            })
            .ok()?;
        Some(Self {
            inner,
            _of: PhantomData,
        })
    }

    /// Returns the first day of the month this [`Date`] belongs to.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn first_of_month(self) -> Self {
        Self {
            inner: self.inner.replace_day(1).expect("infallible"),
            _of: PhantomData,
        }
    }

    /// Returns the first day of the month preceding the one this [`Date`]
    /// belongs to.
    ///
    /// [`None`] is returned if the resulting year is out of the supported
    /// range.
    #[must_use]
    pub fn previous_month(self) -> Option<Self> {
        let month = self.inner.month().previous();
        let year = if month == Month::December {
            self.inner.year().checked_sub(1)?
        } else {
            self.inner.year()
        };
        Some(Self {
            inner: time::Date::from_calendar_date(year, month, 1).ok()?,
            _of: PhantomData,
        })
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> ops::Add<Duration> for DateOf<Of> {
    type Output = Self;

    /// Adds the whole days of the provided [`Duration`].
    fn add(self, rhs: Duration) -> Self::Output {
        Self {
            inner: self.inner + rhs,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self
            .inner
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

#[cfg(feature = "serde")]
impl<Of: ?Sized> serde::Serialize for DateOf<Of> {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(Self::from)
            .map_err(ParseError::Parse)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Date and time in a [RFC 3339] format with a microsecond precision.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[graphql_scalar(with = Self, parse_token(String))]
    type DateTime = crate::DateTime;

    impl DateTime {
        fn to_output<S: ScalarValue>(dt: &DateTime) -> Value<S> {
            Value::scalar(dt.to_rfc3339())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `DateTime` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_rfc3339(s).map_err(|e| {
                        format!("Cannot parse `DateTime` input scalar: {e}")
                    })
                })
        }
    }

    /// Calendar date in a `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = crate::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    s.parse().map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::Date;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats_iso() {
        let d = date("2025-03-07");
        assert_eq!((d.year(), d.month(), d.day()), (2025, 3, 7));
        assert_eq!(d.to_string(), "2025-03-07");

        assert!("2025-3-7".parse::<Date>().is_err());
        assert!("2025-02-30".parse::<Date>().is_err());
        assert!("07/03/2025".parse::<Date>().is_err());
    }

    #[test]
    fn adds_whole_days() {
        let term = Duration::from_secs(30 * 24 * 60 * 60);
        assert_eq!(date("2025-01-15") + term, date("2025-02-14"));
        assert_eq!(date("2024-12-15") + term, date("2025-01-14"));
    }

    #[test]
    fn shifts_years() {
        assert_eq!(date("2025-06-01").add_years(1), Some(date("2026-06-01")));
        assert_eq!(date("2025-06-01").add_years(-1), Some(date("2024-06-01")));
        assert_eq!(date("2024-02-29").add_years(1), Some(date("2025-02-28")));
    }

    #[test]
    fn refuses_shifting_years_out_of_range() {
        assert_eq!(date("9999-12-31").add_years(1), None);
        assert_eq!(date("9999-02-28").add_years(i32::MAX), None);
    }

    #[test]
    fn walks_months() {
        assert_eq!(date("2025-03-17").first_of_month(), date("2025-03-01"));
        assert_eq!(
            date("2025-03-17").previous_month(),
            Some(date("2025-02-01")),
        );
        assert_eq!(
            date("2025-01-09").previous_month(),
            Some(date("2024-12-01")),
        );
    }
}
