//! Definitions shared by quotations and invoices.

use std::{fmt, str::FromStr, sync::LazyLock};

#[cfg(feature = "postgres")]
use std::error::Error as StdError;

use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use regex::Regex;
use serde::Deserialize;

/// Prefix of a document [`Number`], like `MZK` or `QUO`.
///
/// Consists of 1 to 10 ASCII uppercase letters or digits.
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[serde(try_from = "String")]
pub struct Prefix(String);

impl Prefix {
    /// Creates a new [`Prefix`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `prefix` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// Creates a new [`Prefix`] if the given `prefix` is valid.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Option<Self> {
        let prefix = prefix.into();
        Self::check(&prefix).then_some(Self(prefix))
    }

    /// Checks whether the given `prefix` is a valid [`Prefix`].
    fn check(prefix: impl AsRef<str>) -> bool {
        let prefix = prefix.as_ref();
        (1..=10).contains(&prefix.len())
            && prefix
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    }
}

impl FromStr for Prefix {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Prefix`")
    }
}

impl TryFrom<String> for Prefix {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or("invalid `Prefix`")
    }
}

/// Scope document [`Number`]s are sequenced in: a [`Prefix`] and a year.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Scope {
    /// [`Prefix`] of this [`Scope`].
    pub prefix: Prefix,

    /// Year of this [`Scope`].
    pub year: i32,
}

impl Scope {
    /// Returns the sequence of the provided formatted `number`, if it
    /// belongs to this [`Scope`].
    ///
    /// Numbers of other [`Scope`]s and non-numeric sequences give [`None`].
    #[must_use]
    pub fn sequence_of(&self, number: &str) -> Option<u32> {
        let rest = number.strip_prefix(AsRef::<str>::as_ref(&self.prefix))?;
        let rest = rest.strip_prefix('-')?;
        let rest = rest.strip_prefix(format!("{:04}", self.year).as_str())?;
        let suffix = rest.strip_prefix('-')?;

        (!suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
            .then(|| suffix.parse().ok())
            .flatten()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}", self.prefix, self.year)
    }
}

/// Human-readable sequential document number, formatted as
/// `{prefix}-{year}-{sequence}`, with the year zero-padded to 4 digits and
/// the sequence to 3 digits (like `MZK-2025-014`).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Number {
    /// [`Scope`] of this [`Number`].
    scope: Scope,

    /// Sequence of this [`Number`] in its [`Scope`], starting from `1`.
    sequence: u32,
}

impl Number {
    /// Creates a new [`Number`] if the `sequence` is positive and the `year`
    /// of the [`Scope`] has 4 digits at most.
    #[must_use]
    pub fn new(scope: Scope, sequence: u32) -> Option<Self> {
        ((0..=9999).contains(&scope.year) && sequence > 0)
            .then_some(Self { scope, sequence })
    }

    /// Allocates the next [`Number`] in the provided [`Scope`] out of the
    /// `existing` formatted numbers.
    ///
    /// The greatest sequence of the `existing` numbers of this [`Scope`] is
    /// incremented. Numbers of other [`Scope`]s and non-numeric sequences are
    /// ignored, so an empty [`Scope`] starts from `1`. Freed sequences are
    /// never reused.
    #[must_use]
    pub fn allocate<S: AsRef<str>>(
        scope: Scope,
        existing: impl IntoIterator<Item = S>,
    ) -> Self {
        let last = existing
            .into_iter()
            .filter_map(|n| scope.sequence_of(n.as_ref()))
            .max()
            .unwrap_or(0);
        Self {
            scope,
            sequence: last.saturating_add(1),
        }
    }

    /// Returns [`Scope`] of this [`Number`].
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns [`Prefix`] of this [`Number`].
    #[must_use]
    pub fn prefix(&self) -> &Prefix {
        &self.scope.prefix
    }

    /// Returns year of this [`Number`].
    #[must_use]
    pub fn year(&self) -> i32 {
        self.scope.year
    }

    /// Returns sequence of this [`Number`].
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}", self.scope, self.sequence)
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        /// Regular expression of a formatted [`Number`].
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^([A-Z0-9]{1,10})-(\d{4})-(\d{3,})$")
                .expect("valid regex")
        });

        const ERR: &str = "invalid `Number`";

        let caps = REGEX.captures(s).ok_or(ERR)?;
        let prefix = Prefix::new(&caps[1]).ok_or(ERR)?;
        let year = caps[2].parse().map_err(|_| ERR)?;
        let sequence = caps[3].parse().map_err(|_| ERR)?;

        Self::new(Scope { prefix, year }, sequence).ok_or(ERR)
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Number {
    accepts!(TEXT, VARCHAR);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(<&str>::from_sql(ty, raw)?.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Number {
    accepts!(TEXT, VARCHAR);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.to_string().to_sql(ty, w)
    }
}

/// Free-form notes of a document.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates a new [`Notes`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `notes` match the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(notes: impl Into<String>) -> Self {
        Self(notes.into())
    }

    /// Creates new [`Notes`] if the given `notes` are valid.
    #[must_use]
    pub fn new(notes: impl Into<String>) -> Option<Self> {
        let notes = notes.into();
        Self::check(&notes).then_some(Self(notes))
    }

    /// Checks whether the given `notes` are valid [`Notes`].
    fn check(notes: impl AsRef<str>) -> bool {
        let notes = notes.as_ref();
        notes.trim() == notes
            && !notes.is_empty()
            && notes.chars().count() <= 2000
    }
}

impl FromStr for Notes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Notes`")
    }
}

#[cfg(test)]
mod spec {
    use super::{Number, Prefix, Scope};

    fn scope(prefix: &str, year: i32) -> Scope {
        Scope {
            prefix: Prefix::new(prefix).unwrap(),
            year,
        }
    }

    #[test]
    fn checks_prefix() {
        for valid in ["MZK", "QUO", "A", "INV2", "ABCDEFGHIJ"] {
            assert!(Prefix::new(valid).is_some(), "prefix: {valid}");
        }
        for invalid in ["", "mzk", "MZ-K", "MZK ", "ABCDEFGHIJK", "Ñ"] {
            assert!(Prefix::new(invalid).is_none(), "prefix: {invalid}");
        }
    }

    #[test]
    fn allocates_from_max() {
        let n = Number::allocate(
            scope("MZK", 2025),
            ["MZK-2025-001", "MZK-2025-003"],
        );

        assert_eq!(n.sequence(), 4);
        assert_eq!(n.to_string(), "MZK-2025-004");
    }

    #[test]
    fn allocates_first_in_empty_scope() {
        let n = Number::allocate(scope("QUO", 2025), Vec::<&str>::new());

        assert_eq!(n.to_string(), "QUO-2025-001");
    }

    #[test]
    fn ignores_other_scopes() {
        let n = Number::allocate(
            scope("MZK", 2025),
            ["MZK-2024-999", "QUO-2025-050", "MZKX-2025-070", "MZ-2025-080"],
        );

        assert_eq!(n.to_string(), "MZK-2025-001");
    }

    #[test]
    fn ignores_unparsable_sequences() {
        let n = Number::allocate(
            scope("MZK", 2025),
            [
                "MZK-2025-002",
                "MZK-2025-00a",
                "MZK-2025-",
                "MZK-2025-+7",
                "MZK-2025-99999999999",
            ],
        );

        assert_eq!(n.to_string(), "MZK-2025-003");
    }

    #[test]
    fn grows_past_three_digits() {
        let n = Number::allocate(scope("MZK", 2025), ["MZK-2025-999"]);

        assert_eq!(n.to_string(), "MZK-2025-1000");
        assert_eq!(n, "MZK-2025-1000".parse().unwrap());
    }

    #[test]
    fn parses() {
        let n: Number = "MZK-2025-014".parse().unwrap();
        assert_eq!(n.prefix().to_string(), "MZK");
        assert_eq!(n.year(), 2025);
        assert_eq!(n.sequence(), 14);

        for invalid in [
            "mzk-2025-014",
            "MZK-25-014",
            "MZK-2025-14",
            "MZK-2025-000",
            "MZK2025014",
            "MZK-2025-014 ",
            "ABCDEFGHIJK-2025-001",
        ] {
            assert!(invalid.parse::<Number>().is_err(), "number: {invalid}");
        }
    }
}
