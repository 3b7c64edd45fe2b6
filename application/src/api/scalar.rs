//! GraphQL scalars represented as strings.

use std::{fmt, marker::PhantomData, str::FromStr};

use derive_more::{AsRef, Display, From, Into};
use juniper::{
    GraphQLScalar, GraphQLType, InputValue, ParseScalarResult,
    ParseScalarValue, ScalarToken, ScalarValue, Value,
};

/// Helper for `#[graphql(with = ..)]` attribute, representing a newtype over
/// an `Inner` type as a string scalar.
///
/// Output is the [`Display`] of the `Inner` value, while input is trimmed
/// and parsed with its [`FromStr`] impl, so `Inner` values are validated
/// exactly like anywhere else.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Textual<Inner>(PhantomData<Inner>);

impl<Inner> Textual<Inner> {
    /// Writes the provided `value` as a string scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        Inner: fmt::Display,
        T: AsRef<Inner>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Reads the target type out of the provided string scalar.
    ///
    /// # Errors
    ///
    /// If the `input` is not a string, or doesn't parse into `Inner`.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        Inner: FromStr,
        Inner::Err: fmt::Display,
        T: From<Inner> + GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("scalar");
        let s = input.as_string_value().ok_or_else(|| {
            format!("`{name}` must be a string, found: {input}")
        })?;
        s.trim()
            .parse::<Inner>()
            .map(T::from)
            .map_err(|e| format!("`{name}` cannot be parsed from \"{s}\": {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Arbitrary precision decimal number, like `1250.50`.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = Textual::<rust_decimal::Decimal>)]
pub struct Decimal(rust_decimal::Decimal);

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue};

    use super::{Decimal, Textual};

    type Input = InputValue<DefaultScalarValue>;

    fn decimal(input: &Input) -> Result<Decimal, String> {
        Textual::<rust_decimal::Decimal>::from_input(input)
    }

    #[test]
    fn parses_decimal_strings() {
        let d = decimal(&Input::scalar(" 1250.50 ")).unwrap();

        assert_eq!(d.to_string(), "1250.50");
    }

    #[test]
    fn rejects_non_decimal_input() {
        assert!(decimal(&Input::scalar(1250)).is_err());
        assert!(decimal(&Input::scalar("twelve")).is_err());
    }
}
