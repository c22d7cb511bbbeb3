//! Typed parameter values and coercion of client input.

use std::fmt;

use serde::Serialize;

use super::errors::ConfigError;
use super::schema::{DefaultValue, ParamSpec, ValueKind};

/// A typed parameter value held by the store.
///
/// Enum parameters are stored as their canonical lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// String or enum value.
    Str(String),
}

impl ParamValue {
    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Int(_) | Self::Str(_) => None,
        }
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Bool(_) | Self::Str(_) => None,
        }
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            Self::Bool(_) | Self::Int(_) => None,
        }
    }

    pub(crate) fn to_toml(&self) -> toml::Value {
        match self {
            Self::Bool(value) => toml::Value::Boolean(*value),
            Self::Int(value) => toml::Value::Integer(*value),
            Self::Str(value) => toml::Value::String(value.clone()),
        }
    }
}

impl From<DefaultValue> for ParamValue {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Bool(flag) => Self::Bool(flag),
            DefaultValue::Int(number) => Self::Int(number),
            DefaultValue::Str(text) => Self::Str(text.to_owned()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::Int(value) => write!(formatter, "{value}"),
            Self::Str(value) => formatter.write_str(value),
        }
    }
}

/// An untyped value arriving from the wire, a file or an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawValue<'a> {
    /// Native boolean.
    Bool(bool),
    /// Native integer.
    Int(i64),
    /// Text, coerced according to the schema.
    Text(&'a str),
    /// Any other shape, named for error messages.
    Other(&'static str),
}

impl RawValue<'_> {
    fn describe(self) -> String {
        match self {
            Self::Bool(value) => format!("boolean {value}"),
            Self::Int(value) => format!("integer {value}"),
            Self::Text(value) => format!("\"{value}\""),
            Self::Other(shape) => shape.to_owned(),
        }
    }
}

impl<'a> From<&'a serde_json::Value> for RawValue<'a> {
    fn from(value: &'a serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(flag) => Self::Bool(*flag),
            serde_json::Value::Number(number) => {
                number.as_i64().map_or(Self::Other("a float"), Self::Int)
            }
            serde_json::Value::String(text) => Self::Text(text),
            serde_json::Value::Null => Self::Other("null"),
            serde_json::Value::Array(_) => Self::Other("an array"),
            serde_json::Value::Object(_) => Self::Other("an object"),
        }
    }
}

impl<'a> From<&'a toml::Value> for RawValue<'a> {
    fn from(value: &'a toml::Value) -> Self {
        match value {
            toml::Value::Boolean(flag) => Self::Bool(*flag),
            toml::Value::Integer(number) => Self::Int(*number),
            toml::Value::String(text) => Self::Text(text),
            toml::Value::Float(_) => Self::Other("a float"),
            toml::Value::Datetime(_) => Self::Other("a datetime"),
            toml::Value::Array(_) => Self::Other("an array"),
            toml::Value::Table(_) => Self::Other("a table"),
        }
    }
}

impl<'a> From<&'a ParamValue> for RawValue<'a> {
    fn from(value: &'a ParamValue) -> Self {
        match value {
            ParamValue::Bool(flag) => Self::Bool(*flag),
            ParamValue::Int(number) => Self::Int(*number),
            ParamValue::Str(text) => Self::Text(text),
        }
    }
}

/// Converts `raw` into the type declared by `spec`.
pub(crate) fn coerce(spec: &ParamSpec, raw: RawValue<'_>) -> Result<ParamValue, ConfigError> {
    let mismatch = || ConfigError::TypeMismatch {
        key: spec.key.to_owned(),
        expected: spec.kind.to_string(),
        found: raw.describe(),
    };
    match (spec.kind, raw) {
        (ValueKind::Bool, RawValue::Bool(flag)) => Ok(ParamValue::Bool(flag)),
        (ValueKind::Bool, RawValue::Text(text)) => {
            parse_bool(text).map(ParamValue::Bool).ok_or_else(mismatch)
        }
        (ValueKind::Int { min, max }, RawValue::Int(number)) => {
            in_range(number, min, max).ok_or_else(mismatch)
        }
        (ValueKind::Int { min, max }, RawValue::Text(text)) => text
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|number| in_range(number, min, max))
            .ok_or_else(mismatch),
        (ValueKind::Str, RawValue::Text(text)) => Ok(ParamValue::Str(text.to_owned())),
        (ValueKind::Enum(variants), RawValue::Text(text)) => variants
            .iter()
            .find(|variant| variant.eq_ignore_ascii_case(text.trim()))
            .map(|variant| ParamValue::Str((*variant).to_owned()))
            .ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let trimmed = text.trim();
    if ["yes", "true"].iter().any(|word| word.eq_ignore_ascii_case(trimmed)) {
        Some(true)
    } else if ["no", "false"].iter().any(|word| word.eq_ignore_ascii_case(trimmed)) {
        Some(false)
    } else {
        None
    }
}

fn in_range(number: i64, min: i64, max: i64) -> Option<ParamValue> {
    (min..=max).contains(&number).then_some(ParamValue::Int(number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_store::schema::lookup;
    use rstest::rstest;
    use serde_json::json;

    fn spec(key: &str) -> &'static ParamSpec {
        lookup(key).expect("key is declared")
    }

    #[rstest]
    #[case(json!(true), ParamValue::Bool(true))]
    #[case(json!("Yes"), ParamValue::Bool(true))]
    #[case(json!("FALSE"), ParamValue::Bool(false))]
    #[case(json!("no"), ParamValue::Bool(false))]
    fn coerces_booleans(#[case] input: serde_json::Value, #[case] expected: ParamValue) {
        let value =
            coerce(spec("clock.primary_is_local"), RawValue::from(&input)).expect("coerces");
        assert_eq!(value, expected);
    }

    #[rstest]
    #[case(json!(64), Some(64))]
    #[case(json!("128"), Some(128))]
    #[case(json!(129), None)]
    #[case(json!(-1), None)]
    #[case(json!(1.5), None)]
    #[case(json!("bright"), None)]
    fn coerces_bounded_integers(#[case] input: serde_json::Value, #[case] expected: Option<i64>) {
        let result = coerce(spec("brightness.mfd"), RawValue::from(&input));
        match expected {
            Some(number) => assert_eq!(result.expect("coerces"), ParamValue::Int(number)),
            None => assert!(matches!(result, Err(ConfigError::TypeMismatch { .. }))),
        }
    }

    #[rstest]
    #[case("AMBER", "amber")]
    #[case(" green ", "green")]
    fn canonicalises_enum_names(#[case] input: &str, #[case] expected: &str) {
        let value = coerce(spec("led.a"), RawValue::Text(input)).expect("coerces");
        assert_eq!(value, ParamValue::Str(expected.to_owned()));
    }

    #[test]
    fn rejects_enum_variant_of_other_led_kind() {
        let error = coerce(spec("led.fire"), RawValue::Text("amber")).expect_err("fire is mono");
        assert!(error.to_string().contains("off|on"));
    }

    #[test]
    fn rejects_non_text_for_strings() {
        let error = coerce(spec("device.name"), RawValue::Int(3)).expect_err("string expected");
        assert!(matches!(error, ConfigError::TypeMismatch { .. }));
    }
}
