//! Parameter schema for the device configuration file.
//!
//! Every key the store accepts is declared here with its type, default and
//! scope. Keys are dotted `section.name` paths; the first segment becomes a
//! TOML table when the store is saved.

use std::fmt;

/// Whether a parameter is written to disk or owned by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Saved to and loaded from the configuration file; writable by clients.
    Persisted,
    /// Maintained by the daemon at runtime; never saved, read-only to clients.
    Runtime,
}

impl fmt::Display for Scope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Persisted => "persisted",
            Self::Runtime => "runtime-only",
        })
    }
}

/// Value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Boolean flag.
    Bool,
    /// Integer within an inclusive range.
    Int {
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },
    /// Free-form string.
    Str,
    /// One of a fixed set of lowercase names.
    Enum(&'static [&'static str]),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => formatter.write_str("a boolean"),
            Self::Int { min, max } => write!(formatter, "an integer in {min}..={max}"),
            Self::Str => formatter.write_str("a string"),
            Self::Enum(variants) => write!(formatter, "one of {}", variants.join("|")),
        }
    }
}

/// Built-in default of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Int(i64),
    /// String or enum default.
    Str(&'static str),
}

/// Declaration of one configuration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Canonical dotted key.
    pub key: &'static str,
    /// Value type.
    pub kind: ValueKind,
    /// Built-in default.
    pub default: DefaultValue,
    /// Persistence scope.
    pub scope: Scope,
}

impl ParamSpec {
    const fn persisted(key: &'static str, kind: ValueKind, default: DefaultValue) -> Self {
        Self {
            key,
            kind,
            default,
            scope: Scope::Persisted,
        }
    }

    const fn runtime(key: &'static str, kind: ValueKind, default: DefaultValue) -> Self {
        Self {
            key,
            kind,
            default,
            scope: Scope::Runtime,
        }
    }
}

const CLOCK_FORMATS: &[&str] = &["12hr", "24hr"];
const DATE_FORMATS: &[&str] = &["ddmmyy", "mmddyy", "yymmdd"];
const MONO_LED: &[&str] = &["off", "on"];
const COLOUR_LED: &[&str] = &["off", "red", "amber", "green"];
const BRIGHTNESS: ValueKind = ValueKind::Int { min: 0, max: 128 };

/// Every parameter known to the store.
pub static SCHEMA: &[ParamSpec] = &[
    ParamSpec::persisted("clock.enabled", ValueKind::Bool, DefaultValue::Bool(false)),
    ParamSpec::persisted("clock.primary_is_local", ValueKind::Bool, DefaultValue::Bool(true)),
    ParamSpec::persisted("clock.secondary", ValueKind::Str, DefaultValue::Str("UTC")),
    ParamSpec::persisted("clock.tertiary", ValueKind::Str, DefaultValue::Str("UTC")),
    ParamSpec::persisted(
        "clock.format",
        ValueKind::Enum(CLOCK_FORMATS),
        DefaultValue::Str("12hr"),
    ),
    ParamSpec::persisted(
        "clock.format_secondary",
        ValueKind::Enum(CLOCK_FORMATS),
        DefaultValue::Str("12hr"),
    ),
    ParamSpec::persisted(
        "clock.format_tertiary",
        ValueKind::Enum(CLOCK_FORMATS),
        DefaultValue::Str("12hr"),
    ),
    ParamSpec::persisted(
        "clock.date_format",
        ValueKind::Enum(DATE_FORMATS),
        DefaultValue::Str("ddmmyy"),
    ),
    ParamSpec::persisted("led.fire", ValueKind::Enum(MONO_LED), DefaultValue::Str("on")),
    ParamSpec::persisted("led.a", ValueKind::Enum(COLOUR_LED), DefaultValue::Str("green")),
    ParamSpec::persisted("led.b", ValueKind::Enum(COLOUR_LED), DefaultValue::Str("green")),
    ParamSpec::persisted("led.d", ValueKind::Enum(COLOUR_LED), DefaultValue::Str("green")),
    ParamSpec::persisted("led.e", ValueKind::Enum(COLOUR_LED), DefaultValue::Str("green")),
    ParamSpec::persisted("led.t1", ValueKind::Enum(COLOUR_LED), DefaultValue::Str("green")),
    ParamSpec::persisted("led.t2", ValueKind::Enum(COLOUR_LED), DefaultValue::Str("green")),
    ParamSpec::persisted("led.t3", ValueKind::Enum(COLOUR_LED), DefaultValue::Str("green")),
    ParamSpec::persisted("led.pov", ValueKind::Enum(COLOUR_LED), DefaultValue::Str("green")),
    ParamSpec::persisted(
        "led.clutch",
        ValueKind::Enum(COLOUR_LED),
        DefaultValue::Str("green"),
    ),
    ParamSpec::persisted("led.throttle", ValueKind::Enum(MONO_LED), DefaultValue::Str("on")),
    ParamSpec::persisted("brightness.mfd", BRIGHTNESS, DefaultValue::Int(128)),
    ParamSpec::persisted("brightness.led", BRIGHTNESS, DefaultValue::Int(128)),
    ParamSpec::runtime("device.connected", ValueKind::Bool, DefaultValue::Bool(false)),
    ParamSpec::runtime("device.name", ValueKind::Str, DefaultValue::Str("")),
];

/// Alternative spellings resolved to their canonical key. Matching ignores
/// case, so `FormatPrimary` in a file resolves through `formatprimary`.
const ALIASES: &[(&str, &str)] = &[
    ("clock.format_primary", "clock.format"),
    ("clock.formatprimary", "clock.format"),
    ("clock.formatsecondary", "clock.format_secondary"),
    ("clock.formattertiary", "clock.format_tertiary"),
    ("clock.dateformat", "clock.date_format"),
    ("clock.primaryislocal", "clock.primary_is_local"),
];

/// Finds the declaration for `key`, ignoring ASCII case.
#[must_use]
pub fn lookup(key: &str) -> Option<&'static ParamSpec> {
    let trimmed = key.trim();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map_or(trimmed, |(_, target)| *target);
    SCHEMA
        .iter()
        .find(|spec| spec.key.eq_ignore_ascii_case(canonical))
}
