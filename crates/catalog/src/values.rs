//! Fact keys and fact values.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::model::FactKind;

/// Prefix marking a key in the open-ended boolean bag.
pub const CUSTOM_PREFIX: &str = "custom.";

/// Key of one fact about the user.
///
/// First-class fields are declared in the catalog's fact schema. Long-tail
/// conditions live in the custom bag and are always boolean; they are
/// written `custom.<name>` wherever a key appears as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FactKey {
    Field(String),
    Custom(String),
}

impl FactKey {
    pub fn field(name: impl Into<String>) -> Self {
        FactKey::Field(name.into())
    }

    pub fn custom(name: impl Into<String>) -> Self {
        FactKey::Custom(name.into())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, FactKey::Custom(_))
    }

    /// The name without the custom-bag prefix.
    pub fn name(&self) -> &str {
        match self {
            FactKey::Field(n) | FactKey::Custom(n) => n,
        }
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactKey::Field(n) => write!(f, "{}", n),
            FactKey::Custom(n) => write!(f, "{}{}", CUSTOM_PREFIX, n),
        }
    }
}

impl FromStr for FactKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("fact key must not be empty".to_string());
        }
        match s.strip_prefix(CUSTOM_PREFIX) {
            Some("") => Err(format!("custom fact key '{}' has no name", s)),
            Some(name) => Ok(FactKey::Custom(name.to_string())),
            None => Ok(FactKey::Field(s.to_string())),
        }
    }
}

impl TryFrom<String> for FactKey {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FactKey> for String {
    fn from(k: FactKey) -> String {
        k.to_string()
    }
}

/// A typed fact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactValue {
    Number(Decimal),
    Bool(bool),
    Label(String),
    Date(Date),
}

impl FactValue {
    /// Return the type name of this value (for error messages).
    pub fn type_name(&self) -> &'static str {
        match self {
            FactValue::Number(_) => "number",
            FactValue::Bool(_) => "boolean",
            FactValue::Label(_) => "label",
            FactValue::Date(_) => "date",
        }
    }

    /// Parse a JSON value against a declared fact kind.
    ///
    /// Numbers accept JSON numbers or decimal strings; dates accept
    /// ISO 8601 calendar dates (`YYYY-MM-DD`). Enum labels are checked
    /// against the declared label set.
    pub fn from_json(v: &serde_json::Value, kind: &FactKind) -> Result<FactValue, String> {
        match (kind, v) {
            (FactKind::Boolean, serde_json::Value::Bool(b)) => Ok(FactValue::Bool(*b)),
            (FactKind::Number, serde_json::Value::Number(n)) => parse_decimal(&n.to_string()),
            (FactKind::Number, serde_json::Value::String(s)) => parse_decimal(s),
            (FactKind::Enum { values }, serde_json::Value::String(s)) => {
                if values.iter().any(|v| v == s) {
                    Ok(FactValue::Label(s.clone()))
                } else {
                    Err(format!("'{}' is not one of {:?}", s, values))
                }
            }
            (FactKind::Date, serde_json::Value::String(s)) => parse_date(s).map(FactValue::Date),
            (kind, other) => Err(format!(
                "expected {}, got {}",
                kind.name(),
                json_type_name(other)
            )),
        }
    }

    /// Serialize to a JSON value in the same shape `from_json` accepts.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FactValue::Number(d) => serde_json::Value::String(d.to_string()),
            FactValue::Bool(b) => serde_json::Value::Bool(*b),
            FactValue::Label(s) => serde_json::Value::String(s.clone()),
            FactValue::Date(d) => serde_json::Value::String(format_date(*d)),
        }
    }

    /// Whether this value is a legal value of the declared kind.
    pub fn conforms_to(&self, kind: &FactKind) -> bool {
        match (self, kind) {
            (FactValue::Number(_), FactKind::Number) => true,
            (FactValue::Bool(_), FactKind::Boolean) => true,
            (FactValue::Date(_), FactKind::Date) => true,
            (FactValue::Label(l), FactKind::Enum { values }) => values.contains(l),
            _ => false,
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Number(d) => write!(f, "{}", d),
            FactValue::Bool(b) => write!(f, "{}", b),
            FactValue::Label(s) => write!(f, "{}", s),
            FactValue::Date(d) => write!(f, "{}", format_date(*d)),
        }
    }
}

fn parse_decimal(s: &str) -> Result<FactValue, String> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map(FactValue::Number)
        .map_err(|e| format!("invalid number '{}': {}", s, e))
}

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date '{}': {}", s, e))
}

/// Format a date as ISO 8601 (`YYYY-MM-DD`).
pub fn format_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| d.to_string())
}

/// Return a descriptive type name for a JSON value (for error messages).
pub fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
