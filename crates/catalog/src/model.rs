//! Typed catalog constructs.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rule::Rule;
use crate::values::FactKey;

// ──────────────────────────────────────────────
// Fact schema
// ──────────────────────────────────────────────

/// The declared type of a first-class fact field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactKind {
    Number,
    Boolean,
    Enum { values: Vec<String> },
    Date,
}

impl FactKind {
    pub fn name(&self) -> &'static str {
        match self {
            FactKind::Number => "number",
            FactKind::Boolean => "boolean",
            FactKind::Enum { .. } => "enum",
            FactKind::Date => "date",
        }
    }

    /// Whether relational operators (`<`, `<=`, `>`, `>=`) apply.
    pub fn is_ordered(&self) -> bool {
        matches!(self, FactKind::Number | FactKind::Date)
    }
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared fact field.
#[derive(Debug, Clone)]
pub struct FactDecl {
    pub key: FactKey,
    pub kind: FactKind,
    /// Human-readable description, used as a fallback question.
    pub label: Option<String>,
}

// ──────────────────────────────────────────────
// Contact and rate tables (passed through unchanged)
// ──────────────────────────────────────────────

/// Contact details for a department or a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A financial rate table attached to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub rates: Vec<Rate>,
}

/// One row of a rate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub label: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

// ──────────────────────────────────────────────
// Services, departments, edges, life events
// ──────────────────────────────────────────────

/// A government department owning services.
#[derive(Debug, Clone)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub contact: Option<Contact>,
}

/// A question that resolves one fact, as phrased for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyQuestion {
    pub fact: FactKey,
    pub text: String,
}

/// One catalog entry.
#[derive(Debug, Clone)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub department: Option<String>,
    /// Must be reached via a satisfied ENABLES predecessor before it is surfaced.
    pub gated: bool,
    /// May be suggested without an explicit life-event trigger.
    pub proactive: bool,
    pub contact: Option<Contact>,
    pub rates: Option<RateTable>,
    pub key_questions: Vec<KeyQuestion>,
    /// Top-level rule set, an implicit `all`.
    pub rules: Vec<Rule>,
}

impl Service {
    /// Whether any rule in this service's tree is a deadline rule.
    pub fn has_deadline(&self) -> bool {
        self.rules.iter().any(Rule::has_deadline)
    }
}

/// Kind of relationship between two services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Strict prerequisite: the target is not actionable until the source is completed.
    Requires,
    /// Soft relevance: affects discoverability and gated visibility only.
    Enables,
}

impl EdgeKind {
    pub fn parse(s: &str) -> Option<EdgeKind> {
        match s {
            "REQUIRES" => Some(EdgeKind::Requires),
            "ENABLES" => Some(EdgeKind::Enables),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Requires => f.write_str("REQUIRES"),
            EdgeKind::Enables => f.write_str("ENABLES"),
        }
    }
}

/// A directed edge between two services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// A named bundle of entry services. Never a graph node itself.
#[derive(Debug, Clone)]
pub struct LifeEvent {
    pub id: String,
    pub name: String,
    pub entry: Vec<String>,
}
