//! Raw serde structs mirroring the catalog JSON document.
//!
//! These types only capture the document's shape. Identifiers, operators,
//! edge kinds and literal values are kept as plain strings or JSON values
//! here and checked in [`crate::validate`], so a single malformed entry
//! becomes one reported defect instead of aborting deserialization.

use serde::Deserialize;

use crate::model::{Contact, RateTable};

/// Top-level catalog document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCatalog {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub facts: Vec<RawFact>,
    #[serde(default)]
    pub departments: Vec<RawDepartment>,
    #[serde(default)]
    pub services: Vec<RawService>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
    #[serde(default)]
    pub life_events: Vec<RawLifeEvent>,
}

/// A fact schema entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFact {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Declared labels, for `enum` facts.
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDepartment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawKeyQuestion {
    pub fact: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawService {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub gated: bool,
    #[serde(default)]
    pub proactive: bool,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub rates: Option<RateTable>,
    #[serde(default)]
    pub key_questions: Vec<RawKeyQuestion>,
    /// Decoded one by one in validation, see [`RawRule`].
    #[serde(default)]
    pub rules: Vec<serde_json::Value>,
}

fn default_expected() -> bool {
    true
}

/// A rule object, tagged by `kind`.
///
/// Services and combinators hold their rules as plain JSON; each one is
/// decoded into this type separately, so an unknown kind or a missing
/// field is a defect on that rule alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RawRule {
    Boolean {
        label: String,
        field: String,
        #[serde(default = "default_expected")]
        expected: bool,
    },
    Comparison {
        label: String,
        field: String,
        op: String,
        value: serde_json::Value,
    },
    EnumMembership {
        label: String,
        field: String,
        values: Vec<String>,
    },
    Deadline {
        label: String,
        trigger: String,
        max_days: i64,
    },
    Dependency {
        label: String,
        service: String,
        condition: String,
    },
    Not {
        label: String,
        children: Vec<serde_json::Value>,
    },
    Any {
        label: String,
        children: Vec<serde_json::Value>,
    },
    All {
        label: String,
        children: Vec<serde_json::Value>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge {
    pub from: String,
    pub to: String,
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLifeEvent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub entry: Vec<String>,
}
