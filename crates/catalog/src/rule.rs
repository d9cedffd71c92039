//! The eligibility rule language.
//!
//! A rule is a closed sum type: one variant per leaf or combinator kind,
//! each carrying only its own fields. A service's top-level rule list is
//! an implicit `All`.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::values::{FactKey, FactValue};

/// Operator of a comparison leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    pub fn parse(s: &str) -> Option<CompareOp> {
        match s {
            "=" | "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            _ => None,
        }
    }

    /// Whether the operator needs an ordering (as opposed to equality only).
    pub fn is_relational(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which recorded status satisfies a dependency leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCondition {
    Receiving,
    Completed,
}

impl StatusCondition {
    pub fn parse(s: &str) -> Option<StatusCondition> {
        match s {
            "receiving" => Some(StatusCondition::Receiving),
            "completed" => Some(StatusCondition::Completed),
            _ => None,
        }
    }
}

/// One node of a rule tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// The boolean fact `field` equals `expected`.
    Boolean {
        label: String,
        field: FactKey,
        expected: bool,
    },
    /// `field <op> value`.
    Comparison {
        label: String,
        field: FactKey,
        op: CompareOp,
        value: FactValue,
    },
    /// The enum fact `field` is one of `values`.
    EnumMembership {
        label: String,
        field: FactKey,
        values: BTreeSet<String>,
    },
    /// Days elapsed since the date in `trigger`, bounded by `max_days`.
    ///
    /// `max_days >= 0`: act within N days after the event.
    /// `max_days < 0`: act at least |N| days before the event.
    Deadline {
        label: String,
        trigger: FactKey,
        max_days: i64,
    },
    /// Another service's status matches `condition`.
    Dependency {
        label: String,
        service: String,
        condition: StatusCondition,
    },
    Not {
        label: String,
        child: Box<Rule>,
    },
    Any {
        label: String,
        children: Vec<Rule>,
    },
    All {
        label: String,
        children: Vec<Rule>,
    },
}

impl Rule {
    pub fn label(&self) -> &str {
        match self {
            Rule::Boolean { label, .. }
            | Rule::Comparison { label, .. }
            | Rule::EnumMembership { label, .. }
            | Rule::Deadline { label, .. }
            | Rule::Dependency { label, .. }
            | Rule::Not { label, .. }
            | Rule::Any { label, .. }
            | Rule::All { label, .. } => label,
        }
    }

    /// Call `f` on this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Rule)) {
        f(self);
        match self {
            Rule::Not { child, .. } => child.walk(f),
            Rule::Any { children, .. } | Rule::All { children, .. } => {
                for c in children {
                    c.walk(f);
                }
            }
            _ => {}
        }
    }

    /// Fact keys read anywhere in this tree.
    pub fn fact_keys(&self) -> BTreeSet<&FactKey> {
        let mut keys = BTreeSet::new();
        self.walk(&mut |r| match r {
            Rule::Boolean { field, .. }
            | Rule::Comparison { field, .. }
            | Rule::EnumMembership { field, .. } => {
                keys.insert(field);
            }
            Rule::Deadline { trigger, .. } => {
                keys.insert(trigger);
            }
            _ => {}
        });
        keys
    }

    /// Service ids referenced by dependency leaves anywhere in this tree.
    pub fn dependencies(&self) -> BTreeSet<&str> {
        let mut ids = BTreeSet::new();
        self.walk(&mut |r| {
            if let Rule::Dependency { service, .. } = r {
                ids.insert(service.as_str());
            }
        });
        ids
    }

    pub fn has_deadline(&self) -> bool {
        let mut found = false;
        self.walk(&mut |r| {
            if matches!(r, Rule::Deadline { .. }) {
                found = true;
            }
        });
        found
    }
}
