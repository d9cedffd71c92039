//! Three-valued logic.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::types::FactKey;

/// A truth value that admits missing information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tri {
    True,
    False,
    Unknown,
}

impl Tri {
    pub fn is_known(self) -> bool {
        self != Tri::Unknown
    }

    pub fn negate(self) -> Tri {
        match self {
            Tri::True => Tri::False,
            Tri::False => Tri::True,
            Tri::Unknown => Tri::Unknown,
        }
    }
}

impl From<bool> for Tri {
    fn from(b: bool) -> Self {
        if b {
            Tri::True
        } else {
            Tri::False
        }
    }
}

impl fmt::Display for Tri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tri::True => "TRUE",
            Tri::False => "FALSE",
            Tri::Unknown => "UNKNOWN",
        })
    }
}

/// Result of evaluating a rule: a truth value and the facts still missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub value: Tri,
    pub missing: BTreeSet<FactKey>,
}

impl Evaluation {
    /// A conclusive result with nothing missing.
    pub fn known(value: bool) -> Self {
        Evaluation {
            value: value.into(),
            missing: BTreeSet::new(),
        }
    }

    /// UNKNOWN because `key` has no value.
    pub fn missing(key: FactKey) -> Self {
        Evaluation {
            value: Tri::Unknown,
            missing: BTreeSet::from([key]),
        }
    }

    /// UNKNOWN with no fact to ask for (e.g. a dependency cycle).
    pub fn unknown() -> Self {
        Evaluation {
            value: Tri::Unknown,
            missing: BTreeSet::new(),
        }
    }

    pub fn negate(self) -> Self {
        Evaluation {
            value: self.value.negate(),
            missing: self.missing,
        }
    }
}
