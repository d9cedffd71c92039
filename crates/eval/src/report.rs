//! Traversal output: one outcome per reachable service.

use std::fmt;

use civicnav_catalog::values::format_date;
use civicnav_catalog::{Contact, RateTable};
use serde::{Serialize, Serializer};
use time::Date;

use crate::types::FactKey;

/// Where a reachable service stands for this user right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeState {
    /// A REQUIRES predecessor has not been completed.
    Locked,
    /// Gated and not yet unlocked by an ENABLES predecessor.
    HiddenGated,
    /// Eligibility depends on facts not yet known.
    NeedsInfo,
    Ineligible,
    Actionable,
    /// The user has already completed this service.
    Satisfied,
}

impl NodeState {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeState::Locked => "LOCKED",
            NodeState::HiddenGated => "HIDDEN_GATED",
            NodeState::NeedsInfo => "NEEDS_INFO",
            NodeState::Ineligible => "INELIGIBLE",
            NodeState::Actionable => "ACTIONABLE",
            NodeState::Satisfied => "SATISFIED",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unresolved question for a NEEDS_INFO service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub fact: FactKey,
    pub text: String,
}

/// Per-service result of a traversal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutcome {
    pub service: String,
    pub name: String,
    pub state: NodeState,
    /// Ordered questions; only populated for NEEDS_INFO.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
    /// Uncompleted REQUIRES predecessors; only populated for LOCKED.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates: Option<RateTable>,
    pub proactive: bool,
}

/// Count of nodes per state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub locked: usize,
    pub hidden_gated: usize,
    pub needs_info: usize,
    pub ineligible: usize,
    pub actionable: usize,
    pub satisfied: usize,
}

impl Summary {
    pub fn tally(nodes: &[NodeOutcome]) -> Summary {
        let mut s = Summary::default();
        for n in nodes {
            *s.slot(n.state) += 1;
        }
        s
    }

    pub fn count(&self, state: NodeState) -> usize {
        match state {
            NodeState::Locked => self.locked,
            NodeState::HiddenGated => self.hidden_gated,
            NodeState::NeedsInfo => self.needs_info,
            NodeState::Ineligible => self.ineligible,
            NodeState::Actionable => self.actionable,
            NodeState::Satisfied => self.satisfied,
        }
    }

    fn slot(&mut self, state: NodeState) -> &mut usize {
        match state {
            NodeState::Locked => &mut self.locked,
            NodeState::HiddenGated => &mut self.hidden_gated,
            NodeState::NeedsInfo => &mut self.needs_info,
            NodeState::Ineligible => &mut self.ineligible,
            NodeState::Actionable => &mut self.actionable,
            NodeState::Satisfied => &mut self.satisfied,
        }
    }
}

/// Outcome of traversing one life event, nodes in breadth-first order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalReport {
    pub life_event: String,
    #[serde(serialize_with = "serialize_date")]
    pub today: Date,
    pub nodes: Vec<NodeOutcome>,
    pub summary: Summary,
}

fn serialize_date<S: Serializer>(d: &Date, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_date(*d))
}

impl TraversalReport {
    pub fn new(life_event: impl Into<String>, today: Date, nodes: Vec<NodeOutcome>) -> Self {
        let summary = Summary::tally(&nodes);
        TraversalReport {
            life_event: life_event.into(),
            today,
            nodes,
            summary,
        }
    }

    pub fn get(&self, service: &str) -> Option<&NodeOutcome> {
        self.nodes.iter().find(|n| n.service == service)
    }

    pub fn state_of(&self, service: &str) -> Option<NodeState> {
        self.get(service).map(|n| n.state)
    }

    pub fn contains(&self, service: &str) -> bool {
        self.get(service).is_some()
    }

    /// Nodes in the given state, in traversal order.
    pub fn in_state(&self, state: NodeState) -> impl Iterator<Item = &NodeOutcome> {
        self.nodes.iter().filter(move |n| n.state == state)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
