//! civicnav evaluator -- decides, for one user and one life event, which
//! catalog services are actionable, locked, hidden, ineligible, or still
//! need information.
//!
//! The evaluator takes a loaded [`Catalog`] plus a snapshot of facts and
//! service statuses, and produces a [`TraversalReport`]. Two entry points:
//!
//! - [`evaluate_life_event`]: stateless. Pass a full snapshot on every
//!   call; suited to request/response callers.
//! - [`Session`]: stateful. Mutate one fact or status at a time and only
//!   the services affected by that change are re-classified.

pub mod assemble;
pub mod compare;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod session;
pub mod suggest;
pub mod ternary;
pub mod traversal;
pub mod types;

use civicnav_catalog::Catalog;
use time::Date;

pub use report::{NodeOutcome, NodeState, Question, Summary, TraversalReport};
pub use resolver::Resolver;
pub use rules::{evaluate, evaluate_with, DependencyResolver};
pub use session::{RecomputeStats, Session};
pub use suggest::proactive_suggestions;
pub use ternary::{Evaluation, Tri};
pub use traversal::{evaluate_life_event, Reach};
pub use types::{
    AssembleError, Change, EvalError, FactKey, FactStore, FactValue, ServiceStatus, Snapshot,
    StatusStore,
};

/// Evaluate a life event from JSON facts and statuses.
///
/// Runs the full pipeline:
/// 1. Assemble and type-check the snapshot against the catalog schema
/// 2. Traverse the life event's reachable services
pub fn evaluate_json(
    catalog: &Catalog,
    facts: &serde_json::Value,
    statuses: &serde_json::Value,
    life_event: &str,
    today: Date,
) -> Result<TraversalReport, EvalError> {
    let snapshot = assemble::assemble_snapshot(catalog, facts, statuses, today)?;
    evaluate_life_event(catalog, &snapshot, life_event)
}
