//! Conversational session with incremental recompute.
//!
//! A session owns one user's snapshot for one life event and caches the
//! outcome of every reachable service. Each mutation that changes a
//! stored value yields a [`Change`] from the store; the session looks up
//! the affected services in the catalog's reverse index, and re-classifies
//! only those that are reachable. Everything else keeps its cached
//! outcome.
//!
//! Sessions are never shared. The catalog is, through an `Arc`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use civicnav_catalog::Catalog;
use time::Date;

use crate::report::{NodeOutcome, TraversalReport};
use crate::resolver::Resolver;
use crate::traversal::{node_outcome, Reach};
use crate::types::{
    AssembleError, Change, EvalError, FactKey, FactValue, ServiceStatus, Snapshot,
};

/// Counters exposing how much work each mutation caused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecomputeStats {
    pub full_passes: usize,
    pub incremental_passes: usize,
    /// Total node classifications across all passes.
    pub nodes_recomputed: usize,
    /// Services re-classified by the most recent pass, in traversal order.
    pub last_recomputed: Vec<String>,
}

pub struct Session {
    catalog: Arc<Catalog>,
    life_event: String,
    snapshot: Snapshot,
    reach: Reach,
    outcomes: HashMap<String, NodeOutcome>,
    stats: RecomputeStats,
}

impl Session {
    /// Start an empty session for `life_event` on `today`.
    pub fn new(catalog: Arc<Catalog>, life_event: &str, today: Date) -> Result<Session, EvalError> {
        Session::with_snapshot(catalog, life_event, Snapshot::new(today))
    }

    /// Start a session from an existing snapshot.
    pub fn with_snapshot(
        catalog: Arc<Catalog>,
        life_event: &str,
        snapshot: Snapshot,
    ) -> Result<Session, EvalError> {
        let event = catalog
            .life_event(life_event)
            .ok_or_else(|| EvalError::UnknownLifeEvent {
                id: life_event.to_string(),
            })?;
        let reach = Reach::for_life_event(&catalog, event);

        let mut session = Session {
            catalog,
            life_event: life_event.to_string(),
            snapshot,
            reach,
            outcomes: HashMap::new(),
            stats: RecomputeStats::default(),
        };
        session.full_pass();
        Ok(session)
    }

    /// Record a fact and re-classify the services that read it.
    ///
    /// Returns the number of services re-classified.
    pub fn set_fact(&mut self, key: FactKey, value: FactValue) -> Result<usize, AssembleError> {
        let kind = self
            .catalog
            .fact_kind(&key)
            .ok_or_else(|| AssembleError::UndeclaredFact {
                key: key.to_string(),
            })?;
        if !value.conforms_to(kind) {
            return Err(AssembleError::TypeMismatch {
                key: key.to_string(),
                message: format!("expected {}, got {}", kind, value.type_name()),
            });
        }
        match self.snapshot.facts.set(key, value) {
            Some(change) => Ok(self.apply_change(&change)),
            None => Ok(0),
        }
    }

    /// Record a service status and re-classify the services it can affect.
    pub fn set_status(&mut self, id: &str, status: ServiceStatus) -> Result<usize, AssembleError> {
        if self.catalog.service(id).is_none() {
            return Err(AssembleError::UnknownService { id: id.to_string() });
        }
        match self.snapshot.statuses.set(id, status) {
            Some(change) => Ok(self.apply_change(&change)),
            None => Ok(0),
        }
    }

    /// Move the evaluation date. Only services with deadline rules are re-classified.
    pub fn set_today(&mut self, today: Date) -> usize {
        if today == self.snapshot.today {
            return 0;
        }
        self.snapshot.today = today;
        let affected = self.catalog.reverse_index().deadline_dependents().clone();
        self.recompute(&affected)
    }

    pub fn life_event(&self) -> &str {
        &self.life_event
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> &RecomputeStats {
        &self.stats
    }

    pub fn outcome(&self, id: &str) -> Option<&NodeOutcome> {
        self.outcomes.get(id)
    }

    /// The current outcomes as a report, in traversal order.
    pub fn report(&self) -> TraversalReport {
        let nodes = self
            .reach
            .order()
            .iter()
            .filter_map(|id| self.outcomes.get(id).cloned())
            .collect();
        TraversalReport::new(self.life_event.clone(), self.snapshot.today, nodes)
    }

    fn apply_change(&mut self, change: &Change) -> usize {
        let index = self.catalog.reverse_index();
        let affected = match change {
            Change::Fact(key) => index.affected_by_fact(key),
            Change::Status(id) => index.affected_by_status(id),
        }
        .cloned()
        .unwrap_or_default();
        self.recompute(&affected)
    }

    fn full_pass(&mut self) {
        let catalog = &*self.catalog;
        let mut resolver = Resolver::new(catalog, &self.snapshot);
        self.outcomes.clear();
        for id in self.reach.order() {
            if let Some(outcome) = node_outcome(catalog, &self.snapshot, &self.reach, id, &mut resolver) {
                self.outcomes.insert(id.clone(), outcome);
            }
        }
        self.stats.full_passes += 1;
        self.stats.nodes_recomputed += self.outcomes.len();
        self.stats.last_recomputed = self.reach.order().to_vec();
        tracing::debug!(life_event = %self.life_event, nodes = self.outcomes.len(), "full pass");
    }

    /// Re-classify the reachable members of `affected`, with a fresh memo.
    fn recompute(&mut self, affected: &BTreeSet<String>) -> usize {
        let catalog = &*self.catalog;
        let mut resolver = Resolver::new(catalog, &self.snapshot);
        let mut recomputed = Vec::new();
        for id in self.reach.order() {
            if !affected.contains(id) {
                continue;
            }
            if let Some(outcome) = node_outcome(catalog, &self.snapshot, &self.reach, id, &mut resolver) {
                self.outcomes.insert(id.clone(), outcome);
                recomputed.push(id.clone());
            }
        }
        self.stats.incremental_passes += 1;
        self.stats.nodes_recomputed += recomputed.len();
        tracing::debug!(
            life_event = %self.life_event,
            affected = affected.len(),
            recomputed = ?recomputed,
            "incremental recompute"
        );
        let count = recomputed.len();
        self.stats.last_recomputed = recomputed;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NodeState;
    use time::macros::date;

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_json(&serde_json::json!({
                "id": "t",
                "facts": [ { "key": "age", "type": "number" } ],
                "services": [
                    { "id": "root", "name": "Root" },
                    { "id": "adult", "name": "Adult",
                      "rules": [ { "kind": "comparison", "label": "18+", "field": "age", "op": ">=", "value": 18 } ] },
                    { "id": "carer", "name": "Carer",
                      "rules": [ { "kind": "boolean", "label": "carer", "field": "custom.carer" } ] },
                    { "id": "after", "name": "After" }
                ],
                "edges": [
                    { "from": "root", "to": "adult", "kind": "ENABLES" },
                    { "from": "root", "to": "carer", "kind": "ENABLES" },
                    { "from": "adult", "to": "after", "kind": "REQUIRES" }
                ],
                "life_events": [ { "id": "e", "name": "E", "entry": ["root"] } ]
            }))
            .unwrap(),
        )
    }

    #[test]
    fn fact_change_recomputes_only_its_readers() {
        let mut s = Session::new(catalog(), "e", date!(2026 - 10 - 18)).unwrap();
        assert_eq!(s.stats().full_passes, 1);
        assert_eq!(s.stats().nodes_recomputed, 4);

        let n = s.set_fact(FactKey::field("age"), FactValue::Number(30.into())).unwrap();
        assert_eq!(n, 1);
        assert_eq!(s.stats().last_recomputed, vec!["adult".to_string()]);
        assert_eq!(s.outcome("adult").unwrap().state, NodeState::Actionable);
        assert_eq!(s.outcome("carer").unwrap().state, NodeState::NeedsInfo);
    }

    #[test]
    fn unchanged_value_recomputes_nothing() {
        let mut s = Session::new(catalog(), "e", date!(2026 - 10 - 18)).unwrap();
        s.set_fact(FactKey::custom("carer"), FactValue::Bool(true)).unwrap();
        let before = s.stats().clone();
        assert_eq!(s.set_fact(FactKey::custom("carer"), FactValue::Bool(true)).unwrap(), 0);
        assert_eq!(s.stats(), &before);
    }

    #[test]
    fn status_change_reaches_requires_successors() {
        let mut s = Session::new(catalog(), "e", date!(2026 - 10 - 18)).unwrap();
        assert_eq!(s.outcome("after").unwrap().state, NodeState::Locked);
        s.set_status("adult", ServiceStatus::Completed).unwrap();
        assert_eq!(
            s.stats().last_recomputed,
            vec!["adult".to_string(), "after".to_string()]
        );
        assert_eq!(s.outcome("after").unwrap().state, NodeState::Actionable);
    }

    #[test]
    fn incremental_matches_full_pass() {
        let cat = catalog();
        let mut s = Session::new(cat.clone(), "e", date!(2026 - 10 - 18)).unwrap();
        s.set_fact(FactKey::field("age"), FactValue::Number(12.into())).unwrap();
        s.set_status("root", ServiceStatus::Receiving).unwrap();
        s.set_fact(FactKey::custom("carer"), FactValue::Bool(false)).unwrap();

        let fresh = Session::with_snapshot(cat, "e", s.snapshot().clone()).unwrap();
        assert_eq!(s.report(), fresh.report());
    }

    #[test]
    fn incremental_matches_full_pass_through_dependency_cycle() {
        let flag = |name: &str| serde_json::json!({ "kind": "boolean", "label": name, "field": format!("custom.{name}") });
        let dep = |on: &str| serde_json::json!({ "kind": "dependency", "label": on, "service": on, "condition": "receiving" });
        let cat = Arc::new(
            Catalog::from_json(&serde_json::json!({
                "id": "t",
                "services": [
                    { "id": "z", "rules": [ { "kind": "any", "label": "w or y", "children": [dep("w"), flag("y")] } ] },
                    { "id": "w", "rules": [dep("z")] },
                    { "id": "a", "rules": [dep("w"), flag("x")] }
                ],
                "life_events": [ { "id": "e", "name": "E", "entry": ["z", "a"] } ]
            }))
            .unwrap(),
        );
        let start = Snapshot::new(date!(2026 - 10 - 18)).with_fact(FactKey::custom("y"), FactValue::Bool(true));
        let mut s = Session::with_snapshot(cat.clone(), "e", start).unwrap();
        s.set_fact(FactKey::custom("x"), FactValue::Bool(true)).unwrap();
        assert_eq!(s.stats().last_recomputed, vec!["a".to_string()]);

        let fresh = Session::with_snapshot(cat, "e", s.snapshot().clone()).unwrap();
        assert_eq!(fresh.outcome("a").unwrap().state, NodeState::Actionable);
        assert_eq!(s.report(), fresh.report());
    }

    #[test]
    fn builder_snapshot_starts_with_nothing_pending() {
        let snap = Snapshot::new(date!(2026 - 10 - 18))
            .with_fact(FactKey::field("age"), FactValue::Number(30.into()))
            .with_status("root", ServiceStatus::Receiving);
        let mut s = Session::with_snapshot(catalog(), "e", snap.clone()).unwrap();
        assert_eq!(s.stats().incremental_passes, 0);

        assert_eq!(s.set_fact(FactKey::field("age"), FactValue::Number(30.into())).unwrap(), 0);
        assert_eq!(s.set_status("root", ServiceStatus::Receiving).unwrap(), 0);
        assert_eq!(s.stats().incremental_passes, 0);

        let again = Session::with_snapshot(catalog(), "e", snap).unwrap();
        assert_eq!(s.report(), again.report());
    }

    #[test]
    fn rejects_undeclared_and_mistyped_facts() {
        let mut s = Session::new(catalog(), "e", date!(2026 - 10 - 18)).unwrap();
        assert!(matches!(
            s.set_fact(FactKey::field("income"), FactValue::Bool(true)),
            Err(AssembleError::UndeclaredFact { .. })
        ));
        assert!(matches!(
            s.set_fact(FactKey::field("age"), FactValue::Bool(true)),
            Err(AssembleError::TypeMismatch { .. })
        ));
        assert!(matches!(
            s.set_status("nope", ServiceStatus::Receiving),
            Err(AssembleError::UnknownService { .. })
        ));
    }
}
