//! Precomputed graph adjacency and reverse dependency index.
//!
//! Both are derived once when a catalog loads. The reverse index answers
//! "which services' node state can change if this fact or this service
//! status changes", already closed transitively over `dependency`
//! references, so a conversational turn never has to walk rule trees to
//! find what to recompute.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::model::{Edge, EdgeKind, Service};
use crate::values::FactKey;

/// Outgoing and incoming edge lists per service, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    outgoing: HashMap<String, Vec<Edge>>,
    requires_preds: HashMap<String, Vec<String>>,
    enables_preds: HashMap<String, Vec<String>>,
}

impl Graph {
    pub fn build(edges: &[Edge]) -> Self {
        let mut graph = Graph::default();
        for e in edges {
            graph
                .outgoing
                .entry(e.from.clone())
                .or_default()
                .push(e.clone());
            let preds = match e.kind {
                EdgeKind::Requires => &mut graph.requires_preds,
                EdgeKind::Enables => &mut graph.enables_preds,
            };
            preds.entry(e.to.clone()).or_default().push(e.from.clone());
        }
        graph
    }

    /// Outgoing edges of `id`, REQUIRES and ENABLES alike.
    pub fn outgoing(&self, id: &str) -> &[Edge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sources of REQUIRES edges pointing at `id`.
    pub fn requires_predecessors(&self, id: &str) -> &[String] {
        self.requires_preds.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sources of ENABLES edges pointing at `id`.
    pub fn enables_predecessors(&self, id: &str) -> &[String] {
        self.enables_preds.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Reverse index from fact keys and service ids to affected services.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    by_fact: HashMap<FactKey, BTreeSet<String>>,
    by_status: HashMap<String, BTreeSet<String>>,
    deadline_dependents: BTreeSet<String>,
}

impl ReverseIndex {
    pub fn build(services: &[Service], graph: &Graph) -> Self {
        // Direct readers of each fact, and direct dependency referrers of each service.
        let mut direct_readers: HashMap<FactKey, BTreeSet<String>> = HashMap::new();
        let mut referrers: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut deadline_services = BTreeSet::new();

        for svc in services {
            for rule in &svc.rules {
                for key in rule.fact_keys() {
                    direct_readers
                        .entry(key.clone())
                        .or_default()
                        .insert(svc.id.clone());
                }
                for dep in rule.dependencies() {
                    referrers
                        .entry(dep.to_string())
                        .or_default()
                        .insert(svc.id.clone());
                }
            }
            if svc.has_deadline() {
                deadline_services.insert(svc.id.clone());
            }
        }

        let close = |seed: BTreeSet<String>| close_over_referrers(seed, &referrers);

        let by_fact = direct_readers
            .into_iter()
            .map(|(key, readers)| (key, close(readers)))
            .collect();

        let mut by_status = HashMap::new();
        for svc in services {
            let mut affected = close(BTreeSet::from([svc.id.clone()]));
            // Successors read this status for LOCKED and HIDDEN_GATED.
            for e in graph.outgoing(&svc.id) {
                affected.insert(e.to.clone());
            }
            by_status.insert(svc.id.clone(), affected);
        }

        ReverseIndex {
            by_fact,
            by_status,
            deadline_dependents: close(deadline_services),
        }
    }

    /// Services whose node state can change when `key` changes.
    pub fn affected_by_fact(&self, key: &FactKey) -> Option<&BTreeSet<String>> {
        self.by_fact.get(key)
    }

    /// Services whose node state can change when the status of `id` changes.
    pub fn affected_by_status(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.by_status.get(id)
    }

    /// Services whose evaluation depends on the current date.
    pub fn deadline_dependents(&self) -> &BTreeSet<String> {
        &self.deadline_dependents
    }

    /// Every fact key read by at least one rule.
    pub fn referenced_facts(&self) -> impl Iterator<Item = &FactKey> {
        self.by_fact.keys()
    }
}

/// Extend `seed` with every service that (transitively) depends on a member.
fn close_over_referrers(
    seed: BTreeSet<String>,
    referrers: &HashMap<String, BTreeSet<String>>,
) -> BTreeSet<String> {
    let mut closed = seed.clone();
    let mut queue: VecDeque<String> = seed.into_iter().collect();
    while let Some(id) = queue.pop_front() {
        if let Some(rs) = referrers.get(&id) {
            for r in rs {
                if closed.insert(r.clone()) {
                    queue.push_back(r.clone());
                }
            }
        }
    }
    closed
}
