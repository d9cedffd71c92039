//! Relevance traversal over the catalog's edge graph.
//!
//! Reachability is a breadth-first walk over REQUIRES and ENABLES edges
//! from a life event's entry services. It depends only on the catalog, so
//! the reachable set of a life event is fixed; statuses and facts decide
//! each reachable node's state, in this precedence:
//!
//! 1. SATISFIED if the service itself is completed.
//! 2. LOCKED if any REQUIRES predecessor is not completed.
//! 3. HIDDEN_GATED if gated, not an entry, and no reachable ENABLES
//!    predecessor is receiving or completed.
//! 4. Otherwise the rule set decides: UNKNOWN is NEEDS_INFO, FALSE is
//!    INELIGIBLE, TRUE is ACTIONABLE.

use std::collections::{HashSet, VecDeque};

use civicnav_catalog::{Catalog, LifeEvent, Service};

use crate::report::{NodeOutcome, NodeState, Question, TraversalReport};
use crate::resolver::Resolver;
use crate::ternary::{Evaluation, Tri};
use crate::types::{EvalError, ServiceStatus, Snapshot};

/// The services reachable from one life event.
#[derive(Debug, Clone, Default)]
pub struct Reach {
    order: Vec<String>,
    members: HashSet<String>,
    entries: HashSet<String>,
}

impl Reach {
    /// Breadth-first walk from `entry`. Each id appears once even if the
    /// edge data contains a cycle or an entry is listed twice.
    pub fn from_entries(catalog: &Catalog, entry: &[String]) -> Reach {
        let mut reach = Reach::default();
        let mut queue = VecDeque::new();

        for id in entry {
            reach.entries.insert(id.clone());
            if reach.members.insert(id.clone()) {
                queue.push_back(id.as_str());
            }
        }

        while let Some(id) = queue.pop_front() {
            reach.order.push(id.to_string());
            for edge in catalog.graph().outgoing(id) {
                if reach.members.insert(edge.to.clone()) {
                    queue.push_back(edge.to.as_str());
                }
            }
        }
        reach
    }

    pub fn for_life_event(catalog: &Catalog, event: &LifeEvent) -> Reach {
        Reach::from_entries(catalog, &event.entry)
    }

    /// Reachable ids in breadth-first order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn is_entry(&self, id: &str) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Traverse a life event against a full snapshot. Stateless.
pub fn evaluate_life_event(
    catalog: &Catalog,
    snapshot: &Snapshot,
    life_event: &str,
) -> Result<TraversalReport, EvalError> {
    let event = catalog
        .life_event(life_event)
        .ok_or_else(|| EvalError::UnknownLifeEvent {
            id: life_event.to_string(),
        })?;
    Ok(traverse(catalog, snapshot, event))
}

pub fn traverse(catalog: &Catalog, snapshot: &Snapshot, event: &LifeEvent) -> TraversalReport {
    let reach = Reach::for_life_event(catalog, event);
    let mut resolver = Resolver::new(catalog, snapshot);
    let nodes: Vec<NodeOutcome> = reach
        .order()
        .iter()
        .filter_map(|id| node_outcome(catalog, snapshot, &reach, id, &mut resolver))
        .collect();
    tracing::debug!(
        life_event = %event.id,
        nodes = nodes.len(),
        rule_sets = resolver.evaluations(),
        "traversal complete"
    );
    TraversalReport::new(event.id.clone(), snapshot.today, nodes)
}

/// Classify one reachable service. `None` only for ids absent from the catalog.
pub fn node_outcome(
    catalog: &Catalog,
    snapshot: &Snapshot,
    reach: &Reach,
    id: &str,
    resolver: &mut Resolver<'_>,
) -> Option<NodeOutcome> {
    let service = catalog.service(id)?;
    let mut outcome = NodeOutcome {
        service: service.id.clone(),
        name: service.name.clone(),
        state: NodeState::Actionable,
        questions: Vec::new(),
        blocked_by: Vec::new(),
        contact: catalog.contact_for(id).cloned(),
        rates: service.rates.clone(),
        proactive: service.proactive,
    };

    if snapshot.statuses.get(id) == ServiceStatus::Completed {
        outcome.state = NodeState::Satisfied;
        return Some(outcome);
    }

    let graph = catalog.graph();
    outcome.blocked_by = graph
        .requires_predecessors(id)
        .iter()
        .filter(|p| snapshot.statuses.get(p) != ServiceStatus::Completed)
        .cloned()
        .collect();
    if !outcome.blocked_by.is_empty() {
        outcome.state = NodeState::Locked;
        return Some(outcome);
    }

    if service.gated && !reach.is_entry(id) {
        let unlocked = graph
            .enables_predecessors(id)
            .iter()
            .any(|p| reach.contains(p) && snapshot.statuses.get(p).unlocks());
        if !unlocked {
            outcome.state = NodeState::HiddenGated;
            return Some(outcome);
        }
    }

    let eval = resolver.evaluate_service(id);
    outcome.state = match eval.value {
        Tri::True => NodeState::Actionable,
        Tri::False => NodeState::Ineligible,
        Tri::Unknown => {
            outcome.questions = questions_for(catalog, service, &eval);
            NodeState::NeedsInfo
        }
    };
    Some(outcome)
}

/// Map missing facts to questions: the service's own key questions
/// first, in authored order, then any remaining fact by its label.
fn questions_for(catalog: &Catalog, service: &Service, eval: &Evaluation) -> Vec<Question> {
    let mut questions: Vec<Question> = service
        .key_questions
        .iter()
        .filter(|q| eval.missing.contains(&q.fact))
        .map(|q| Question {
            fact: q.fact.clone(),
            text: q.text.clone(),
        })
        .collect();

    for key in &eval.missing {
        if questions.iter().any(|q| &q.fact == key) {
            continue;
        }
        let text = catalog
            .fact(key)
            .and_then(|d| d.label.clone())
            .unwrap_or_else(|| key.to_string());
        questions.push(Question {
            fact: key.clone(),
            text,
        });
    }
    questions
}
