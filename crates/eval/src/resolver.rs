//! Dependency resolution across services.
//!
//! A `dependency` leaf asks whether the user is receiving (or has
//! completed) another service. A recorded status answers it directly.
//! Otherwise the other service's own rule set is evaluated as a proxy,
//! guarded against cycles in the rule-level dependency graph and
//! memoized for the lifetime of one resolver (one traversal or one
//! recompute pass).
//!
//! Only results that do not depend on the current resolution stack are
//! memoized. When the cycle guard cuts at a service that is still on the
//! stack after a frame returns, that frame's result is specific to the
//! path that reached it and is recomputed next time. This keeps every
//! memoized value equal to what a fresh resolver would produce, whatever
//! order services are asked in.

use std::collections::HashMap;

use civicnav_catalog::{Catalog, StatusCondition};

use crate::rules::{evaluate_all, DependencyResolver};
use crate::ternary::Evaluation;
use crate::types::Snapshot;

pub struct Resolver<'a> {
    catalog: &'a Catalog,
    snapshot: &'a Snapshot,
    memo: HashMap<String, Evaluation>,
    visiting: Vec<String>,
    /// Lowest stack position the cycle guard cut at in the current frame.
    cut: Option<usize>,
    evaluations: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, snapshot: &'a Snapshot) -> Self {
        Resolver {
            catalog,
            snapshot,
            memo: HashMap::new(),
            visiting: Vec::new(),
            cut: None,
            evaluations: 0,
        }
    }

    /// Evaluate a service's top-level rule set, memoized.
    ///
    /// A service already on the resolution stack resolves to UNKNOWN.
    pub fn evaluate_service(&mut self, id: &str) -> Evaluation {
        if let Some(hit) = self.memo.get(id) {
            return hit.clone();
        }
        if let Some(pos) = self.visiting.iter().position(|v| v == id) {
            tracing::debug!(service = id, stack = ?self.visiting, "dependency cycle, resolving to unknown");
            self.cut = lowest(self.cut, Some(pos));
            return Evaluation::unknown();
        }
        let catalog = self.catalog;
        let snapshot = self.snapshot;
        let Some(service) = catalog.service(id) else {
            tracing::warn!(service = id, "dependency on service not in catalog");
            return Evaluation::unknown();
        };

        let depth = self.visiting.len();
        let outer_cut = self.cut.take();
        self.visiting.push(id.to_string());
        self.evaluations += 1;
        let result = evaluate_all(&service.rules, snapshot, self);
        self.visiting.pop();

        // Cuts at this frame or deeper are resolved; cuts below it are not.
        let open_cut = self.cut.filter(|&pos| pos < depth);
        self.cut = lowest(outer_cut, open_cut);
        if open_cut.is_none() {
            self.memo.insert(id.to_string(), result.clone());
        }
        result
    }

    /// Number of rule sets actually evaluated (memo hits excluded).
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

fn lowest(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

impl DependencyResolver for Resolver<'_> {
    fn resolve(&mut self, service: &str, condition: StatusCondition) -> Evaluation {
        let status = self.snapshot.statuses.get(service);
        if status.is_known() {
            return Evaluation::known(status.satisfies(condition));
        }
        self.evaluate_service(service)
    }
}
