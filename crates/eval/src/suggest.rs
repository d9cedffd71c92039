//! Proactive suggestions outside the selected life event.

use civicnav_catalog::Catalog;

use crate::report::{NodeOutcome, NodeState, TraversalReport};
use crate::resolver::Resolver;
use crate::traversal::{node_outcome, Reach};
use crate::types::Snapshot;

/// Proactive services the traversal did not reach that the user can act
/// on right now.
///
/// Services with any recorded status are skipped, as are locked or gated
/// ones: outside a traversal there is no predecessor to unlock them.
pub fn proactive_suggestions(
    catalog: &Catalog,
    snapshot: &Snapshot,
    report: &TraversalReport,
) -> Vec<NodeOutcome> {
    let outside = Reach::default();
    let mut resolver = Resolver::new(catalog, snapshot);
    catalog
        .services()
        .iter()
        .filter(|s| s.proactive && !report.contains(&s.id))
        .filter(|s| !snapshot.statuses.get(&s.id).is_known())
        .filter_map(|s| node_outcome(catalog, snapshot, &outside, &s.id, &mut resolver))
        .filter(|n| n.state == NodeState::Actionable)
        .collect()
}
