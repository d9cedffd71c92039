//! Service status store: the user's recorded relationship to each service.

use std::collections::BTreeMap;
use std::fmt;

use civicnav_catalog::StatusCondition;
use serde::{Deserialize, Serialize};

use super::Change;

/// What the user has told us about one service.
///
/// Every service starts `Unknown`. Statuses change only on explicit
/// confirmation from the user; the engine never infers them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Receiving,
    Completed,
    NotApplicable,
}

impl ServiceStatus {
    pub fn parse(s: &str) -> Option<ServiceStatus> {
        match s {
            "unknown" => Some(ServiceStatus::Unknown),
            "receiving" => Some(ServiceStatus::Receiving),
            "completed" => Some(ServiceStatus::Completed),
            "not-applicable" => Some(ServiceStatus::NotApplicable),
            _ => None,
        }
    }

    pub fn is_known(self) -> bool {
        self != ServiceStatus::Unknown
    }

    /// Whether this status satisfies a dependency condition.
    pub fn satisfies(self, condition: StatusCondition) -> bool {
        matches!(
            (self, condition),
            (ServiceStatus::Receiving, StatusCondition::Receiving)
                | (ServiceStatus::Completed, StatusCondition::Completed)
        )
    }

    /// Whether an ENABLES edge from a service with this status unlocks gated successors.
    pub fn unlocks(self) -> bool {
        matches!(self, ServiceStatus::Receiving | ServiceStatus::Completed)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceStatus::Unknown => "unknown",
            ServiceStatus::Receiving => "receiving",
            ServiceStatus::Completed => "completed",
            ServiceStatus::NotApplicable => "not-applicable",
        })
    }
}

/// Per-service status store for one session.
#[derive(Debug, Clone, Default)]
pub struct StatusStore {
    statuses: BTreeMap<String, ServiceStatus>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of `id`; services never mentioned are `Unknown`.
    pub fn get(&self, id: &str) -> ServiceStatus {
        self.statuses.get(id).copied().unwrap_or_default()
    }

    /// Record a status. Returns the change event if the stored status changed.
    pub fn set(&mut self, id: impl Into<String>, status: ServiceStatus) -> Option<Change> {
        let id = id.into();
        if self.get(&id) == status {
            return None;
        }
        self.statuses.insert(id.clone(), status);
        Some(Change::Status(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ServiceStatus)> {
        self.statuses.iter()
    }
}
