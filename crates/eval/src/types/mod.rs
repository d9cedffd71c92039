//! Session-scoped value types for the civicnav evaluator.
//!
//! The catalog is shared and immutable; everything here belongs to one
//! user's session: what is known about them ([`FactStore`]), what they
//! have told us about each service ([`StatusStore`]), and the date the
//! evaluation runs on.

pub mod fact;
pub mod status;

use time::Date;

pub use civicnav_catalog::{FactKey, FactValue};
pub use fact::FactStore;
pub use status::{ServiceStatus, StatusStore};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors that can occur when running an evaluation.
///
/// Incomplete information is never an error: it evaluates to UNKNOWN.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The requested life event is not in the catalog.
    #[error("unknown life event: {id}")]
    UnknownLifeEvent { id: String },

    /// A comparison could not be applied to the operands it was given.
    #[error("type error: {message}")]
    TypeError { message: String },

    /// The fact or status input could not be turned into a snapshot.
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Errors from building a [`Snapshot`] out of JSON input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    /// A status was supplied for a service the catalog does not contain.
    #[error("unknown service: {id}")]
    UnknownService { id: String },

    /// A fact was supplied that the catalog's schema does not declare.
    #[error("undeclared fact: {key}")]
    UndeclaredFact { key: String },

    /// A fact value does not match its declared type.
    #[error("type mismatch for fact '{key}': {message}")]
    TypeMismatch { key: String, message: String },

    /// A service status string is not one of the recognised statuses.
    #[error("invalid status '{value}' for service '{id}'")]
    InvalidStatus { id: String, value: String },

    /// The input document does not have the expected shape.
    #[error("malformed input: {message}")]
    Malformed { message: String },
}

// ──────────────────────────────────────────────
// Change events
// ──────────────────────────────────────────────

/// A store mutation that changed a value, consumed by the recompute controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Change {
    Fact(FactKey),
    Status(String),
}

// ──────────────────────────────────────────────
// Snapshot
// ──────────────────────────────────────────────

/// Everything an evaluation reads besides the catalog.
///
/// `today` is always supplied by the caller; the evaluator never reads
/// the system clock.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub facts: FactStore,
    pub statuses: StatusStore,
    pub today: Date,
}

impl Snapshot {
    pub fn new(today: Date) -> Self {
        Snapshot {
            facts: FactStore::new(),
            statuses: StatusStore::new(),
            today,
        }
    }

    /// Builder-style fact setter, mostly for tests and one-shot callers.
    pub fn with_fact(mut self, key: FactKey, value: FactValue) -> Self {
        self.facts.set(key, value);
        self
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, id: impl Into<String>, status: ServiceStatus) -> Self {
        self.statuses.set(id, status);
        self
    }
}
