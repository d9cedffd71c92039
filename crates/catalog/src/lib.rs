//! civicnav-catalog: the immutable service catalog.
//!
//! A catalog is versioned content (services, the edges between them,
//! life-event entry points, department contacts, rate tables) authored
//! outside this repository. This crate turns a catalog JSON document into
//! a validated [`Catalog`] value:
//!
//! 1. Deserialize into raw serde structs ([`raw`]).
//! 2. Convert raw constructs into typed domain values, collecting every
//!    authoring defect along the way ([`validate`]).
//! 3. Precompute the edge adjacency and the fact/service reverse index
//!    ([`index`]) so evaluation never re-derives them from rule trees.
//!
//! A catalog with any defect fails to load with one aggregate
//! [`CatalogError::Invalid`].

pub mod catalog;
pub mod error;
pub mod index;
pub mod model;
pub mod raw;
pub mod rule;
pub mod validate;
pub mod values;

pub use catalog::Catalog;
pub use error::{CatalogError, Defect};
pub use index::{Graph, ReverseIndex};
pub use model::{
    Contact, Department, Edge, EdgeKind, FactDecl, FactKind, KeyQuestion, LifeEvent, Rate,
    RateTable, Service,
};
pub use rule::{CompareOp, Rule, StatusCondition};
pub use values::{FactKey, FactValue};
