//! The loaded, immutable catalog.

use std::collections::HashMap;
use std::path::Path;

use crate::error::CatalogError;
use crate::index::{Graph, ReverseIndex};
use crate::model::{Contact, Department, Edge, FactDecl, FactKind, LifeEvent, Service};
use crate::raw::RawCatalog;
use crate::validate::{validate, Validated};
use crate::values::FactKey;

static CUSTOM_KIND: FactKind = FactKind::Boolean;

/// Services, edges and life events, validated and indexed.
///
/// A `Catalog` is read-only after loading. Share one across sessions
/// with `Arc<Catalog>`; nothing in it is session-specific.
#[derive(Debug, Clone)]
pub struct Catalog {
    id: String,
    version: Option<String>,
    facts: Vec<FactDecl>,
    departments: Vec<Department>,
    services: Vec<Service>,
    edges: Vec<Edge>,
    life_events: Vec<LifeEvent>,
    // HashMap indexes for O(1) lookups by ID
    fact_index: HashMap<FactKey, usize>,
    department_index: HashMap<String, usize>,
    service_index: HashMap<String, usize>,
    life_event_index: HashMap<String, usize>,
    graph: Graph,
    reverse: ReverseIndex,
}

impl Catalog {
    /// Load a catalog from a JSON value.
    pub fn from_json(doc: &serde_json::Value) -> Result<Catalog, CatalogError> {
        let raw: RawCatalog = serde_json::from_value(doc.clone())?;
        Self::from_raw(raw)
    }

    /// Load a catalog from JSON text.
    pub fn from_json_str(text: &str) -> Result<Catalog, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Load a catalog from a JSON file.
    pub fn from_path(path: &Path) -> Result<Catalog, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Validate a raw document and build the indexes.
    pub fn from_raw(raw: RawCatalog) -> Result<Catalog, CatalogError> {
        let validated = validate(raw).map_err(|defects| {
            tracing::warn!(count = defects.len(), "catalog rejected");
            CatalogError::Invalid { defects }
        })?;
        let catalog = Catalog::new(validated);
        tracing::info!(
            catalog = %catalog.id,
            version = catalog.version.as_deref().unwrap_or("-"),
            services = catalog.services.len(),
            edges = catalog.edges.len(),
            life_events = catalog.life_events.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    fn new(v: Validated) -> Catalog {
        let fact_index = v
            .facts
            .iter()
            .enumerate()
            .map(|(i, f)| (f.key.clone(), i))
            .collect();
        let department_index = v
            .departments
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        let service_index = v
            .services
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        let life_event_index = v
            .life_events
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        let graph = Graph::build(&v.edges);
        let reverse = ReverseIndex::build(&v.services, &graph);
        Catalog {
            id: v.id,
            version: v.version,
            facts: v.facts,
            departments: v.departments,
            services: v.services,
            edges: v.edges,
            life_events: v.life_events,
            fact_index,
            department_index,
            service_index,
            life_event_index,
            graph,
            reverse,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn facts(&self) -> &[FactDecl] {
        &self.facts
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn life_events(&self) -> &[LifeEvent] {
        &self.life_events
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn reverse_index(&self) -> &ReverseIndex {
        &self.reverse
    }

    /// Look up a fact declaration by key. Custom-bag keys have none.
    pub fn fact(&self, key: &FactKey) -> Option<&FactDecl> {
        self.fact_index.get(key).map(|&i| &self.facts[i])
    }

    /// The declared kind of `key`; custom-bag keys are always boolean.
    pub fn fact_kind(&self, key: &FactKey) -> Option<&FactKind> {
        match key {
            FactKey::Custom(_) => Some(&CUSTOM_KIND),
            FactKey::Field(_) => self.fact(key).map(|f| &f.kind),
        }
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.department_index.get(id).map(|&i| &self.departments[i])
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.service_index.get(id).map(|&i| &self.services[i])
    }

    pub fn life_event(&self, id: &str) -> Option<&LifeEvent> {
        self.life_event_index.get(id).map(|&i| &self.life_events[i])
    }

    /// Contact for a service: its own override, else its department's
    /// default, else `None`.
    pub fn contact_for(&self, service_id: &str) -> Option<&Contact> {
        let svc = self.service(service_id)?;
        svc.contact.as_ref().or_else(|| {
            svc.department
                .as_deref()
                .and_then(|d| self.department(d))
                .and_then(|d| d.contact.as_ref())
        })
    }
}
