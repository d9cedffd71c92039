//! Raw-to-typed conversion with defect collection.
//!
//! Every check runs to completion: a defect in one construct never stops
//! the others from being checked. The caller gets either a fully typed
//! [`Validated`] catalog or the complete list of defects.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Deserialize;

use crate::error::Defect;
use crate::model::{
    Department, Edge, EdgeKind, FactDecl, FactKind, KeyQuestion, LifeEvent, Service,
};
use crate::raw::{RawCatalog, RawFact, RawRule, RawService};
use crate::rule::{CompareOp, Rule, StatusCondition};
use crate::values::{FactKey, FactValue};

/// A catalog whose constructs all passed validation.
#[derive(Debug)]
pub struct Validated {
    pub id: String,
    pub version: Option<String>,
    pub facts: Vec<FactDecl>,
    pub departments: Vec<Department>,
    pub services: Vec<Service>,
    pub edges: Vec<Edge>,
    pub life_events: Vec<LifeEvent>,
}

/// Validate a raw catalog, returning every defect found.
pub fn validate(raw: RawCatalog) -> Result<Validated, Vec<Defect>> {
    let mut v = Validator::default();

    let facts = v.facts(&raw.facts);
    let departments = v.departments(&raw);

    let mut seen = HashSet::new();
    for s in &raw.services {
        if !seen.insert(s.id.as_str()) {
            v.defect("Service", &s.id, None, "duplicate service id");
        }
    }
    v.service_ids = seen.into_iter().map(str::to_owned).collect();
    v.department_ids = departments.iter().map(|d| d.id.clone()).collect();

    let services: Vec<Service> = raw.services.iter().filter_map(|s| v.service(s)).collect();
    let edges = v.edges(&raw);
    let life_events = v.life_events(&raw);

    if v.defects.is_empty() {
        Ok(Validated {
            id: raw.id,
            version: raw.version,
            facts,
            departments,
            services,
            edges,
            life_events,
        })
    } else {
        Err(v.defects)
    }
}

#[derive(Default)]
struct Validator {
    defects: Vec<Defect>,
    schema: HashMap<FactKey, FactKind>,
    service_ids: HashSet<String>,
    department_ids: HashSet<String>,
}

impl Validator {
    fn defect(&mut self, kind: &str, id: &str, field: Option<&str>, message: impl Into<String>) {
        self.defects.push(Defect::new(kind, id, field, message));
    }

    // ──────────────────────────────────────────────
    // Fact schema
    // ──────────────────────────────────────────────

    fn facts(&mut self, raw: &[RawFact]) -> Vec<FactDecl> {
        let mut decls = Vec::new();
        for f in raw {
            let key = match f.key.parse::<FactKey>() {
                Ok(FactKey::Custom(_)) => {
                    self.defect(
                        "Fact",
                        &f.key,
                        Some("key"),
                        "custom-bag keys are implicit and must not be declared",
                    );
                    continue;
                }
                Ok(k) if k.name() == "custom" => {
                    self.defect("Fact", &f.key, Some("key"), "'custom' is a reserved key");
                    continue;
                }
                Ok(k) => k,
                Err(e) => {
                    self.defect("Fact", &f.key, Some("key"), e);
                    continue;
                }
            };
            let kind = match f.kind.as_str() {
                "number" => FactKind::Number,
                "boolean" => FactKind::Boolean,
                "date" => FactKind::Date,
                "enum" => {
                    if f.values.is_empty() {
                        self.defect("Fact", &f.key, Some("values"), "enum fact declares no values");
                        continue;
                    }
                    FactKind::Enum {
                        values: f.values.clone(),
                    }
                }
                other => {
                    self.defect(
                        "Fact",
                        &f.key,
                        Some("type"),
                        format!("unknown fact type '{}'", other),
                    );
                    continue;
                }
            };
            if self.schema.contains_key(&key) {
                self.defect("Fact", &f.key, None, "duplicate fact key");
                continue;
            }
            self.schema.insert(key.clone(), kind.clone());
            decls.push(FactDecl {
                key,
                kind,
                label: f.label.clone(),
            });
        }
        decls
    }

    /// Resolve a fact key referenced from a rule or question.
    fn lookup_fact(&mut self, owner: &str, context: &str, raw_key: &str) -> Option<(FactKey, FactKind)> {
        let key = match raw_key.parse::<FactKey>() {
            Ok(k) => k,
            Err(e) => {
                self.defect("Service", owner, Some("rules"), format!("{}{}", context, e));
                return None;
            }
        };
        if key.is_custom() {
            return Some((key, FactKind::Boolean));
        }
        match self.schema.get(&key) {
            Some(kind) => Some((key, kind.clone())),
            None => {
                self.defect(
                    "Service",
                    owner,
                    Some("rules"),
                    format!("{}unknown fact '{}'", context, raw_key),
                );
                None
            }
        }
    }

    // ──────────────────────────────────────────────
    // Departments and services
    // ──────────────────────────────────────────────

    fn departments(&mut self, raw: &RawCatalog) -> Vec<Department> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for d in &raw.departments {
            if !seen.insert(d.id.as_str()) {
                self.defect("Department", &d.id, None, "duplicate department id");
                continue;
            }
            out.push(Department {
                id: d.id.clone(),
                name: d.name.clone().unwrap_or_else(|| d.id.clone()),
                contact: d.contact.clone(),
            });
        }
        out
    }

    fn service(&mut self, s: &RawService) -> Option<Service> {
        let before = self.defects.len();

        if let Some(dept) = &s.department {
            if !self.department_ids.contains(dept) {
                self.defect(
                    "Service",
                    &s.id,
                    Some("department"),
                    format!("unknown department '{}'", dept),
                );
            }
        }

        let mut key_questions = Vec::new();
        for q in &s.key_questions {
            let context = format!("key question '{}': ", q.text);
            if let Some((fact, _)) = self.lookup_fact(&s.id, &context, &q.fact) {
                key_questions.push(KeyQuestion {
                    fact,
                    text: q.text.clone(),
                });
            }
        }

        let rules: Vec<Rule> = s
            .rules
            .iter()
            .filter_map(|r| self.rule(&s.id, r))
            .collect();

        if self.defects.len() > before {
            return None;
        }
        Some(Service {
            id: s.id.clone(),
            name: s.name.clone().unwrap_or_else(|| s.id.clone()),
            department: s.department.clone(),
            gated: s.gated,
            proactive: s.proactive,
            contact: s.contact.clone(),
            rates: s.rates.clone(),
            key_questions,
            rules,
        })
    }

    // ──────────────────────────────────────────────
    // Rules
    // ──────────────────────────────────────────────

    fn rule_defect(&mut self, owner: &str, label: &str, message: impl Into<String>) {
        let message = message.into();
        let message = if label.is_empty() {
            message
        } else {
            format!("rule '{}': {}", label, message)
        };
        self.defect("Service", owner, Some("rules"), message);
    }

    /// Decode and convert one rule. Returns `None` if this rule or any
    /// descendant has a defect; descendants are still checked.
    fn rule(&mut self, owner: &str, raw: &serde_json::Value) -> Option<Rule> {
        let decoded = match RawRule::deserialize(raw) {
            Ok(r) => r,
            Err(e) => {
                let label = raw
                    .get("label")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default();
                self.rule_defect(owner, label, format!("malformed rule: {}", e));
                return None;
            }
        };
        match &decoded {
            RawRule::Boolean {
                label,
                field,
                expected,
            } => {
                let (field, kind) = self.lookup_fact(owner, &rule_context(label), field)?;
                if kind != FactKind::Boolean {
                    self.rule_defect(
                        owner,
                        label,
                        format!("boolean rule on {} fact '{}'", kind, field),
                    );
                    return None;
                }
                Some(Rule::Boolean {
                    label: label.clone(),
                    field,
                    expected: *expected,
                })
            }

            RawRule::Comparison {
                label,
                field,
                op,
                value,
            } => {
                let resolved = self.lookup_fact(owner, &rule_context(label), field);
                let parsed_op = CompareOp::parse(op);
                if parsed_op.is_none() {
                    self.rule_defect(owner, label, format!("unknown operator '{}'", op));
                }
                let ((field, kind), op) = (resolved?, parsed_op?);
                if op.is_relational() && !kind.is_ordered() {
                    self.rule_defect(
                        owner,
                        label,
                        format!("operator '{}' is not defined for {} fact '{}'", op, kind, field),
                    );
                    return None;
                }
                match FactValue::from_json(value, &kind) {
                    Ok(value) => Some(Rule::Comparison {
                        label: label.clone(),
                        field,
                        op,
                        value,
                    }),
                    Err(e) => {
                        self.rule_defect(
                            owner,
                            label,
                            format!("literal does not match fact '{}': {}", field, e),
                        );
                        None
                    }
                }
            }

            RawRule::EnumMembership {
                label,
                field,
                values,
            } => {
                let (field, kind) = self.lookup_fact(owner, &rule_context(label), field)?;
                let declared = match kind {
                    FactKind::Enum { values } => values,
                    other => {
                        self.rule_defect(
                            owner,
                            label,
                            format!("enum-membership rule on {} fact '{}'", other, field),
                        );
                        return None;
                    }
                };
                if values.is_empty() {
                    self.rule_defect(owner, label, "enum-membership rule lists no values");
                    return None;
                }
                let undeclared: Vec<&String> =
                    values.iter().filter(|v| !declared.contains(v)).collect();
                if !undeclared.is_empty() {
                    self.rule_defect(
                        owner,
                        label,
                        format!("values {:?} are not declared for fact '{}'", undeclared, field),
                    );
                    return None;
                }
                Some(Rule::EnumMembership {
                    label: label.clone(),
                    field,
                    values: values.iter().cloned().collect::<BTreeSet<_>>(),
                })
            }

            RawRule::Deadline {
                label,
                trigger,
                max_days,
            } => {
                let (trigger, kind) = self.lookup_fact(owner, &rule_context(label), trigger)?;
                if kind != FactKind::Date {
                    self.rule_defect(
                        owner,
                        label,
                        format!("deadline trigger '{}' is a {} fact, not a date", trigger, kind),
                    );
                    return None;
                }
                Some(Rule::Deadline {
                    label: label.clone(),
                    trigger,
                    max_days: *max_days,
                })
            }

            RawRule::Dependency {
                label,
                service,
                condition,
            } => {
                let mut ok = true;
                if !self.service_ids.contains(service) {
                    self.rule_defect(owner, label, format!("unknown service '{}'", service));
                    ok = false;
                }
                let condition = StatusCondition::parse(condition);
                if condition.is_none() {
                    self.rule_defect(
                        owner,
                        label,
                        "dependency condition must be 'receiving' or 'completed'",
                    );
                }
                match (ok, condition) {
                    (true, Some(condition)) => Some(Rule::Dependency {
                        label: label.clone(),
                        service: service.clone(),
                        condition,
                    }),
                    _ => None,
                }
            }

            RawRule::Not { label, children } => {
                let converted = self.children(owner, children);
                if children.len() != 1 {
                    self.rule_defect(
                        owner,
                        label,
                        format!("'not' takes exactly one child, found {}", children.len()),
                    );
                    return None;
                }
                let child = converted?.into_iter().next()?;
                Some(Rule::Not {
                    label: label.clone(),
                    child: Box::new(child),
                })
            }

            RawRule::Any { label, children } => Some(Rule::Any {
                label: label.clone(),
                children: self.children(owner, children)?,
            }),

            RawRule::All { label, children } => Some(Rule::All {
                label: label.clone(),
                children: self.children(owner, children)?,
            }),
        }
    }

    fn children(&mut self, owner: &str, raw: &[serde_json::Value]) -> Option<Vec<Rule>> {
        let converted: Vec<Option<Rule>> = raw.iter().map(|r| self.rule(owner, r)).collect();
        converted.into_iter().collect()
    }

    // ──────────────────────────────────────────────
    // Edges and life events
    // ──────────────────────────────────────────────

    fn edges(&mut self, raw: &RawCatalog) -> Vec<Edge> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for e in &raw.edges {
            let id = format!("{}->{}", e.from, e.to);
            let before = self.defects.len();
            let kind = EdgeKind::parse(&e.kind);
            if kind.is_none() {
                self.defect(
                    "Edge",
                    &id,
                    Some("kind"),
                    format!("edge kind must be REQUIRES or ENABLES, got '{}'", e.kind),
                );
            }
            for (field, endpoint) in [("from", &e.from), ("to", &e.to)] {
                if !self.service_ids.contains(endpoint) {
                    self.defect(
                        "Edge",
                        &id,
                        Some(field),
                        format!("unknown service '{}'", endpoint),
                    );
                }
            }
            if e.from == e.to {
                self.defect("Edge", &id, None, "edge connects a service to itself");
            }
            if let Some(kind) = kind {
                if !seen.insert((e.from.clone(), e.to.clone(), kind)) {
                    self.defect("Edge", &id, None, format!("duplicate {} edge", kind));
                }
                if self.defects.len() == before {
                    out.push(Edge {
                        from: e.from.clone(),
                        to: e.to.clone(),
                        kind,
                    });
                }
            }
        }
        out
    }

    fn life_events(&mut self, raw: &RawCatalog) -> Vec<LifeEvent> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for le in &raw.life_events {
            let before = self.defects.len();
            if !seen.insert(le.id.as_str()) {
                self.defect("LifeEvent", &le.id, None, "duplicate life event id");
            }
            if le.entry.is_empty() {
                self.defect("LifeEvent", &le.id, Some("entry"), "life event has no entry services");
            }
            for entry in &le.entry {
                if !self.service_ids.contains(entry) {
                    self.defect(
                        "LifeEvent",
                        &le.id,
                        Some("entry"),
                        format!("unknown service '{}'", entry),
                    );
                }
            }
            if self.defects.len() == before {
                out.push(LifeEvent {
                    id: le.id.clone(),
                    name: le.name.clone().unwrap_or_else(|| le.id.clone()),
                    entry: le.entry.clone(),
                });
            }
        }
        out
    }
}

fn rule_context(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("rule '{}': ", label)
    }
}
