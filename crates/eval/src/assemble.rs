//! Snapshot assembly from JSON input with type checking.
//!
//! Facts arrive as one JSON object keyed by fact key:
//!
//! ```json
//! { "age": 34, "baby_born_on": "2026-09-30", "custom": { "carer": true } }
//! ```
//!
//! Each declared key is parsed and type-checked against the catalog's
//! schema. Custom-bag entries may be nested under `"custom"` or written
//! as `"custom.<name>"`; both must be booleans. `null` means "not known"
//! and is skipped. Undeclared keys are rejected, since no rule could ever
//! read them.
//!
//! Statuses arrive as `{ "<service id>": "receiving" | "completed" | ... }`.

use civicnav_catalog::values::json_type_name;
use civicnav_catalog::Catalog;
use time::Date;

use crate::types::{AssembleError, FactKey, FactStore, FactValue, ServiceStatus, Snapshot, StatusStore};

/// Build a fact store from a facts JSON object.
pub fn assemble_facts(catalog: &Catalog, facts_json: &serde_json::Value) -> Result<FactStore, AssembleError> {
    let obj = facts_json.as_object().ok_or_else(|| AssembleError::Malformed {
        message: format!("facts must be a JSON object, got {}", json_type_name(facts_json)),
    })?;

    let mut store = FactStore::new();
    for (raw_key, raw_value) in obj {
        if raw_key == "custom" {
            let bag = raw_value.as_object().ok_or_else(|| AssembleError::Malformed {
                message: format!("'custom' must be a JSON object, got {}", json_type_name(raw_value)),
            })?;
            for (name, v) in bag {
                insert(catalog, &mut store, FactKey::custom(name.clone()), v)?;
            }
            continue;
        }
        let key: FactKey = raw_key
            .parse()
            .map_err(|_| AssembleError::UndeclaredFact { key: raw_key.clone() })?;
        insert(catalog, &mut store, key, raw_value)?;
    }
    Ok(store)
}

fn insert(
    catalog: &Catalog,
    store: &mut FactStore,
    key: FactKey,
    raw: &serde_json::Value,
) -> Result<(), AssembleError> {
    let kind = catalog
        .fact_kind(&key)
        .ok_or_else(|| AssembleError::UndeclaredFact { key: key.to_string() })?;
    if raw.is_null() {
        return Ok(());
    }
    let value = FactValue::from_json(raw, kind).map_err(|message| AssembleError::TypeMismatch {
        key: key.to_string(),
        message,
    })?;
    store.set(key, value);
    Ok(())
}

/// Build a status store from a statuses JSON object.
pub fn assemble_statuses(
    catalog: &Catalog,
    statuses_json: &serde_json::Value,
) -> Result<StatusStore, AssembleError> {
    let obj = statuses_json.as_object().ok_or_else(|| AssembleError::Malformed {
        message: format!("statuses must be a JSON object, got {}", json_type_name(statuses_json)),
    })?;

    let mut store = StatusStore::new();
    for (id, raw) in obj {
        if catalog.service(id).is_none() {
            return Err(AssembleError::UnknownService { id: id.clone() });
        }
        let status = raw
            .as_str()
            .and_then(ServiceStatus::parse)
            .ok_or_else(|| AssembleError::InvalidStatus {
                id: id.clone(),
                value: raw.as_str().map(str::to_string).unwrap_or_else(|| raw.to_string()),
            })?;
        store.set(id.clone(), status);
    }
    Ok(store)
}

/// Build a full snapshot.
pub fn assemble_snapshot(
    catalog: &Catalog,
    facts_json: &serde_json::Value,
    statuses_json: &serde_json::Value,
    today: Date,
) -> Result<Snapshot, AssembleError> {
    Ok(Snapshot {
        facts: assemble_facts(catalog, facts_json)?,
        statuses: assemble_statuses(catalog, statuses_json)?,
        today,
    })
}
