use std::path::Path;

use super::{load_catalog, Context};
use crate::OutputFormat;

/// List the catalog's life events and their entry services.
pub(crate) fn cmd_events(ctx: &Context, catalog: Option<&Path>) {
    let path = ctx.catalog_path(catalog);
    let catalog = load_catalog(ctx, &path);
    if ctx.quiet {
        return;
    }

    match ctx.output {
        OutputFormat::Json => {
            let events: Vec<serde_json::Value> = catalog
                .life_events()
                .iter()
                .map(|e| serde_json::json!({ "id": e.id, "name": e.name, "entry": e.entry }))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&events)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            for e in catalog.life_events() {
                println!("{:<24} {}", e.id, e.name);
                println!("{:<24} entry: {}", "", e.entry.join(", "));
            }
        }
    }
}
