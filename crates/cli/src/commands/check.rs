use std::path::Path;
use std::process;

use civicnav_catalog::{Catalog, CatalogError};

use super::Context;
use crate::OutputFormat;

/// Load and validate a catalog, listing every defect found.
pub(crate) fn cmd_check(ctx: &Context, catalog: Option<&Path>) {
    let path = ctx.catalog_path(catalog);

    let catalog = match Catalog::from_path(&path) {
        Ok(c) => c,
        Err(CatalogError::Invalid { defects }) => {
            if !ctx.quiet {
                match ctx.output {
                    OutputFormat::Json => {
                        let json = serde_json::json!({
                            "valid": false,
                            "catalog": path.display().to_string(),
                            "defects": defects,
                        });
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&json)
                                .unwrap_or_else(|e| format!("serialization error: {}", e))
                        );
                    }
                    OutputFormat::Text => {
                        println!("{}: {} defect(s)", path.display(), defects.len());
                        for d in &defects {
                            println!("  - {}", d);
                        }
                    }
                }
            }
            process::exit(1);
        }
        Err(e) => ctx.fail(&format!("error: {}", e)),
    };

    if ctx.quiet {
        return;
    }
    let gated = catalog.services().iter().filter(|s| s.gated).count();
    let proactive = catalog.services().iter().filter(|s| s.proactive).count();
    match ctx.output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": true,
                "catalog": path.display().to_string(),
                "id": catalog.id(),
                "version": catalog.version(),
                "facts": catalog.facts().len(),
                "services": catalog.services().len(),
                "gated": gated,
                "proactive": proactive,
                "edges": catalog.edges().len(),
                "life_events": catalog.life_events().len(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            match catalog.version() {
                Some(v) => println!("Catalog {} (version {}): OK", catalog.id(), v),
                None => println!("Catalog {}: OK", catalog.id()),
            }
            println!("  Facts:       {}", catalog.facts().len());
            println!(
                "  Services:    {} ({} gated, {} proactive)",
                catalog.services().len(),
                gated,
                proactive
            );
            println!("  Edges:       {}", catalog.edges().len());
            println!("  Life events: {}", catalog.life_events().len());
        }
    }
}
