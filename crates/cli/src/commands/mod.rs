pub(crate) mod check;
pub(crate) mod evaluate;
pub(crate) mod events;

use std::path::{Path, PathBuf};
use std::process;

use civicnav_catalog::{Catalog, CatalogError};

use crate::config::Config;
use crate::{report_error, OutputFormat};

/// Settings shared by every subcommand.
pub(crate) struct Context {
    pub output: OutputFormat,
    pub quiet: bool,
    pub config: Config,
}

impl Context {
    /// The catalog path from the command line, else from the config file.
    pub fn catalog_path(&self, flag: Option<&Path>) -> PathBuf {
        match flag.map(Path::to_path_buf).or_else(|| self.config.catalog.clone()) {
            Some(p) => p,
            None => {
                report_error(
                    "error: no catalog given (pass a path or set `catalog` in the config file)",
                    self.output,
                    self.quiet,
                );
                process::exit(1);
            }
        }
    }

    pub fn fail(&self, msg: &str) -> ! {
        report_error(msg, self.output, self.quiet);
        process::exit(1);
    }
}

/// Load a catalog, exiting with a message on any error.
///
/// Invalid catalogs list every defect.
pub(crate) fn load_catalog(ctx: &Context, path: &Path) -> Catalog {
    match Catalog::from_path(path) {
        Ok(c) => c,
        Err(CatalogError::Invalid { defects }) => {
            let mut msg = format!("error: {} has {} defect(s)", path.display(), defects.len());
            for d in &defects {
                msg.push_str(&format!("\n  - {}", d));
            }
            ctx.fail(&msg);
        }
        Err(e) => ctx.fail(&format!("error: {}", e)),
    }
}

/// Read and parse a JSON input file, exiting with a message on failure.
pub(crate) fn read_json(ctx: &Context, path: &Path, what: &str) -> serde_json::Value {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => ctx.fail(&format!("error: {} file not found: {}", what, path.display())),
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => ctx.fail(&format!("error: invalid JSON in {}: {}", path.display(), e)),
    }
}
