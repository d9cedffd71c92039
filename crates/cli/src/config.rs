//! Optional TOML configuration for `civicnav`.
//!
//! Every setting has a command-line equivalent; flags win over the file.
//!
//! # Example
//!
//! ```toml
//! catalog = "fixtures/uk_catalog.json"
//! life_event = "having-a-baby"
//! today = "2026-10-18"
//! log = "civicnav_eval=debug"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Catalog JSON document. Relative paths resolve against the config file.
    pub catalog: Option<PathBuf>,
    /// Default life event for `evaluate`.
    pub life_event: Option<String>,
    /// Evaluation date override (`YYYY-MM-DD`).
    pub today: Option<String>,
    /// `tracing` filter directive, used when `CIVICNAV_LOG` is unset.
    pub log: Option<String>,
}

/// Read and parse a config file from `path`.
///
/// Returns a human-readable error string on failure.
pub fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let mut config: Config =
        toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;

    if let (Some(catalog), Some(dir)) = (config.catalog.as_ref(), path.parent()) {
        if catalog.is_relative() {
            config.catalog = Some(dir.join(catalog));
        }
    }
    Ok(config)
}
