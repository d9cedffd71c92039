use std::fmt;

use serde::Serialize;

/// A single authoring defect found while loading a catalog.
///
/// Defects identify the offending construct the same way regardless of
/// which check found them, so a catalog maintainer can fix every one of
/// them from a single load attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Defect {
    pub construct_kind: String,
    pub construct_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Defect {
    pub fn new(
        construct_kind: &str,
        construct_id: &str,
        field: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Defect {
            construct_kind: construct_kind.to_owned(),
            construct_id: construct_id.to_owned(),
            field: field.map(str::to_owned),
            message: message.into(),
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(
                f,
                "{} '{}' ({}): {}",
                self.construct_kind, self.construct_id, field, self.message
            ),
            None => write!(
                f,
                "{} '{}': {}",
                self.construct_kind, self.construct_id, self.message
            ),
        }
    }
}

/// Errors returned when loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("could not read catalog '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not have the catalog shape.
    #[error("malformed catalog document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document parsed, but contains authoring defects.
    #[error("catalog has {} defect(s):\n{}", defects.len(), render_defects(defects))]
    Invalid { defects: Vec<Defect> },
}

impl CatalogError {
    /// The defects carried by an [`CatalogError::Invalid`] error, if any.
    pub fn defects(&self) -> &[Defect] {
        match self {
            CatalogError::Invalid { defects } => defects,
            _ => &[],
        }
    }
}

fn render_defects(defects: &[Defect]) -> String {
    defects
        .iter()
        .map(|d| format!("  - {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}
