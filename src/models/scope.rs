//! Store scope — a namespace tag partitioning uploads into independent buckets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical bucket an upload belongs to. Chunk and upload keys are prefixed
/// with the scope, so the same file identifier never collides across scopes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreScope {
    #[default]
    Files,
    Pages,
}

impl StoreScope {
    /// Lenient query-string parsing: `pages` selects the pages scope,
    /// anything else (including absence) falls back to `files`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some("pages") => StoreScope::Pages,
            _ => StoreScope::Files,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreScope::Files => "files",
            StoreScope::Pages => "pages",
        }
    }
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
