//! Common types for the version layer

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parser::types::DependencyMap;

/// Registry view of one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryEntry {
    pub name: String,
    /// `latest` dist-tag, if the registry publishes one
    pub latest: Option<String>,
    /// Published versions, lowest first
    pub versions: Vec<String>,
    /// Deprecation message per deprecated version
    pub deprecated: IndexMap<String, String>,
    /// Peer dependencies declared by the latest version
    pub peer_dependencies: DependencyMap,
    /// Engine requirements declared by the latest version
    pub engines: DependencyMap,
}

impl RegistryEntry {
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Deprecation message for `version`, if it was deprecated
    pub fn deprecation(&self, version: &str) -> Option<&str> {
        self.deprecated.get(version).map(String::as_str)
    }

    /// Whether the latest release is deprecated
    pub fn is_latest_deprecated(&self) -> bool {
        self.latest
            .as_deref()
            .is_some_and(|latest| self.deprecated.contains_key(latest))
    }
}
