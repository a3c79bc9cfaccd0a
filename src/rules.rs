//! Compatibility rules database
//!
//! A [`RulesStore`] is loaded once, explicitly, and then only read. A missing
//! or malformed rules file is an error; there is no silent fallback to an
//! empty ruleset.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::checker::issue::Severity;

/// Ruleset shipped with the binary
const BUILTIN_RULES: &str = include_str!("../rules/npm.json");

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("Failed to read rules file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed rules in {origin}: {source}")]
    Malformed {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A package known to break alongside certain versions of other packages
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompatibilityRule {
    pub package: String,
    /// Versions of `package` the rule applies to; absent means all
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub incompatible_with: Vec<IncompatiblePackage>,
    #[serde(default)]
    pub warnings: Vec<WarningRule>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompatiblePackage {
    pub incompatible_package: String,
    pub version_range: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    pub reason: String,
    #[serde(default)]
    pub fix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WarningRule {
    /// Engine predicate such as `node<16.0.0`
    pub condition: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeprecationRule {
    pub package: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    pub reason: String,
    #[serde(default)]
    pub replacement: Option<String>,
    #[serde(default)]
    pub fix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsmRule {
    pub package: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    pub message: String,
    pub compatible_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineStatus {
    Active,
    Maintenance,
    EndOfLife,
    #[serde(other)]
    Unknown,
}

/// Lifecycle entry for one Node.js major version
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVersionInfo {
    pub status: EngineStatus,
    #[serde(default)]
    pub eol_date: Option<NaiveDate>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulesStore {
    pub incompatibilities: Vec<IncompatibilityRule>,
    pub deprecated: Vec<DeprecationRule>,
    pub esm_only: Vec<EsmRule>,
    /// Keyed by major version (`"16"`, `"18"`, ...)
    pub node_versions: IndexMap<String, NodeVersionInfo>,
}

impl RulesStore {
    /// Load a rules file from disk
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        info!("Loading rules from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse rules from a JSON string
    pub fn from_json(content: &str) -> Result<Self, RulesError> {
        Self::parse(content, "inline rules")
    }

    /// The ruleset embedded in the binary
    pub fn builtin() -> Result<Self, RulesError> {
        Self::parse(BUILTIN_RULES, "built-in rules")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, RulesError> {
        let store: RulesStore =
            serde_json::from_str(content).map_err(|source| RulesError::Malformed {
                origin: origin.to_string(),
                source,
            })?;

        debug!(
            "Loaded {} incompatibility, {} deprecation, {} ESM rules and {} Node.js versions from {}",
            store.incompatibilities.len(),
            store.deprecated.len(),
            store.esm_only.len(),
            store.node_versions.len(),
            origin
        );

        Ok(store)
    }

    /// Lifecycle entry for a Node.js major version
    pub fn node_version(&self, major: u64) -> Option<&NodeVersionInfo> {
        self.node_versions.get(major.to_string().as_str())
    }
}
