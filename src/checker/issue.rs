//! Issue records produced by the checker

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Issue severity
///
/// Deserializes leniently: anything other than `error` or `info` (including
/// unknown strings in a rules file) is a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Severity::from(value.as_str())
    }
}

impl From<&str> for Severity {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "error" => Severity::Error,
            "info" => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of problem was found, with the fields specific to that kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum IssueKind {
    MissingPeerDependency {
        peer_dependency: String,
        required_version: String,
    },
    PeerDependencyMismatch {
        peer_dependency: String,
        required_version: String,
        installed_version: String,
    },
    VersionIncompatibility {
        version: String,
        incompatible_with: String,
        incompatible_version: String,
        reason: String,
    },
    CompatibilityWarning {
        version: String,
        condition: String,
    },
    DeprecatedPackage {
        version: String,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        replacement: Option<String>,
    },
    EsmCommonjsConflict {
        version: String,
        compatible_version: String,
    },
    EngineMismatch {
        required: String,
        current: String,
    },
    NodeVersionEol {
        node_version: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        eol_date: Option<NaiveDate>,
    },
}

impl IssueKind {
    /// The serialized `type` tag
    pub fn type_name(&self) -> &'static str {
        match self {
            IssueKind::MissingPeerDependency { .. } => "missing-peer-dependency",
            IssueKind::PeerDependencyMismatch { .. } => "peer-dependency-mismatch",
            IssueKind::VersionIncompatibility { .. } => "version-incompatibility",
            IssueKind::CompatibilityWarning { .. } => "compatibility-warning",
            IssueKind::DeprecatedPackage { .. } => "deprecated-package",
            IssueKind::EsmCommonjsConflict { .. } => "esm-commonjs-conflict",
            IssueKind::EngineMismatch { .. } => "engine-mismatch",
            IssueKind::NodeVersionEol { .. } => "node-version-eol",
        }
    }
}

/// One compatibility problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(flatten)]
    pub kind: IssueKind,
    pub severity: Severity,
    pub package: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl Issue {
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}
