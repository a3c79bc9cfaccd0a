//! Check results and the summaries derived from them

use serde::Serialize;

use crate::checker::issue::{Issue, Severity};

/// Issues found by one `check` run, in pass order then discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub types: TypeCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounts {
    /// Missing and mismatched peers
    pub peer_dependency: usize,
    pub version_incompatibility: usize,
    pub deprecated: usize,
    pub esm: usize,
    /// Engine mismatches and end-of-life runtimes
    pub engine: usize,
}

/// Issues bucketed by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssuesBySeverity<'a> {
    pub error: Vec<&'a Issue>,
    pub warning: Vec<&'a Issue>,
    pub info: Vec<&'a Issue>,
}

impl CheckReport {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn by_severity(&self) -> IssuesBySeverity<'_> {
        let mut grouped = IssuesBySeverity::default();
        for issue in &self.issues {
            match issue.severity {
                Severity::Error => grouped.error.push(issue),
                Severity::Warning => grouped.warning.push(issue),
                Severity::Info => grouped.info.push(issue),
            }
        }
        grouped
    }

    pub fn summary(&self) -> Summary {
        let grouped = self.by_severity();
        let count_types = |predicate: fn(&str) -> bool| {
            self.issues
                .iter()
                .filter(|i| predicate(i.type_name()))
                .count()
        };

        Summary {
            total: self.issues.len(),
            errors: grouped.error.len(),
            warnings: grouped.warning.len(),
            info: grouped.info.len(),
            types: TypeCounts {
                peer_dependency: count_types(|t| t.contains("peer-dependency")),
                version_incompatibility: count_types(|t| t == "version-incompatibility"),
                deprecated: count_types(|t| t == "deprecated-package"),
                esm: count_types(|t| t == "esm-commonjs-conflict"),
                engine: count_types(|t| t.contains("engine") || t.contains("node-version")),
            },
        }
    }
}
