//! Compatibility checker
//!
//! Runs five independent passes over a [`DependencyGraph`] against a loaded
//! [`RulesStore`]:
//!
//! 1. peer dependencies (missing or mismatched)
//! 2. known version incompatibilities and engine-conditioned warnings
//! 3. deprecated packages
//! 4. ESM-only packages in CommonJS projects
//! 5. engine requirements and end-of-life runtimes
//!
//! Every problem found is an [`Issue`] in the returned [`CheckReport`]; a
//! check run itself cannot fail. Each call builds a fresh report, so one
//! checker can be shared across threads.

pub mod issue;
pub mod report;

use tracing::{debug, info, warn};

pub use issue::{Issue, IssueKind, Severity};
pub use report::{CheckReport, IssuesBySeverity, Summary, TypeCounts};

use crate::graph::DependencyGraph;
use crate::parser::types::{ModuleType, ProjectMetadata};
use crate::rules::{EngineStatus, RulesStore};
use crate::runtime::Runtime;
use crate::version::condition::condition_holds;
use crate::version::matcher::{satisfies, satisfies_version};

/// Issue package name used for runtime-wide problems
const NODE_PACKAGE: &str = "node";

pub struct CompatibilityChecker<'a> {
    rules: &'a RulesStore,
    runtime: &'a Runtime,
}

impl<'a> CompatibilityChecker<'a> {
    pub fn new(rules: &'a RulesStore, runtime: &'a Runtime) -> Self {
        Self { rules, runtime }
    }

    /// Run every pass and return the issues found, in pass order
    pub fn check(&self, graph: &DependencyGraph, metadata: &ProjectMetadata) -> CheckReport {
        let mut issues = Vec::new();
        issues.extend(self.check_peer_dependencies(graph));
        issues.extend(self.check_version_incompatibilities(graph));
        issues.extend(self.check_deprecated(graph));
        issues.extend(self.check_esm_compatibility(graph, metadata));
        issues.extend(self.check_engine_requirements(graph, metadata));

        let report = CheckReport::new(issues);
        let summary = report.summary();
        info!(
            "Check finished: {} issues ({} errors, {} warnings, {} info)",
            summary.total, summary.errors, summary.warnings, summary.info
        );
        report
    }

    fn check_peer_dependencies(&self, graph: &DependencyGraph) -> Vec<Issue> {
        let mut issues = Vec::new();

        for node in graph.packages() {
            for (peer, required) in &node.peer_dependencies {
                match graph.get_node(peer) {
                    None => issues.push(Issue {
                        kind: IssueKind::MissingPeerDependency {
                            peer_dependency: peer.clone(),
                            required_version: required.clone(),
                        },
                        severity: Severity::Error,
                        package: node.name.clone(),
                        message: format!(
                            "{}@{} requires peer dependency {}@{}, which is not installed",
                            node.name, node.version, peer, required
                        ),
                        fix: Some(format!("npm install {}@\"{}\"", peer, required)),
                    }),
                    Some(installed) if !satisfies(&installed.version, required) => {
                        issues.push(Issue {
                            kind: IssueKind::PeerDependencyMismatch {
                                peer_dependency: peer.clone(),
                                required_version: required.clone(),
                                installed_version: installed.version.clone(),
                            },
                            severity: Severity::Error,
                            package: node.name.clone(),
                            message: format!(
                                "{}@{} requires peer dependency {}@{}, but {} is installed",
                                node.name, node.version, peer, required, installed.version
                            ),
                            fix: Some(format!("npm install {}@\"{}\"", peer, required)),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        debug!("Peer dependency pass: {} issues", issues.len());
        issues
    }

    fn check_version_incompatibilities(&self, graph: &DependencyGraph) -> Vec<Issue> {
        let mut issues = Vec::new();

        for rule in &self.rules.incompatibilities {
            let Some(node) = graph.get_node(&rule.package) else {
                continue;
            };
            if let Some(gate) = &rule.version
                && !satisfies(&node.version, gate)
            {
                continue;
            }

            for conflict in &rule.incompatible_with {
                let Some(other) = graph.get_node(&conflict.incompatible_package) else {
                    continue;
                };
                if !satisfies(&other.version, &conflict.version_range) {
                    continue;
                }

                issues.push(Issue {
                    kind: IssueKind::VersionIncompatibility {
                        version: node.version.clone(),
                        incompatible_with: other.name.clone(),
                        incompatible_version: other.version.clone(),
                        reason: conflict.reason.clone(),
                    },
                    severity: conflict.severity.unwrap_or(Severity::Error),
                    package: node.name.clone(),
                    message: format!(
                        "{}@{} is incompatible with {}@{}: {}",
                        node.name, node.version, other.name, other.version, conflict.reason
                    ),
                    fix: conflict.fix.clone(),
                });
            }

            for warning in &rule.warnings {
                if !condition_holds(&warning.condition, self.runtime) {
                    continue;
                }

                issues.push(Issue {
                    kind: IssueKind::CompatibilityWarning {
                        version: node.version.clone(),
                        condition: warning.condition.clone(),
                    },
                    severity: warning.severity.unwrap_or(Severity::Warning),
                    package: node.name.clone(),
                    message: warning.message.clone(),
                    fix: None,
                });
            }
        }

        debug!("Version incompatibility pass: {} issues", issues.len());
        issues
    }

    fn check_deprecated(&self, graph: &DependencyGraph) -> Vec<Issue> {
        let issues: Vec<Issue> = self
            .rules
            .deprecated
            .iter()
            .filter_map(|rule| {
                let node = graph.get_node(&rule.package)?;
                let fix = rule.fix.clone().or_else(|| {
                    rule.replacement
                        .as_ref()
                        .map(|replacement| format!("Replace {} with {}", rule.package, replacement))
                });

                Some(Issue {
                    kind: IssueKind::DeprecatedPackage {
                        version: node.version.clone(),
                        reason: rule.reason.clone(),
                        replacement: rule.replacement.clone(),
                    },
                    severity: rule.severity.unwrap_or(Severity::Warning),
                    package: rule.package.clone(),
                    message: format!("{} is deprecated: {}", rule.package, rule.reason),
                    fix,
                })
            })
            .collect();

        debug!("Deprecation pass: {} issues", issues.len());
        issues
    }

    fn check_esm_compatibility(
        &self,
        graph: &DependencyGraph,
        metadata: &ProjectMetadata,
    ) -> Vec<Issue> {
        if metadata.module_type == ModuleType::Module {
            debug!("ESM pass skipped: project is an ES module");
            return Vec::new();
        }

        let issues: Vec<Issue> = self
            .rules
            .esm_only
            .iter()
            .filter_map(|rule| {
                let node = graph.get_node(&rule.package)?;
                if let Some(gate) = &rule.version
                    && !satisfies(&node.version, gate)
                {
                    return None;
                }

                Some(Issue {
                    kind: IssueKind::EsmCommonjsConflict {
                        version: node.version.clone(),
                        compatible_version: rule.compatible_version.clone(),
                    },
                    severity: rule.severity.unwrap_or(Severity::Error),
                    package: rule.package.clone(),
                    message: rule.message.clone(),
                    fix: Some(format!(
                        "npm install {}@{} (last CommonJS release) or set \"type\": \"module\"",
                        rule.package, rule.compatible_version
                    )),
                })
            })
            .collect();

        debug!("ESM pass: {} issues", issues.len());
        issues
    }

    fn check_engine_requirements(
        &self,
        graph: &DependencyGraph,
        metadata: &ProjectMetadata,
    ) -> Vec<Issue> {
        let Some(current) = self.runtime.node_version() else {
            warn!("Node.js version unknown; skipping engine checks");
            return Vec::new();
        };
        let mut issues = Vec::new();

        if let Some(required) = metadata.node_engine()
            && !satisfies_version(current, required)
        {
            issues.push(Issue {
                kind: IssueKind::EngineMismatch {
                    required: required.to_string(),
                    current: current.to_string(),
                },
                severity: Severity::Error,
                package: metadata.name.clone(),
                message: format!(
                    "Project requires Node.js {}, but the current version is {}",
                    required, current
                ),
                fix: Some(format!("Switch to a Node.js version matching {}", required)),
            });
        }

        for node in graph.packages() {
            let Some(required) = node.node_engine() else {
                continue;
            };
            if satisfies_version(current, required) {
                continue;
            }

            issues.push(Issue {
                kind: IssueKind::EngineMismatch {
                    required: required.to_string(),
                    current: current.to_string(),
                },
                severity: Severity::Warning,
                package: node.name.clone(),
                message: format!(
                    "{}@{} requires Node.js {}, but the current version is {}",
                    node.name, node.version, required, current
                ),
                fix: None,
            });
        }

        if let Some(lifecycle) = self.rules.node_version(current.major)
            && lifecycle.status == EngineStatus::EndOfLife
        {
            let message = lifecycle.message.clone().unwrap_or_else(|| {
                format!("Node.js {} has reached end-of-life", current.major)
            });
            issues.push(Issue {
                kind: IssueKind::NodeVersionEol {
                    node_version: current.to_string(),
                    eol_date: lifecycle.eol_date,
                },
                severity: lifecycle.severity.unwrap_or(Severity::Warning),
                package: NODE_PACKAGE.to_string(),
                message,
                fix: Some("Upgrade to an active LTS release of Node.js".to_string()),
            });
        }

        debug!("Engine pass: {} issues", issues.len());
        issues
    }
}
