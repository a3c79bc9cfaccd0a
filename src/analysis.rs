//! End-to-end analysis of one project directory

use std::path::Path;

use tracing::{info, warn};

use crate::checker::{CheckReport, CompatibilityChecker};
use crate::ecosystem::Ecosystem;
use crate::graph::DependencyGraph;
use crate::parser::traits::ParseError;
use crate::parser::types::ProjectData;
use crate::rules::RulesStore;
use crate::runtime::Runtime;

/// Everything a `check` run produces
#[derive(Debug)]
pub struct Analysis {
    pub project: ProjectData,
    pub graph: DependencyGraph,
    pub report: CheckReport,
}

/// Parse the project and build its dependency graph
pub fn load_graph(
    ecosystem: &dyn Ecosystem,
    project_dir: &Path,
) -> Result<(ProjectData, DependencyGraph), ParseError> {
    let project = ecosystem.parse_project(project_dir)?;
    if !project.has_lockfile {
        warn!("No lockfile found; only declared dependencies are known");
    }
    let graph = DependencyGraph::build_from_project(&project);
    Ok((project, graph))
}

/// Parse, build the graph and run every compatibility check
pub fn analyze(
    ecosystem: &dyn Ecosystem,
    project_dir: &Path,
    rules: &RulesStore,
    runtime: &Runtime,
) -> Result<Analysis, ParseError> {
    info!("Analyzing {:?} as {} project", project_dir, ecosystem.name());
    let (project, graph) = load_graph(ecosystem, project_dir)?;
    let report = CompatibilityChecker::new(rules, runtime).check(&graph, &project.metadata);

    Ok(Analysis {
        project,
        graph,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecosystem::NpmEcosystem;
    use tempfile::TempDir;

    #[test]
    fn analyze_reports_issues_from_lockfile_packages() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "app", "version": "1.0.0", "dependencies": {"node-sass": "^9.0.0"}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("package-lock.json"),
            r#"{
  "lockfileVersion": 3,
  "packages": {
    "": { "name": "app", "version": "1.0.0" },
    "node_modules/node-sass": { "version": "9.0.0" }
  }
}"#,
        )
        .unwrap();
        let ecosystem = NpmEcosystem::offline();
        let rules = ecosystem.load_rules().unwrap();

        let analysis = analyze(&ecosystem, dir.path(), &rules, &Runtime::unknown()).unwrap();

        assert_eq!(analysis.graph.get_stats().total_packages, 1);
        assert_eq!(analysis.report.issues()[0].type_name(), "deprecated-package");
        assert!(analysis.project.has_lockfile);
    }

    #[test]
    fn analyze_fails_without_manifest() {
        let dir = TempDir::new().unwrap();
        let ecosystem = NpmEcosystem::offline();

        let result = analyze(&ecosystem, dir.path(), &RulesStore::default(), &Runtime::unknown());

        assert!(matches!(result, Err(ParseError::MissingManifest(_))));
    }
}
