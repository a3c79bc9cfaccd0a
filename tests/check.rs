//! End-to-end compatibility checks over on-disk projects

mod helper;

use rstest::rstest;
use serde_json::{Value, json};

use dep_compat::analysis::{analyze, load_graph};
use dep_compat::checker::{IssueKind, Severity};
use dep_compat::config::Config;
use dep_compat::ecosystem::{Ecosystem, NpmEcosystem};
use dep_compat::graph::{DEFAULT_MAX_DEPTH, ROOT};
use dep_compat::output::render_json;
use dep_compat::runtime::Runtime;
use helper::{ProjectFixture, lockfile_v3};

fn builtin_check(fixture: &ProjectFixture, node: &str) -> dep_compat::analysis::Analysis {
    let ecosystem = NpmEcosystem::offline();
    let rules = ecosystem.load_rules().unwrap();
    analyze(&ecosystem, fixture.path(), &rules, &Runtime::from_version(node)).unwrap()
}

fn issue_types(analysis: &dep_compat::analysis::Analysis) -> Vec<&'static str> {
    analysis
        .report
        .issues()
        .iter()
        .map(|issue| issue.type_name())
        .collect()
}

#[test]
fn react_dom_peer_mismatch_is_reported_with_installed_version() {
    let fixture = ProjectFixture::new(json!({
        "name": "app",
        "version": "1.0.0",
        "dependencies": { "react": "^17.0.0", "react-dom": "^18.0.0" }
    }))
    .with_lockfile(lockfile_v3(&[
        ("react", json!({ "version": "17.0.2" })),
        (
            "react-dom",
            json!({ "version": "18.2.0", "peerDependencies": { "react": "^18.2.0" } }),
        ),
    ]));

    let analysis = builtin_check(&fixture, "22.3.0");

    assert_eq!(issue_types(&analysis), vec!["peer-dependency-mismatch"]);
    let issue = &analysis.report.issues()[0];
    assert_eq!(issue.package, "react-dom");
    assert_eq!(issue.severity, Severity::Error);

    let stats = analysis.graph.get_stats();
    let json: Value =
        serde_json::from_str(&render_json(&analysis.report, &stats).unwrap()).unwrap();
    assert_eq!(json["issues"][0]["installedVersion"], "17.0.2");
    assert_eq!(json["issues"][0]["requiredVersion"], "^18.2.0");
    assert_eq!(json["summary"]["errors"], 1);
    assert_eq!(json["stats"]["totalPackages"], 2);
}

#[rstest]
#[case(None, vec!["deprecated-package", "esm-commonjs-conflict"])]
#[case(Some("commonjs"), vec!["deprecated-package", "esm-commonjs-conflict"])]
#[case(Some("module"), vec!["deprecated-package"])]
fn esm_only_packages_conflict_with_commonjs_projects(
    #[case] module_type: Option<&str>,
    #[case] expected: Vec<&str>,
) {
    let mut manifest = json!({
        "name": "cli-tool",
        "version": "0.1.0",
        "dependencies": { "chalk": "^5.3.0", "node-sass": "^9.0.0" }
    });
    if let Some(module_type) = module_type {
        manifest["type"] = json!(module_type);
    }
    let fixture = ProjectFixture::new(manifest).with_lockfile(lockfile_v3(&[
        ("chalk", json!({ "version": "5.3.0" })),
        ("node-sass", json!({ "version": "9.0.0" })),
    ]));

    let analysis = builtin_check(&fixture, "24.0.0");

    assert_eq!(issue_types(&analysis), expected);
    let deprecated = &analysis.report.issues()[0];
    assert_eq!(
        deprecated.kind,
        IssueKind::DeprecatedPackage {
            version: "9.0.0".to_string(),
            reason: "node-sass (LibSass) is deprecated and no longer receives updates"
                .to_string(),
            replacement: Some("sass".to_string()),
        }
    );
}

#[test]
fn known_incompatibility_is_an_error() {
    let fixture = ProjectFixture::new(json!({
        "name": "app",
        "dependencies": { "react": "^18.2.0" },
        "devDependencies": { "enzyme-adapter-react-16": "^1.15.0" }
    }))
    .with_lockfile(lockfile_v3(&[
        ("react", json!({ "version": "18.2.0" })),
        ("enzyme-adapter-react-16", json!({ "version": "1.15.7", "dev": true })),
    ]));

    let analysis = builtin_check(&fixture, "24.1.0");

    assert_eq!(issue_types(&analysis), vec!["version-incompatibility"]);
    let issue = &analysis.report.issues()[0];
    assert_eq!(issue.package, "react");
    assert_eq!(
        issue.fix.as_deref(),
        Some("Migrate tests to @testing-library/react")
    );
    let summary = analysis.report.summary();
    assert_eq!(summary.types.version_incompatibility, 1);
    assert_eq!(summary.total, summary.errors + summary.warnings + summary.info);
}

#[test]
fn old_runtime_fails_project_engine_and_is_end_of_life() {
    let fixture = ProjectFixture::new(json!({
        "name": "service",
        "engines": { "node": ">=18" },
        "dependencies": { "vite": "^5.0.0" }
    }))
    .with_lockfile(lockfile_v3(&[(
        "vite",
        json!({ "version": "5.0.0", "engines": { "node": "^18.0.0 || >=20.0.0" } }),
    )]));

    let analysis = builtin_check(&fixture, "16.20.2");

    let issues: Vec<_> = analysis
        .report
        .issues()
        .iter()
        .map(|i| (i.type_name(), i.package.as_str(), i.severity))
        .collect();
    assert_eq!(
        issues,
        vec![
            ("engine-mismatch", "service", Severity::Error),
            ("engine-mismatch", "vite", Severity::Warning),
            ("node-version-eol", "node", Severity::Warning),
        ]
    );
    assert_eq!(analysis.report.summary().types.engine, 3);
}

#[test]
fn unknown_runtime_skips_engine_checks() {
    let fixture = ProjectFixture::new(json!({
        "name": "service",
        "engines": { "node": ">=99" }
    }));
    let ecosystem = NpmEcosystem::offline();
    let rules = ecosystem.load_rules().unwrap();

    let analysis = analyze(&ecosystem, fixture.path(), &rules, &Runtime::unknown()).unwrap();

    assert!(analysis.report.is_empty());
}

#[test]
fn project_without_lockfile_has_only_root_edges() {
    let fixture = ProjectFixture::new(json!({
        "name": "fresh",
        "dependencies": { "react": "^18.0.0" },
        "devDependencies": { "typescript": "^5.0.0" },
        "peerDependencies": { "react-dom": "^18.0.0" }
    }));

    let analysis = builtin_check(&fixture, "24.0.0");

    assert!(!analysis.project.has_lockfile);
    assert!(analysis.report.is_empty());
    let stats = analysis.graph.get_stats();
    assert_eq!(stats.total_packages, 0);
    assert_eq!(stats.direct_dependencies, 2);
    assert_eq!(stats.transitive_dependencies, -2);
}

#[test]
fn lockfile_v1_tree_supports_path_queries() {
    let fixture = ProjectFixture::new(json!({
        "name": "api",
        "dependencies": { "express": "^4.18.0" }
    }))
    .with_lockfile(json!({
        "name": "api",
        "lockfileVersion": 1,
        "dependencies": {
            "express": {
                "version": "4.18.2",
                "requires": { "debug": "2.6.9" },
                "dependencies": {
                    "debug": { "version": "2.6.9", "requires": { "ms": "2.0.0" } }
                }
            },
            "ms": { "version": "2.1.3" }
        }
    }));

    let (project, graph) = load_graph(&NpmEcosystem::offline(), fixture.path()).unwrap();

    assert_eq!(project.installed["ms"].version, "2.1.3");
    assert_eq!(
        graph.find_paths(ROOT, "ms", DEFAULT_MAX_DEPTH),
        vec![vec![ROOT, "express", "debug", "ms"]]
    );
    assert_eq!(graph.get_dependents("debug"), vec!["express"]);
}

#[test]
fn config_rules_path_replaces_builtin_rules() {
    let fixture = ProjectFixture::new(json!({
        "name": "app",
        "dependencies": { "moment": "^2.29.0", "node-sass": "^9.0.0" }
    }))
    .with_lockfile(lockfile_v3(&[
        ("moment", json!({ "version": "2.29.4" })),
        ("node-sass", json!({ "version": "9.0.0" })),
    ]))
    .write(
        "compat.json",
        r#"{"deprecated": [{"package": "moment", "severity": "info", "reason": "Legacy project", "replacement": "dayjs"}]}"#,
    )
    .write(".dep-compat.json", r#"{"rulesPath": "compat.json"}"#);

    let config = Config::load(fixture.path(), None).unwrap();
    let ecosystem = NpmEcosystem::offline().with_rules_path(config.resolved_rules_path());
    let rules = ecosystem.load_rules().unwrap();

    let analysis = analyze(&ecosystem, fixture.path(), &rules, &Runtime::unknown()).unwrap();

    assert_eq!(analysis.report.issues().len(), 1);
    let issue = &analysis.report.issues()[0];
    assert_eq!(issue.package, "moment");
    assert_eq!(issue.severity, Severity::Info);
    assert_eq!(issue.fix.as_deref(), Some("Replace moment with dayjs"));
}

#[test]
fn malformed_lockfile_is_a_parse_error() {
    let fixture = ProjectFixture::new(json!({ "name": "app" })).write("package-lock.json", "{");
    let ecosystem = NpmEcosystem::offline();

    let result = analyze(
        &ecosystem,
        fixture.path(),
        &ecosystem.load_rules().unwrap(),
        &Runtime::unknown(),
    );

    assert!(result.is_err());
}
