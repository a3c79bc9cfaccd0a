//! package-lock.json parser
//!
//! Supports lockfile v1 (nested `dependencies` tree with `requires`) and
//! v2/v3 (flat `packages` map keyed by `node_modules/...` install paths).
//! When a name is installed at several depths, the shallowest install wins.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{InstalledPackage, bool_field, string_field, string_map};

const NODE_MODULES: &str = "node_modules/";

/// Installed packages keyed by name, in lockfile order
pub type InstalledPackages = IndexMap<String, InstalledPackage>;

/// Parser for package-lock.json files
pub struct PackageLockParser;

impl PackageLockParser {
    pub fn new() -> Self {
        Self
    }

    /// Derive the package name and nesting depth from an install path:
    /// `node_modules/a/node_modules/@scope/b` -> (`@scope/b`, 2)
    fn name_from_path(path: &str) -> Option<(String, usize)> {
        let depth = path.matches(NODE_MODULES).count();
        let start = path.rfind(NODE_MODULES)? + NODE_MODULES.len();
        let name = &path[start..];
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), depth))
    }

    fn parse_packages_map(packages: &Map<String, Value>) -> InstalledPackages {
        let mut installed = InstalledPackages::new();
        let mut depths: HashMap<String, usize> = HashMap::new();

        for (path, info) in packages {
            // The "" entry is the project itself
            if path.is_empty() || bool_field(info, "link") {
                continue;
            }

            // Workspace folders appear without a node_modules prefix
            let Some((name, depth)) = Self::name_from_path(path) else {
                continue;
            };

            if depths.get(&name).is_some_and(|&seen| seen <= depth) {
                continue;
            }
            depths.insert(name.clone(), depth);

            let mut dependencies = string_map(info.get("dependencies"));
            dependencies.extend(string_map(info.get("optionalDependencies")));

            installed.insert(
                name,
                InstalledPackage {
                    version: string_field(info, "version").unwrap_or_default(),
                    dependencies,
                    peer_dependencies: string_map(info.get("peerDependencies")),
                    engines: string_map(info.get("engines")),
                    optional: bool_field(info, "optional"),
                    dev: bool_field(info, "dev"),
                },
            );
        }

        installed
    }

    fn parse_dependency_tree(
        dependencies: &Map<String, Value>,
        depth: usize,
        installed: &mut InstalledPackages,
        depths: &mut HashMap<String, usize>,
    ) {
        for (name, info) in dependencies {
            let shallower = depths.get(name).is_none_or(|&seen| depth < seen);
            if shallower {
                depths.insert(name.clone(), depth);
                installed.insert(
                    name.clone(),
                    InstalledPackage {
                        version: string_field(info, "version").unwrap_or_default(),
                        dependencies: string_map(info.get("requires")),
                        optional: bool_field(info, "optional"),
                        dev: bool_field(info, "dev"),
                        ..Default::default()
                    },
                );
            }

            if let Some(nested) = info.get("dependencies").and_then(Value::as_object) {
                Self::parse_dependency_tree(nested, depth + 1, installed, depths);
            }
        }
    }
}

impl Default for PackageLockParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PackageLockParser {
    type Output = InstalledPackages;

    fn file_name(&self) -> &'static str {
        "package-lock.json"
    }

    fn parse(&self, content: &str) -> Result<InstalledPackages, ParseError> {
        let json: Value = serde_json::from_str(content).map_err(|e| {
            warn!("Failed to parse package-lock.json: {}", e);
            ParseError::InvalidJson {
                file: "package-lock.json",
                source: e,
            }
        })?;

        let Some(root) = json.as_object() else {
            return Err(ParseError::InvalidSyntax(
                "package-lock.json must contain a JSON object".to_string(),
            ));
        };

        let installed = if let Some(packages) = root.get("packages").and_then(Value::as_object) {
            Self::parse_packages_map(packages)
        } else if let Some(dependencies) = root.get("dependencies").and_then(Value::as_object) {
            let mut installed = InstalledPackages::new();
            let mut depths = HashMap::new();
            Self::parse_dependency_tree(dependencies, 1, &mut installed, &mut depths);
            installed
        } else {
            InstalledPackages::new()
        };

        let lockfile_version = root.get("lockfileVersion").and_then(Value::as_u64);
        debug!(
            "Parsed package-lock.json (lockfileVersion {:?}): {} installed packages",
            lockfile_version,
            installed.len()
        );

        Ok(installed)
    }
}
