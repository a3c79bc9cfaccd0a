//! In-memory dependency graph
//!
//! Nodes are installed packages plus one synthetic [`ROOT`] node standing for
//! the project. Edges are labeled with the version range the source requires
//! of the target and are kept exactly as recorded: duplicates are allowed and
//! a target does not have to exist as a node (an unresolved requirement).
//!
//! Nodes and per-source edge lists keep insertion order, which makes issue
//! ordering and path discovery order deterministic.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::parser::types::{DependencyMap, InstalledPackage, ModuleType, ProjectData};

/// Name of the synthetic node representing the project itself
pub const ROOT: &str = "__root__";

/// Default hop limit for [`DependencyGraph::find_paths`]
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Node attributes supplied at insertion; every field has a benign default
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMetadata {
    pub version: String,
    pub peer_dependencies: DependencyMap,
    pub engines: DependencyMap,
    pub module_type: ModuleType,
    pub deprecated: bool,
    pub optional: bool,
    pub dev: bool,
}

impl From<&InstalledPackage> for PackageMetadata {
    fn from(package: &InstalledPackage) -> Self {
        Self {
            version: package.version.clone(),
            peer_dependencies: package.peer_dependencies.clone(),
            engines: package.engines.clone(),
            optional: package.optional,
            dev: package.dev,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageNode {
    pub name: String,
    pub version: String,
    pub peer_dependencies: DependencyMap,
    pub engines: DependencyMap,
    pub module_type: ModuleType,
    pub deprecated: bool,
    pub optional: bool,
    pub dev: bool,
}

impl PackageNode {
    /// Required Node.js range, if the package declares one
    pub fn node_engine(&self) -> Option<&str> {
        self.engines.get("node").map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub version_range: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total_packages: usize,
    pub direct_dependencies: usize,
    /// `total_packages - direct_dependencies`. This is an approximation: a
    /// package that is both direct and transitive is only counted as direct,
    /// and declared-but-uninstalled dependencies can push it below zero.
    pub transitive_dependencies: i64,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: IndexMap<String, PackageNode>,
    edges: IndexMap<String, Vec<DependencyEdge>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a parsed project.
    ///
    /// Root edges come from the merged direct/dev/optional declarations;
    /// package edges come from each installed package's recorded
    /// dependencies. Nothing is resolved afresh.
    pub fn build_from_project(project: &ProjectData) -> Self {
        let mut graph = Self::new();
        let metadata = &project.metadata;

        graph.add_node(
            ROOT,
            PackageMetadata {
                version: metadata.version.clone(),
                engines: metadata.engines.clone(),
                module_type: metadata.module_type,
                ..Default::default()
            },
        );

        for (name, package) in &project.installed {
            graph.add_node(name.clone(), PackageMetadata::from(package));
        }

        for (name, range) in &project.dependencies.all {
            graph.add_edge(ROOT, name.clone(), range.clone());
        }

        for (name, package) in &project.installed {
            for (dependency, range) in &package.dependencies {
                graph.add_edge(name.clone(), dependency.clone(), range.clone());
            }
        }

        debug!(
            "Built dependency graph: {} nodes, {} edges",
            graph.nodes.len(),
            graph.edges.values().map(Vec::len).sum::<usize>()
        );

        graph
    }

    /// Insert a node, replacing any previous node of the same name
    pub fn add_node(&mut self, name: impl Into<String>, metadata: PackageMetadata) {
        let name = name.into();
        let node = PackageNode {
            name: name.clone(),
            version: metadata.version,
            peer_dependencies: metadata.peer_dependencies,
            engines: metadata.engines,
            module_type: metadata.module_type,
            deprecated: metadata.deprecated,
            optional: metadata.optional,
            dev: metadata.dev,
        };
        self.nodes.insert(name, node);
    }

    /// Append an edge; neither endpoint has to be a node
    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        version_range: impl Into<String>,
    ) {
        let from = from.into();
        let edge = DependencyEdge {
            from: from.clone(),
            to: to.into(),
            version_range: version_range.into(),
        };
        self.edges.entry(from).or_default().push(edge);
    }

    pub fn get_node(&self, name: &str) -> Option<&PackageNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn root(&self) -> Option<&PackageNode> {
        self.nodes.get(ROOT)
    }

    /// Outgoing edges of `name` in insertion order
    pub fn get_dependencies(&self, name: &str) -> &[DependencyEdge] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every source with at least one edge targeting `name`
    pub fn get_dependents(&self, name: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, edges)| edges.iter().any(|edge| edge.to == name))
            .map(|(from, _)| from.as_str())
            .collect()
    }

    /// All package names except the root
    pub fn get_all_packages(&self) -> Vec<&str> {
        self.packages().map(|node| node.name.as_str()).collect()
    }

    /// All package nodes except the root
    pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
        self.nodes.values().filter(|node| node.name != ROOT)
    }

    /// Enumerate every simple path from `from` to `to` of at most `max_depth` hops.
    ///
    /// A node already on the current path is never entered again, so cycles
    /// terminate while a node may still appear on several different paths.
    /// Parallel edges to the same target yield the path once.
    pub fn find_paths(&self, from: &str, to: &str, max_depth: usize) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        let (Some((from, _)), Some((to, _))) =
            (self.nodes.get_key_value(from), self.nodes.get_key_value(to))
        else {
            return paths;
        };

        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        self.walk_paths(from, to, max_depth, &mut path, &mut on_path, &mut paths);
        paths
    }

    fn walk_paths<'a>(
        &'a self,
        current: &'a str,
        to: &str,
        remaining: usize,
        path: &mut Vec<&'a str>,
        on_path: &mut HashSet<&'a str>,
        paths: &mut Vec<Vec<String>>,
    ) {
        path.push(current);

        if current == to {
            paths.push(path.iter().map(|name| name.to_string()).collect());
        } else if remaining > 0 {
            on_path.insert(current);
            let mut expanded = HashSet::new();
            for edge in self.get_dependencies(current) {
                let next = edge.to.as_str();
                if on_path.contains(next) || !expanded.insert(next) {
                    continue;
                }
                self.walk_paths(next, to, remaining - 1, path, on_path, paths);
            }
            on_path.remove(current);
        }

        path.pop();
    }

    pub fn get_stats(&self) -> GraphStats {
        let total_packages = self.packages().count();
        let direct_dependencies = self.get_dependencies(ROOT).len();

        GraphStats {
            total_packages,
            direct_dependencies,
            transitive_dependencies: total_packages as i64 - direct_dependencies as i64,
        }
    }
}
