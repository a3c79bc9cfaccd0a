//! Project data shapes produced by the parsers

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Package name -> version range, in declaration order
pub type DependencyMap = IndexMap<String, String>;

/// Module system a package or project is authored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModuleType {
    #[default]
    #[serde(rename = "commonjs")]
    CommonJs,
    #[serde(rename = "module")]
    Module,
}

impl ModuleType {
    /// Interpret the `type` field of package.json; anything but `"module"` is CommonJS
    pub fn from_type_field(value: Option<&str>) -> Self {
        match value {
            Some("module") => ModuleType::Module,
            _ => ModuleType::CommonJs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::CommonJs => "commonjs",
            ModuleType::Module => "module",
        }
    }
}

/// Top-level facts about the project itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
    pub engines: DependencyMap,
    pub module_type: ModuleType,
    pub workspaces: Vec<String>,
}

impl ProjectMetadata {
    /// Required Node.js range, if the project declares one
    pub fn node_engine(&self) -> Option<&str> {
        self.engines.get("node").map(String::as_str)
    }
}

/// Dependency declarations from the manifest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredDependencies {
    pub dependencies: DependencyMap,
    pub dev_dependencies: DependencyMap,
    pub peer_dependencies: DependencyMap,
    pub optional_dependencies: DependencyMap,
    /// dependencies + devDependencies + optionalDependencies. Peers are
    /// requirements on the consumer, so they never appear here.
    pub all: DependencyMap,
}

impl DeclaredDependencies {
    pub fn new(
        dependencies: DependencyMap,
        dev_dependencies: DependencyMap,
        peer_dependencies: DependencyMap,
        optional_dependencies: DependencyMap,
    ) -> Self {
        // A name declared in several sections keeps its first position and
        // takes the range of the last section
        let mut all = dependencies.clone();
        for (name, range) in dev_dependencies.iter().chain(&optional_dependencies) {
            all.insert(name.clone(), range.clone());
        }

        Self {
            dependencies,
            dev_dependencies,
            peer_dependencies,
            optional_dependencies,
            all,
        }
    }
}

/// A package as recorded in the lockfile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstalledPackage {
    pub version: String,
    pub dependencies: DependencyMap,
    pub peer_dependencies: DependencyMap,
    pub engines: DependencyMap,
    pub optional: bool,
    pub dev: bool,
}

/// Everything the graph builder needs to know about one project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectData {
    pub metadata: ProjectMetadata,
    pub dependencies: DeclaredDependencies,
    pub installed: IndexMap<String, InstalledPackage>,
    pub has_lockfile: bool,
}

/// Collect the string-valued entries of a JSON object.
///
/// Anything that is not an object (a missing field, the legacy array form of
/// `engines`) yields an empty map; non-string values are skipped.
pub(crate) fn string_map(value: Option<&Value>) -> DependencyMap {
    value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn bool_field(value: &Value, field: &str) -> bool {
    value.get(field).and_then(Value::as_bool).unwrap_or(false)
}
