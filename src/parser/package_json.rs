//! package.json parser

use serde_json::Value;
use tracing::{debug, warn};

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{
    DeclaredDependencies, ModuleType, ProjectMetadata, string_field, string_map,
};

/// The parts of package.json the checker cares about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageManifest {
    pub metadata: ProjectMetadata,
    pub dependencies: DeclaredDependencies,
}

/// Parser for package.json files
pub struct PackageJsonParser;

impl PackageJsonParser {
    pub fn new() -> Self {
        Self
    }

    /// `workspaces` is either an array of globs or `{ "packages": [...] }`
    fn parse_workspaces(value: Option<&Value>) -> Vec<String> {
        let list = match value {
            Some(Value::Array(items)) => items,
            Some(Value::Object(object)) => match object.get("packages") {
                Some(Value::Array(items)) => items,
                _ => return Vec::new(),
            },
            _ => return Vec::new(),
        };

        list.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }
}

impl Default for PackageJsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PackageJsonParser {
    type Output = PackageManifest;

    fn file_name(&self) -> &'static str {
        "package.json"
    }

    fn parse(&self, content: &str) -> Result<PackageManifest, ParseError> {
        let json: Value = serde_json::from_str(content).map_err(|e| {
            warn!("Failed to parse package.json: {}", e);
            ParseError::InvalidJson {
                file: "package.json",
                source: e,
            }
        })?;

        if !json.is_object() {
            return Err(ParseError::InvalidSyntax(
                "package.json must contain a JSON object".to_string(),
            ));
        }

        let metadata = ProjectMetadata {
            name: string_field(&json, "name").unwrap_or_default(),
            version: string_field(&json, "version").unwrap_or_default(),
            engines: string_map(json.get("engines")),
            module_type: ModuleType::from_type_field(json.get("type").and_then(Value::as_str)),
            workspaces: Self::parse_workspaces(json.get("workspaces")),
        };

        let dependencies = DeclaredDependencies::new(
            string_map(json.get("dependencies")),
            string_map(json.get("devDependencies")),
            string_map(json.get("peerDependencies")),
            string_map(json.get("optionalDependencies")),
        );

        debug!(
            "Parsed package.json for {:?}: {} declared dependencies",
            metadata.name,
            dependencies.all.len()
        );

        Ok(PackageManifest {
            metadata,
            dependencies,
        })
    }
}
