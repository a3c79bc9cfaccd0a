//! On-disk npm project fixtures

use std::path::Path;

use serde_json::{Map, Value, json};
use tempfile::TempDir;

/// A throwaway project directory
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new(package_json: Value) -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        fixture.write("package.json", &package_json.to_string())
    }

    pub fn with_lockfile(self, lockfile: Value) -> Self {
        self.write("package-lock.json", &lockfile.to_string())
    }

    pub fn write(self, name: &str, content: &str) -> Self {
        std::fs::write(self.dir.path().join(name), content).unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Lockfile v3 with one top-level install per `(name, entry)`
pub fn lockfile_v3(packages: &[(&str, Value)]) -> Value {
    let mut map = Map::new();
    map.insert("".to_string(), json!({ "name": "app", "version": "1.0.0" }));
    for (name, entry) in packages {
        map.insert(format!("node_modules/{name}"), entry.clone());
    }
    json!({
        "name": "app",
        "version": "1.0.0",
        "lockfileVersion": 3,
        "packages": map,
    })
}
