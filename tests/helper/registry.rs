//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use dep_compat::version::cache::Cache;
use dep_compat::version::error::RegistryError;
use dep_compat::version::registry::Registry;
use dep_compat::version::types::RegistryEntry;

/// In-memory registry that counts fetches
#[derive(Default)]
pub struct FakeRegistry {
    entries: HashMap<String, RegistryEntry>,
    fetches: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(mut self, package: &str, versions: Vec<&str>) -> Self {
        let versions: Vec<String> = versions.into_iter().map(str::to_string).collect();
        self.entries.insert(
            package.to_string(),
            RegistryEntry {
                name: package.to_string(),
                latest: versions.last().cloned(),
                versions,
                ..Default::default()
            },
        );
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    fn name(&self) -> &'static str {
        "npm"
    }

    async fn fetch_entry(&self, package_name: &str) -> Result<RegistryEntry, RegistryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.entries
            .get(package_name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))
    }
}

/// Cache backed by a file in a fresh temp dir; keep the dir alive
pub fn create_test_cache() -> (TempDir, Arc<Cache>) {
    let temp_dir = TempDir::new().unwrap();
    let cache = Cache::new(&temp_dir.path().join("registry.db")).unwrap();
    (temp_dir, Arc::new(cache))
}
