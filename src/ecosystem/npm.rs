//! npm ecosystem: `package.json` projects, npm rules and the npm registry

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::DEFAULT_CACHE_TTL_MS;
use crate::ecosystem::Ecosystem;
use crate::parser::read_project;
use crate::parser::traits::ParseError;
use crate::parser::types::ProjectData;
use crate::rules::{RulesError, RulesStore};
use crate::version::cache::{Cache, CachedEntry};
use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::types::RegistryEntry;

const MANIFEST: &str = "package.json";

pub struct NpmEcosystem {
    registry: Option<Arc<dyn Registry>>,
    cache: Option<Arc<Cache>>,
    cache_ttl_ms: i64,
    rules_path: Option<PathBuf>,
    force_refresh: bool,
}

impl NpmEcosystem {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry: Some(registry),
            ..Self::offline()
        }
    }

    /// Ecosystem without registry access; lookups fail with `Disabled`
    pub fn offline() -> Self {
        Self {
            registry: None,
            cache: None,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            rules_path: None,
            force_refresh: false,
        }
    }

    pub fn with_cache(mut self, cache: Arc<Cache>, ttl_ms: i64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl_ms = ttl_ms;
        self
    }

    /// Use a rules file instead of the built-in rules
    pub fn with_rules_path(mut self, rules_path: Option<PathBuf>) -> Self {
        self.rules_path = rules_path;
        self
    }

    /// Skip cached entries (they are still refreshed after fetching)
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    fn cached_entry(&self, registry: &str, package_name: &str) -> Option<CachedEntry> {
        if self.force_refresh {
            return None;
        }
        let cache = self.cache.as_ref()?;
        match cache.get_fresh(registry, package_name, self.cache_ttl_ms) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", package_name, e);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl Ecosystem for NpmEcosystem {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn priority(&self) -> u32 {
        1
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join(MANIFEST).is_file()
    }

    fn parse_project(&self, project_dir: &Path) -> Result<ProjectData, ParseError> {
        read_project(project_dir)
    }

    fn load_rules(&self) -> Result<RulesStore, RulesError> {
        match &self.rules_path {
            Some(path) => RulesStore::load(path),
            None => RulesStore::builtin(),
        }
    }

    async fn fetch_registry_entry(
        &self,
        package_name: &str,
    ) -> Result<RegistryEntry, RegistryError> {
        let registry = self.registry.as_ref().ok_or(RegistryError::Disabled)?;

        match self.cached_entry(registry.name(), package_name) {
            Some(CachedEntry::Found(entry)) => {
                debug!("Cache hit for {}", package_name);
                return Ok(entry);
            }
            Some(CachedEntry::NotFound) => {
                debug!("Cached not-found for {}", package_name);
                return Err(RegistryError::NotFound(package_name.to_string()));
            }
            None => {}
        }

        let result = registry.fetch_entry(package_name).await;

        if let Some(cache) = &self.cache {
            let stored = match &result {
                Ok(entry) => cache.put(registry.name(), entry),
                Err(RegistryError::NotFound(_)) => cache.mark_not_found(registry.name(), package_name),
                Err(_) => Ok(()),
            };
            if let Err(e) = stored {
                warn!("Failed to cache {}: {}", package_name, e);
            }
        }

        result
    }
}
