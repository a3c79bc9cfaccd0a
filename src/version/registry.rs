//! Registry trait for fetching package metadata from a remote source

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::RegistryEntry;

/// Trait for fetching package metadata from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Short name used as the cache key namespace (e.g. `npm`)
    fn name(&self) -> &'static str;

    /// Fetches the registry entry for a package
    ///
    /// # Returns
    /// * `Ok(RegistryEntry)` - versions ordered lowest to highest
    /// * `Err(RegistryError)` - if the fetch fails; no retry is attempted
    async fn fetch_entry(&self, package_name: &str) -> Result<RegistryEntry, RegistryError>;
}
