//! Ecosystem capability interface
//!
//! An ecosystem knows how to recognise a project directory, read it into
//! [`ProjectData`], provide its rules, and look packages up in its registry.
//! Only npm is implemented; the checker itself is ecosystem-agnostic.

pub mod npm;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, info};

pub use npm::NpmEcosystem;

use crate::config::FETCH_STAGGER_DELAY_MS;
use crate::parser::traits::ParseError;
use crate::parser::types::ProjectData;
use crate::rules::{RulesError, RulesStore};
use crate::version::error::RegistryError;
use crate::version::types::RegistryEntry;

#[async_trait::async_trait]
pub trait Ecosystem: Send + Sync {
    fn name(&self) -> &'static str;

    /// Higher wins when several ecosystems detect the same directory
    fn priority(&self) -> u32;

    fn detect(&self, project_dir: &Path) -> bool;

    fn parse_project(&self, project_dir: &Path) -> Result<ProjectData, ParseError>;

    fn load_rules(&self) -> Result<RulesStore, RulesError>;

    async fn fetch_registry_entry(&self, package_name: &str)
    -> Result<RegistryEntry, RegistryError>;
}

/// Highest-priority ecosystem that recognises `project_dir`
pub fn detect_ecosystem(
    project_dir: &Path,
    ecosystems: &[Arc<dyn Ecosystem>],
) -> Option<Arc<dyn Ecosystem>> {
    let detected = ecosystems
        .iter()
        .filter(|ecosystem| ecosystem.detect(project_dir))
        .max_by_key(|ecosystem| ecosystem.priority())
        .cloned();

    if let Some(ecosystem) = &detected {
        debug!("Detected {} project in {:?}", ecosystem.name(), project_dir);
    }
    detected
}

/// Look up several packages concurrently, in input order.
///
/// Start times are staggered to avoid tripping registry rate limits.
pub async fn fetch_entries(
    ecosystem: &dyn Ecosystem,
    package_names: &[String],
) -> Vec<(String, Result<RegistryEntry, RegistryError>)> {
    let futures = package_names.iter().enumerate().map(|(i, name)| {
        let delay = Duration::from_millis(FETCH_STAGGER_DELAY_MS * i as u64);
        async move {
            sleep(delay).await;
            info!("Fetching {} from {} registry", name, ecosystem.name());
            (name.clone(), ecosystem.fetch_registry_entry(name).await)
        }
    });

    join_all(futures).await
}
