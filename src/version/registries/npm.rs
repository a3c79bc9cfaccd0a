//! npm registry API implementation

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use semver::Version;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::FETCH_TIMEOUT_MS;
use crate::parser::types::string_map;
use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::types::RegistryEntry;

/// Response from npm registry API (the "packument")
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "dist-tags")]
    dist_tags: IndexMap<String, String>,
    #[serde(default)]
    versions: IndexMap<String, Value>,
}

/// Registry implementation for npm registry API
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry against `base_url`
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dep-compat/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }

    fn into_entry(package_name: &str, response: NpmPackageResponse) -> RegistryEntry {
        let mut versions: Vec<(String, Version)> = response
            .versions
            .keys()
            .filter_map(|v| Version::parse(v).ok().map(|parsed| (v.clone(), parsed)))
            .collect();
        versions.sort_by(|(_, a), (_, b)| a.cmp(b));

        let deprecated = response
            .versions
            .iter()
            .filter_map(|(version, manifest)| {
                manifest
                    .get("deprecated")
                    .and_then(Value::as_str)
                    .filter(|message| !message.is_empty())
                    .map(|message| (version.clone(), message.to_string()))
            })
            .collect();

        let latest = response.dist_tags.get("latest").cloned();
        let latest_manifest = latest.as_ref().and_then(|v| response.versions.get(v));

        RegistryEntry {
            name: response.name.unwrap_or_else(|| package_name.to_string()),
            peer_dependencies: string_map(latest_manifest.and_then(|m| m.get("peerDependencies"))),
            engines: string_map(latest_manifest.and_then(|m| m.get("engines"))),
            latest,
            versions: versions.into_iter().map(|(v, _)| v).collect(),
            deprecated,
        }
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    fn name(&self) -> &'static str {
        "npm"
    }

    async fn fetch_entry(&self, package_name: &str) -> Result<RegistryEntry, RegistryError> {
        let encoded_name = Self::encode_package_name(package_name);
        let url = format!("{}/{}", self.base_url, encoded_name);
        debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok());
            warn!("npm registry rate limited request: {}", url);
            return Err(RegistryError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let package_info: NpmPackageResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse npm registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(Self::into_entry(package_name, package_info))
    }
}
