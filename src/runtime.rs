//! The JavaScript runtime the project will run on

use std::process::Command;

use semver::Version;
use tracing::{debug, warn};

use crate::version::semver::parse_version;

/// Running engine information used by engine checks and rule conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Runtime {
    node_version: Option<Version>,
}

impl Runtime {
    /// Runtime with no known Node.js version; engine checks are skipped
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Runtime pinned to an explicit version (e.g. `--node-version 18.19.0`)
    ///
    /// An unparseable version yields an unknown runtime.
    pub fn from_version(version: &str) -> Self {
        let node_version = parse_version(version);
        if node_version.is_none() {
            warn!("Ignoring unparseable Node.js version: {}", version);
        }
        Self { node_version }
    }

    /// Detect the installed Node.js by running `node --version`
    pub fn detect() -> Self {
        match Command::new("node").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                debug!("Detected node {}", stdout.trim());
                Self::from_version(stdout.trim())
            }
            Ok(output) => {
                warn!("`node --version` exited with {}", output.status);
                Self::unknown()
            }
            Err(e) => {
                warn!("Failed to run `node --version`: {}", e);
                Self::unknown()
            }
        }
    }

    pub fn node_version(&self) -> Option<&Version> {
        self.node_version.as_ref()
    }
}
