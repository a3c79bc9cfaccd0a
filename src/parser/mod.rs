//! Parser layer
//! - traits.rs: Parser trait definition and ParseError
//! - types.rs: Project data shapes (ProjectData, InstalledPackage, ModuleType)
//! - package_json.rs: package.json parser
//! - package_lock.rs: package-lock.json parser

pub mod package_json;
pub mod package_lock;
pub mod traits;
pub mod types;

use std::path::Path;

use tracing::{debug, info};

pub use package_json::{PackageJsonParser, PackageManifest};
pub use package_lock::PackageLockParser;
pub use traits::{ParseError, Parser};
pub use types::{
    DeclaredDependencies, DependencyMap, InstalledPackage, ModuleType, ProjectData,
    ProjectMetadata,
};

/// Read an npm project from disk.
///
/// package.json is required. A missing package-lock.json is a valid state:
/// the project simply has no installed packages.
pub fn read_project(project_dir: &Path) -> Result<ProjectData, ParseError> {
    let manifest_parser = PackageJsonParser::new();
    let manifest_path = project_dir.join(manifest_parser.file_name());
    if !manifest_path.is_file() {
        return Err(ParseError::MissingManifest(project_dir.to_path_buf()));
    }
    let content = read_file(&manifest_path)?;
    let manifest = manifest_parser.parse(&content)?;

    let lock_parser = PackageLockParser::new();
    let lock_path = project_dir.join(lock_parser.file_name());
    let (installed, has_lockfile) = if lock_path.is_file() {
        (lock_parser.parse(&read_file(&lock_path)?)?, true)
    } else {
        info!("No package-lock.json in {:?}; installed packages are unknown", project_dir);
        (Default::default(), false)
    };

    debug!(
        "Read project {:?}: {} installed packages",
        manifest.metadata.name,
        installed.len()
    );

    Ok(ProjectData {
        metadata: manifest.metadata,
        dependencies: manifest.dependencies,
        installed,
        has_lockfile,
    })
}

fn read_file(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}
