//! Parser trait definition

use std::path::PathBuf;

/// Trait for parsing one project file
pub trait Parser {
    /// What the file parses into
    type Output;

    /// File name this parser reads inside a project directory
    fn file_name(&self) -> &'static str;

    /// Parse the file content
    fn parse(&self, content: &str) -> Result<Self::Output, ParseError>;
}

/// Error type for parsing operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The project has no manifest at all
    #[error("No package.json found in {}", .0.display())]
    MissingManifest(PathBuf),

    /// Failed to read a file that exists
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON
    #[error("Invalid JSON in {file}: {source}")]
    InvalidJson {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON, but not the shape the file must have
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),
}
