//! Error types for loading cloud assemblies.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a cloud assembly from disk.
///
/// Matching itself never fails: malformed template entries are skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// The assembly directory has no `manifest.json`
    #[error("cloud assembly manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// A stack artifact points at a template file that does not exist
    #[error("template for stack '{stack}' not found: {}", .path.display())]
    TemplateNotFound {
        /// Name of the stack whose template is missing
        stack: String,
        /// Path the manifest pointed at
        path: PathBuf,
    },

    /// The manifest is valid JSON but not shaped like a cloud assembly manifest
    #[error("invalid cloud assembly manifest {}: {message}", .path.display())]
    InvalidManifest {
        /// Manifest file being read
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying parser error
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for assembly operations.
pub type Result<T> = std::result::Result<T, Error>;
