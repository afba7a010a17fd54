//! Error types for package location, config loading, merging, and validation.

use crate::MergeType;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while resolving a package configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No manifest file was found between the start directory and the filesystem root.
    #[error("package file not found: {manifest} (searched upward from {})", .start.display())]
    PackageNotFound { manifest: String, start: PathBuf },
    /// The manifest exists but does not identify the package.
    #[error("invalid package file {}: {message}", .path.display())]
    InvalidManifest { path: PathBuf, message: String },
    /// The configuration directory does not exist.
    #[error("config directory not found: {}", .0.display())]
    ConfigDirNotFound(PathBuf),
    /// The environment name is not a plain file name.
    #[error("invalid environment name '{0}': expected a file name without path separators")]
    InvalidEnvironment(String),
    /// None of the candidate config files exist.
    #[error(
        "configuration file not found: {}{}({}).({})",
        .directory.display(),
        std::path::MAIN_SEPARATOR,
        .candidates.join("|"),
        .extensions.join("|")
    )]
    ConfigNotFound {
        directory: PathBuf,
        candidates: Vec<String>,
        extensions: Vec<String>,
    },
    /// An explicitly configured schema file does not exist.
    #[error("schema file not found: {}.({})", .path.display(), .extensions.join("|"))]
    SchemaNotFound {
        path: PathBuf,
        extensions: Vec<String>,
    },
    /// Reading a file failed.
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A data file could not be parsed.
    #[error("{message} in {}", .path.display())]
    Syntax { path: PathBuf, message: String },
    /// A script module could not be evaluated as data.
    #[error("unsupported config module {}: {message}", .path.display())]
    Script { path: PathBuf, message: String },
    /// A config file did not contain an object at the top level.
    #[error("expected an object at the top level of {}, found {found}", .path.display())]
    NotAnObject { path: PathBuf, found: MergeType },
    /// Base and override disagree on the type of a value.
    #[error("type mismatch for '{key}': base value is {base}, override value is {overlay}")]
    TypeMismatch {
        key: String,
        base: MergeType,
        overlay: MergeType,
    },
    /// The schema descriptor is structurally invalid.
    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },
    /// The config does not satisfy the schema.
    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },
    /// Converting the final value into a typed struct failed.
    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source,
        }
    }
}
