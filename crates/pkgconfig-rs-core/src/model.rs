//! Value types produced by package location and config resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Identity of the package that owns the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Declared package name from the manifest.
    pub name: String,
    /// Directory containing the manifest (the package root).
    pub directory: PathBuf,
    /// Full path of the manifest file.
    pub manifest: PathBuf,
}

/// Type tag compared by the merger; integers and floats share `Number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeType {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl MergeType {
    /// Classify a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Lowercase name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for MergeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a file played in producing the final config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// Required base configuration.
    Base,
    /// Environment-specific override merged onto the base.
    Environment,
    /// Schema descriptor used for validation.
    Schema,
}

/// A file that contributed to a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    pub role: SourceRole,
    pub path: PathBuf,
}

/// Final config plus metadata about where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Package that owns the configuration.
    pub package: PackageInfo,
    /// Merged and (when enabled) validated config object.
    pub value: Value,
    /// Files read during resolution, in load order.
    pub sources: Vec<ConfigSource>,
}

impl ResolvedConfig {
    /// Path of the file loaded for the given role, if any.
    pub fn source(&self, role: SourceRole) -> Option<&PathBuf> {
        self.sources
            .iter()
            .find(|source| source.role == role)
            .map(|source| &source.path)
    }
}
