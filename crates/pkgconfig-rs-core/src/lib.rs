//! Package-relative configuration loading.
//!
//! This crate locates a package root, loads its base configuration file,
//! merges an environment-specific override onto it, and validates the result
//! against an optional JSON-Schema style descriptor.

mod error;
mod loader;
mod model;

/// Public error type returned by location, loading, merging, and validation.
pub use error::ConfigError;
/// Resolver, options, and the building blocks it is made of.
pub use loader::{
    ConfigResolver, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_NAME, DEFAULT_MANIFEST_FILE,
    DEFAULT_SCHEMA_NAME, ENV_CONFIG_DIR, ENV_CONFIG_ENV, EnvironmentLayout, FileLoader,
    Json5Loader, JsonLoader, LoadedFile, LoaderRegistry, ResolverOptions, SchemaSource,
    ScriptLoader, check_schema, locate, locate_with, merge, merge_all, resolve_config_file,
    validate,
};
/// Package and resolution result types.
pub use model::*;

/// Resolve configuration for the package containing `start_dir`, reading
/// `CONFIG_ENV` and `CONFIG_DIR` from the process environment.
pub fn resolve(
    start_dir: impl AsRef<std::path::Path>,
    name: Option<&str>,
) -> Result<serde_json::Value, ConfigError> {
    ConfigResolver::new(ResolverOptions::from_env(start_dir)).resolve(name)
}
