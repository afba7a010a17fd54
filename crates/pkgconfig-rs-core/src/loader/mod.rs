//! Package-relative configuration resolution.
//!
//! Locates the package root, loads the base config file, merges an optional
//! environment override onto it, validates the result against a schema when
//! one is configured, and returns the final value.

mod formats;
mod layer_io;
mod locator;
mod merge;
mod schema;
mod utils;


pub use formats::{FileLoader, Json5Loader, JsonLoader, ScriptLoader};
pub use layer_io::{LoadedFile, LoaderRegistry, resolve_config_file};
pub use locator::{locate, locate_with};
pub use merge::{merge, merge_all};
pub use schema::{check_schema, validate};

use crate::{ConfigError, ConfigSource, PackageInfo, ResolvedConfig, SourceRole};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Manifest file that marks a package root.
pub const DEFAULT_MANIFEST_FILE: &str = "package.json";
/// Config directory under the package root.
pub const DEFAULT_CONFIG_DIR: &str = "config";
/// Base config name used when no package-named file exists.
pub const DEFAULT_CONFIG_NAME: &str = "default";
/// Schema file looked up in the config directory.
pub const DEFAULT_SCHEMA_NAME: &str = "schema";
/// Environment variable naming the active environment.
pub const ENV_CONFIG_ENV: &str = "CONFIG_ENV";
/// Environment variable overriding the config directory.
pub const ENV_CONFIG_DIR: &str = "CONFIG_DIR";

/// Where the environment override lives relative to the config directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvironmentLayout {
    /// `<config dir>/<env>.(js|json)`
    #[default]
    Sibling,
    /// `<config dir>/<env>/<base name>.(js|json)`
    Subdirectory,
}

/// Schema used to validate the merged config.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchemaSource {
    /// Validate against `<config dir>/schema.(js|json)` when that file exists.
    #[default]
    Auto,
    /// Validate against a schema file; missing file is an error.
    Path(PathBuf),
    /// Validate against an in-memory schema.
    Inline(Value),
    /// Skip validation.
    Disabled,
}

/// Options controlling package discovery and config resolution.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Directory where the upward manifest search starts.
    pub start_dir: PathBuf,
    /// Manifest file name that marks the package root.
    pub manifest_file: String,
    /// Config directory; relative paths resolve against the package root.
    pub config_dir: Option<PathBuf>,
    /// Active environment name; selects the override file.
    pub environment: Option<String>,
    /// Location of the environment override.
    pub environment_layout: EnvironmentLayout,
    /// Schema validation mode.
    pub schema: SchemaSource,
    /// Base config name tried after the package name.
    pub fallback_name: String,
    /// In-memory config used instead of the config files; only the schema is applied.
    pub inline_config: Option<Map<String, Value>>,
}

impl ResolverOptions {
    /// Create options with default locations for the given start directory.
    pub fn new(start_dir: impl AsRef<Path>) -> Self {
        Self {
            start_dir: start_dir.as_ref().to_path_buf(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            config_dir: None,
            environment: None,
            environment_layout: EnvironmentLayout::default(),
            schema: SchemaSource::default(),
            fallback_name: DEFAULT_CONFIG_NAME.to_string(),
            inline_config: None,
        }
    }

    /// Create options, reading `CONFIG_ENV` and `CONFIG_DIR` from the process environment.
    pub fn from_env(start_dir: impl AsRef<Path>) -> Self {
        Self::from_lookup(start_dir, |key| std::env::var(key).ok())
    }

    /// Create options, reading environment settings through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(start_dir: impl AsRef<Path>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut options = Self::new(start_dir);
        options.environment = non_empty(ENV_CONFIG_ENV);
        options.config_dir = non_empty(ENV_CONFIG_DIR).map(PathBuf::from);
        options
    }

    /// Set the active environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Override the config directory.
    pub fn with_config_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Choose where environment overrides are looked up.
    pub fn with_environment_layout(mut self, layout: EnvironmentLayout) -> Self {
        self.environment_layout = layout;
        self
    }

    /// Choose the schema validation mode.
    pub fn with_schema(mut self, schema: SchemaSource) -> Self {
        self.schema = schema;
        self
    }

    /// Use an in-memory config instead of reading the config directory.
    pub fn with_inline_config(mut self, config: Map<String, Value>) -> Self {
        self.inline_config = Some(config);
        self
    }

    /// Use a different manifest file name.
    pub fn with_manifest_file(mut self, manifest_file: impl Into<String>) -> Self {
        self.manifest_file = manifest_file.into();
        self
    }

    /// Active environment, if set to a non-empty value.
    fn environment_name(&self) -> Option<&str> {
        self.environment
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Resolves package configuration according to [`ResolverOptions`].
///
/// Every call reads the files afresh; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    options: ResolverOptions,
    loaders: LoaderRegistry,
}

impl ConfigResolver {
    /// Create a resolver with the default loaders (`.js`, then `.json`).
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            loaders: LoaderRegistry::default(),
        }
    }

    /// Replace the loader registry.
    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    /// Options this resolver was built with.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve and return the final config value.
    ///
    /// `name` selects the base config file; by default the package name,
    /// its lowercase form, and `default` are tried in that order.
    pub fn resolve(&self, name: Option<&str>) -> Result<Value, ConfigError> {
        Ok(self.resolve_detailed(name)?.value)
    }

    /// Resolve and decode the final config into `T`.
    pub fn resolve_as<T: DeserializeOwned>(&self, name: Option<&str>) -> Result<T, ConfigError> {
        let value = self.resolve(name)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Resolve the final config and report which files contributed.
    pub fn resolve_detailed(&self, name: Option<&str>) -> Result<ResolvedConfig, ConfigError> {
        let package = locate_with(&self.options.start_dir, &self.options.manifest_file)?;
        debug!(
            "resolved package (name={}, root={})",
            package.name,
            package.directory.display()
        );

        let config_dir = self.config_dir(&package);
        let mut sources = Vec::new();
        let mut value = match &self.options.inline_config {
            Some(config) => {
                debug!("using inline config; config files are not read");
                Value::Object(config.clone())
            }
            None => self.load_files(&package, &config_dir, name, &mut sources)?,
        };

        if let Some((schema, path)) = self.load_schema(&package, &config_dir)? {
            check_schema(&schema)?;
            value = validate(value, &schema)?;
            if let Some(path) = path {
                sources.push(ConfigSource {
                    role: SourceRole::Schema,
                    path,
                });
            }
        }

        info!(
            "config resolved for package {} (files={})",
            package.name,
            sources.len()
        );
        Ok(ResolvedConfig {
            package,
            value,
            sources,
        })
    }

    /// Base file merged with the environment override, recording each file read.
    fn load_files(
        &self,
        package: &PackageInfo,
        config_dir: &Path,
        name: Option<&str>,
        sources: &mut Vec<ConfigSource>,
    ) -> Result<Value, ConfigError> {
        if !config_dir.is_dir() {
            return Err(ConfigError::ConfigDirNotFound(config_dir.to_path_buf()));
        }

        let candidates = self.base_candidates(package, name);
        let base = self.loaders.load_required(config_dir, &candidates)?;
        debug!("loaded base config: {}", base.path.display());
        sources.push(ConfigSource {
            role: SourceRole::Base,
            path: base.path.clone(),
        });
        let mut value = base.value;

        if let Some(environment) = self.options.environment_name() {
            match self.load_environment(config_dir, &base.path, environment)? {
                Some(overlay) => {
                    debug!("merging environment config: {}", overlay.path.display());
                    merge(&mut value, Some(&overlay.value))?;
                    sources.push(ConfigSource {
                        role: SourceRole::Environment,
                        path: overlay.path,
                    });
                }
                None => debug!("no config file for environment '{environment}'; using base"),
            }
        }
        Ok(value)
    }

    fn config_dir(&self, package: &PackageInfo) -> PathBuf {
        match &self.options.config_dir {
            Some(dir) => utils::resolve_against(&package.directory, dir),
            None => package.directory.join(DEFAULT_CONFIG_DIR),
        }
    }

    /// Base file names to probe, in order.
    fn base_candidates(&self, package: &PackageInfo, name: Option<&str>) -> Vec<String> {
        match name {
            Some(name) => vec![name.to_string()],
            None => {
                let lowercase = package.name.to_lowercase();
                utils::unique_names([
                    package.name.as_str(),
                    lowercase.as_str(),
                    self.options.fallback_name.as_str(),
                ])
            }
        }
    }

    fn load_environment(
        &self,
        config_dir: &Path,
        base_path: &Path,
        environment: &str,
    ) -> Result<Option<LoadedFile>, ConfigError> {
        if !utils::is_plain_name(environment) {
            return Err(ConfigError::InvalidEnvironment(environment.to_string()));
        }
        match self.options.environment_layout {
            EnvironmentLayout::Sibling => self.loaders.load_optional(config_dir, environment),
            EnvironmentLayout::Subdirectory => {
                let Some(base_name) = base_path.file_stem().and_then(|stem| stem.to_str()) else {
                    return Ok(None);
                };
                self.loaders
                    .load_optional(&config_dir.join(environment), base_name)
            }
        }
    }

    /// Schema value plus the file it came from (None for inline schemas).
    fn load_schema(
        &self,
        package: &PackageInfo,
        config_dir: &Path,
    ) -> Result<Option<(Value, Option<PathBuf>)>, ConfigError> {
        match &self.options.schema {
            SchemaSource::Disabled => Ok(None),
            SchemaSource::Inline(schema) => Ok(Some((schema.clone(), None))),
            SchemaSource::Auto => Ok(self
                .loaders
                .load_optional(config_dir, DEFAULT_SCHEMA_NAME)?
                .map(|loaded| (loaded.value, Some(loaded.path)))),
            SchemaSource::Path(path) => {
                let path = utils::resolve_against(&package.directory, path);
                let stem = self.loaders.strip_extension(&path);
                let (dir, file) = match (stem.parent(), stem.file_name()) {
                    (Some(dir), Some(file)) => (dir.to_path_buf(), file.to_string_lossy()),
                    _ => {
                        return Err(ConfigError::SchemaNotFound {
                            path: stem.clone(),
                            extensions: self.loaders.extensions(),
                        });
                    }
                };
                match self.loaders.load_optional(&dir, &file)? {
                    Some(loaded) => Ok(Some((loaded.value, Some(loaded.path)))),
                    None => Err(ConfigError::SchemaNotFound {
                        path: stem.clone(),
                        extensions: self.loaders.extensions(),
                    }),
                }
            }
        }
    }
}
