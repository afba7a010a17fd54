//! IO helpers for probing and reading config files from disk.

use super::formats::{FileLoader, JsonLoader, ScriptLoader};
use crate::{ConfigError, MergeType};
use log::debug;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A config file read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    /// Path of the file that matched.
    pub path: PathBuf,
    /// Parsed contents.
    pub value: Value,
}

/// Ordered set of loaders probed for a logical (extension-less) file name.
#[derive(Debug, Clone)]
pub struct LoaderRegistry {
    loaders: Vec<Arc<dyn FileLoader>>,
}

impl Default for LoaderRegistry {
    /// Script modules first, then JSON.
    fn default() -> Self {
        Self::empty().with_loader(ScriptLoader).with_loader(JsonLoader)
    }
}

impl LoaderRegistry {
    /// Registry with no loaders.
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// Append a loader; it is probed after the ones already registered.
    pub fn with_loader(mut self, loader: impl FileLoader + 'static) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }

    /// Registered extensions in probe order.
    pub fn extensions(&self) -> Vec<String> {
        self.loaders
            .iter()
            .map(|loader| loader.extension().to_string())
            .collect()
    }

    /// Remove a registered extension from `path`, if present (case-insensitive).
    pub fn strip_extension(&self, path: &Path) -> PathBuf {
        let registered = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.loaders
                    .iter()
                    .any(|loader| loader.extension().eq_ignore_ascii_case(ext))
            });
        if registered {
            path.with_extension("")
        } else {
            path.to_path_buf()
        }
    }

    /// Probe `base_dir/logical_name.<ext>` for each loader and parse the first match.
    pub fn resolve(
        &self,
        base_dir: &Path,
        logical_name: &str,
    ) -> Result<Option<LoadedFile>, ConfigError> {
        let stem = self.strip_extension(&base_dir.join(logical_name));
        for loader in &self.loaders {
            let candidate = with_appended_extension(&stem, loader.extension());
            if !candidate.is_file() {
                continue;
            }
            debug!("reading config file: {}", candidate.display());
            let contents = fs::read_to_string(&candidate)
                .map_err(|err| ConfigError::read_failed(&candidate, err))?;
            let value = loader.parse(&candidate, &contents)?;
            return Ok(Some(LoadedFile {
                path: candidate,
                value,
            }));
        }
        debug!("no config file for {}", stem.display());
        Ok(None)
    }

    /// Load the first matching candidate, failing with `ConfigNotFound` when none exist.
    pub fn load_required(
        &self,
        base_dir: &Path,
        candidates: &[String],
    ) -> Result<LoadedFile, ConfigError> {
        for name in candidates {
            if let Some(loaded) = self.load_optional(base_dir, name)? {
                return Ok(loaded);
            }
        }
        Err(ConfigError::ConfigNotFound {
            directory: base_dir.to_path_buf(),
            candidates: candidates.to_vec(),
            extensions: self.extensions(),
        })
    }

    /// Load a config file if it exists; the top level must be an object.
    pub fn load_optional(
        &self,
        base_dir: &Path,
        logical_name: &str,
    ) -> Result<Option<LoadedFile>, ConfigError> {
        match self.resolve(base_dir, logical_name)? {
            Some(loaded) => {
                expect_object(&loaded)?;
                Ok(Some(loaded))
            }
            None => Ok(None),
        }
    }
}

/// Resolve a logical config name with the default loaders (`.js`, then `.json`).
pub fn resolve_config_file(
    base_dir: impl AsRef<Path>,
    logical_name: &str,
) -> Result<Option<LoadedFile>, ConfigError> {
    LoaderRegistry::default().resolve(base_dir.as_ref(), logical_name)
}

/// Reject files whose top-level value is not an object.
pub(super) fn expect_object(loaded: &LoadedFile) -> Result<(), ConfigError> {
    match loaded.value {
        Value::Object(_) => Ok(()),
        ref other => Err(ConfigError::NotAnObject {
            path: loaded.path.clone(),
            found: MergeType::of(other),
        }),
    }
}

/// `path` + `.` + `extension`, keeping any dots already in the file name.
fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Json5Loader;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).expect("write");
    }

    #[test]
    fn json_used_when_script_missing() {
        let temp = TempDir::new().expect("tmp");
        write(temp.path(), "app.json", r#"{ "port": 80 }"#);

        let loaded = resolve_config_file(temp.path(), "app")
            .expect("resolve")
            .expect("found");
        assert_eq!(loaded.path, temp.path().join("app.json"));
        assert_eq!(loaded.value, json!({ "port": 80 }));
    }

    #[test]
    fn script_used_when_json_missing() {
        let temp = TempDir::new().expect("tmp");
        write(temp.path(), "app.js", "module.exports = { port: 81 };");

        let loaded = resolve_config_file(temp.path(), "app")
            .expect("resolve")
            .expect("found");
        assert_eq!(loaded.value, json!({ "port": 81 }));
    }

    #[test]
    fn script_takes_precedence_over_json() {
        let temp = TempDir::new().expect("tmp");
        write(temp.path(), "app.js", "module.exports = { source: 'js' };");
        write(temp.path(), "app.json", r#"{ "source": "json" }"#);

        let loaded = resolve_config_file(temp.path(), "app")
            .expect("resolve")
            .expect("found");
        assert_eq!(loaded.path, temp.path().join("app.js"));
        assert_eq!(loaded.value, json!({ "source": "js" }));
    }

    #[test]
    fn explicit_extension_is_stripped_before_probing() {
        let temp = TempDir::new().expect("tmp");
        write(temp.path(), "app.js", "module.exports = { source: 'js' };");
        write(temp.path(), "app.json", r#"{ "source": "json" }"#);

        let loaded = resolve_config_file(temp.path(), "app.JSON")
            .expect("resolve")
            .expect("found");
        assert_eq!(loaded.value, json!({ "source": "js" }));
    }

    #[test]
    fn dotted_names_keep_their_dots() {
        let temp = TempDir::new().expect("tmp");
        write(temp.path(), "my.app.json", r#"{ "dotted": true }"#);

        let loaded = resolve_config_file(temp.path(), "my.app")
            .expect("resolve")
            .expect("found");
        assert_eq!(loaded.value, json!({ "dotted": true }));
    }

    #[test]
    fn missing_files_resolve_to_none() {
        let temp = TempDir::new().expect("tmp");
        assert!(resolve_config_file(temp.path(), "absent")
            .expect("resolve")
            .is_none());
    }

    #[test]
    fn directories_are_not_config_files() {
        let temp = TempDir::new().expect("tmp");
        fs::create_dir(temp.path().join("app.json")).expect("dir");
        assert!(resolve_config_file(temp.path(), "app")
            .expect("resolve")
            .is_none());
    }

    #[test]
    fn registered_loaders_extend_the_probe_order() {
        let temp = TempDir::new().expect("tmp");
        write(temp.path(), "app.json5", "{ port: 82, }");

        let registry = LoaderRegistry::default().with_loader(Json5Loader);
        assert_eq!(registry.extensions(), vec!["js", "json", "json5"]);
        let loaded = registry
            .load_optional(temp.path(), "app")
            .expect("resolve")
            .expect("found");
        assert_eq!(loaded.value, json!({ "port": 82 }));
    }

    #[test]
    fn required_lookup_reports_all_candidates() {
        let temp = TempDir::new().expect("tmp");
        let candidates = vec!["web".to_string(), "default".to_string()];
        let err = LoaderRegistry::default()
            .load_required(temp.path(), &candidates)
            .unwrap_err();
        let msg = format!("{err}");
        assert!(msg.starts_with("configuration file not found:"), "{msg}");
        assert!(msg.ends_with("(web|default).(js|json)"), "{msg}");
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        let temp = TempDir::new().expect("tmp");
        write(temp.path(), "list.json", "[1, 2]");

        let err = LoaderRegistry::default()
            .load_optional(temp.path(), "list")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotAnObject {
                found: MergeType::Array,
                ..
            }
        ));
    }
}
