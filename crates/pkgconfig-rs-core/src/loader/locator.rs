//! Package root discovery by walking up to the nearest manifest file.

use super::{DEFAULT_MANIFEST_FILE, utils};
use crate::{ConfigError, PackageInfo};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Find the package that contains `start_dir`, using `package.json` manifests.
pub fn locate(start_dir: impl AsRef<Path>) -> Result<PackageInfo, ConfigError> {
    locate_with(start_dir, DEFAULT_MANIFEST_FILE)
}

/// Find the package that contains `start_dir`, using the given manifest file name.
///
/// The start directory and each of its ancestors are checked in turn; the
/// first one holding a regular file named `manifest_file` is the package root.
pub fn locate_with(
    start_dir: impl AsRef<Path>,
    manifest_file: &str,
) -> Result<PackageInfo, ConfigError> {
    let start = utils::normalize_path(start_dir.as_ref())?;
    for dir in start.ancestors() {
        let manifest = dir.join(manifest_file);
        if manifest.is_file() {
            debug!("found package manifest: {}", manifest.display());
            let name = read_package_name(&manifest)?;
            return Ok(PackageInfo {
                name,
                directory: dir.to_path_buf(),
                manifest,
            });
        }
    }
    Err(ConfigError::PackageNotFound {
        manifest: manifest_file.to_string(),
        start,
    })
}

fn read_package_name(manifest: &Path) -> Result<String, ConfigError> {
    let contents =
        fs::read_to_string(manifest).map_err(|err| ConfigError::read_failed(manifest, err))?;
    let value: Value = serde_json::from_str(&contents).map_err(|err| ConfigError::Syntax {
        path: manifest.to_path_buf(),
        message: err.to_string(),
    })?;
    let invalid = |message: &str| ConfigError::InvalidManifest {
        path: manifest.to_path_buf(),
        message: message.to_string(),
    };
    let Some(map) = value.as_object() else {
        return Err(invalid("expected a JSON object"));
    };
    match map.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(name.clone()),
        Some(Value::String(_)) => Err(invalid("\"name\" is empty")),
        Some(_) => Err(invalid("\"name\" must be a string")),
        None => Err(invalid("missing \"name\" field")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn finds_manifest_in_ancestor() {
        let temp = TempDir::new().expect("tmp");
        let root = temp.path().join("web");
        let nested = root.join("src").join("handlers");
        fs::create_dir_all(&nested).expect("dirs");
        fs::write(root.join("package.json"), r#"{ "name": "web", "version": "1.0.0" }"#)
            .expect("manifest");

        let package = locate(&nested).expect("package");
        assert_eq!(package.name, "web");
        assert_eq!(package.directory, root.canonicalize().expect("canonical"));
        assert_eq!(package.manifest, package.directory.join("package.json"));
    }

    #[test]
    fn nearest_manifest_wins() {
        let temp = TempDir::new().expect("tmp");
        let inner = temp.path().join("inner");
        fs::create_dir_all(&inner).expect("dirs");
        fs::write(temp.path().join("package.json"), r#"{ "name": "outer" }"#).expect("outer");
        fs::write(inner.join("package.json"), r#"{ "name": "inner" }"#).expect("inner");

        assert_eq!(locate(&inner).expect("package").name, "inner");
    }

    #[test]
    fn directory_named_like_manifest_is_skipped() {
        let temp = TempDir::new().expect("tmp");
        let inner = temp.path().join("inner");
        fs::create_dir_all(inner.join("package.json")).expect("dirs");
        fs::write(temp.path().join("package.json"), r#"{ "name": "outer" }"#).expect("outer");

        assert_eq!(locate(&inner).expect("package").name, "outer");
    }

    #[test]
    fn custom_manifest_name() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("app.json"), r#"{ "name": "custom" }"#).expect("manifest");

        let package = locate_with(temp.path(), "app.json").expect("package");
        assert_eq!(package.name, "custom");
    }

    #[test]
    fn manifest_without_name_is_invalid() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("package.json"), r#"{ "version": "1.0.0" }"#)
            .expect("manifest");

        let err = locate(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidManifest { .. }), "{err}");
        assert!(format!("{err}").contains("missing \"name\" field"));
    }

    #[test]
    fn malformed_manifest_is_a_syntax_error() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("package.json"), "{ name: ").expect("manifest");

        let err = locate(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }), "{err}");
        assert!(format!("{err}").ends_with("package.json"));
    }

    #[test]
    fn missing_manifest_reaches_root() {
        let temp = TempDir::new().expect("tmp");
        let err = locate_with(temp.path(), "no-such-manifest-5f1c.json").unwrap_err();
        assert!(matches!(err, ConfigError::PackageNotFound { .. }), "{err}");
    }
}
