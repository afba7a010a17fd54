//! Temporary package directories for resolution tests.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A package directory in a temp dir, with a manifest and a `config/` directory.
///
/// The package root is a subdirectory of the temp dir so tests can also place
/// files above it.
pub struct PackageFixture {
    temp: TempDir,
    root: PathBuf,
}

impl PackageFixture {
    /// Package with a `package.json` declaring `name` and an empty `config/` dir.
    pub fn new(name: &str) -> Self {
        let fixture = Self::without_manifest();
        fixture.write_json("package.json", &serde_json::json!({ "name": name }));
        fixture.dir("config");
        fixture
    }

    /// Empty package directory with no manifest.
    pub fn without_manifest() -> Self {
        let temp = TempDir::new().expect("tempdir");
        let root = temp
            .path()
            .canonicalize()
            .expect("canonical tempdir")
            .join("package");
        fs::create_dir_all(&root).expect("package root");
        Self { temp, root }
    }

    /// Package root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The temp dir holding the package root.
    pub fn parent(&self) -> &Path {
        self.temp.path()
    }

    /// Default config directory (`<root>/config`).
    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    /// Create a directory under the root and return its path.
    pub fn dir(&self, relative: impl AsRef<Path>) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    /// Write a file under the root, creating parent directories.
    pub fn write(&self, relative: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Write a JSON value under the root.
    pub fn write_json(&self, relative: impl AsRef<Path>, value: &Value) -> PathBuf {
        let contents = serde_json::to_string_pretty(value).expect("serialize json");
        self.write(relative, &contents)
    }

    /// Write a file under `config/`.
    pub fn write_config(&self, file_name: &str, contents: &str) -> PathBuf {
        self.write(Path::new("config").join(file_name), contents)
    }

    /// Write a JSON value to `config/<name>.json`.
    pub fn write_config_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write_json(Path::new("config").join(format!("{name}.json")), value)
    }
}
