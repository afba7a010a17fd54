//! Helper utilities for config loader path handling.

use crate::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by canonicalizing when possible, preserving NotFound.
pub(super) fn normalize_path(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(ConfigError::read_failed(path, err)),
    }
}

/// Resolve `path` against `base` unless it is already absolute.
pub(super) fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Collect non-empty names in order, dropping duplicates.
pub(super) fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for name in names {
        if !name.is_empty() && !unique.iter().any(|seen| seen == name) {
            unique.push(name.to_string());
        }
    }
    unique
}

/// True when `name` is a single file name: no separators, no `.` or `..`.
pub(super) fn is_plain_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unique_names_keeps_first_occurrence() {
        assert_eq!(
            unique_names(["web", "web", "", "default"]),
            vec!["web".to_string(), "default".to_string()]
        );
    }

    #[test]
    fn resolve_against_keeps_absolute_paths() {
        let base = Path::new("/srv/app");
        assert_eq!(
            resolve_against(base, Path::new("conf")),
            PathBuf::from("/srv/app/conf")
        );
        assert_eq!(
            resolve_against(base, Path::new("/etc/app")),
            PathBuf::from("/etc/app")
        );
    }

    #[test]
    fn plain_names_exclude_path_traversal() {
        assert!(is_plain_name("production"));
        assert!(is_plain_name("ci.linux"));
        for name in ["../x", "..", ".", "a/b", "a\\b", "/etc/passwd", ""] {
            assert!(!is_plain_name(name), "{name}");
        }
    }
}
