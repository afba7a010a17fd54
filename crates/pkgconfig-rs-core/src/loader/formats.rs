//! File format loaders keyed by extension.
//!
//! `ScriptLoader` reads data-only JavaScript modules: the module must consist of
//! a single `module.exports = ...` or `export default ...` statement whose
//! right-hand side is an object or array literal. The literal is parsed as
//! JSON5; nothing is executed.

use crate::ConfigError;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Strategy for turning file contents into a config value.
pub trait FileLoader: fmt::Debug + Send + Sync {
    /// Extension handled by this loader, without the leading dot.
    fn extension(&self) -> &str;

    /// Parse file contents read from `path`.
    fn parse(&self, path: &Path, contents: &str) -> Result<Value, ConfigError>;
}

/// Strict JSON data files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl FileLoader for JsonLoader {
    fn extension(&self) -> &str {
        "json"
    }

    fn parse(&self, path: &Path, contents: &str) -> Result<Value, ConfigError> {
        serde_json::from_str(contents).map_err(|err| ConfigError::Syntax {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

/// JSON5 data files (comments, unquoted keys, trailing commas).
#[derive(Debug, Clone, Copy, Default)]
pub struct Json5Loader;

impl FileLoader for Json5Loader {
    fn extension(&self) -> &str {
        "json5"
    }

    fn parse(&self, path: &Path, contents: &str) -> Result<Value, ConfigError> {
        json5::from_str(contents).map_err(|err| ConfigError::Syntax {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

/// Data-only JavaScript modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLoader;

/// Statements that export the module value.
const EXPORT_FORMS: &[(&str, bool)] = &[
    ("module.exports", true),
    ("export default", false),
];

impl FileLoader for ScriptLoader {
    fn extension(&self) -> &str {
        "js"
    }

    fn parse(&self, path: &Path, contents: &str) -> Result<Value, ConfigError> {
        let script_error = |message: &str| ConfigError::Script {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        let mut rest = skip_directives(skip_trivia(contents));
        let Some(after_export) = EXPORT_FORMS.iter().find_map(|(keyword, needs_assign)| {
            let tail = rest.strip_prefix(keyword)?;
            if *needs_assign {
                tail.trim_start().strip_prefix('=')
            } else if tail.starts_with(char::is_whitespace) {
                Some(tail)
            } else {
                None
            }
        }) else {
            return Err(script_error(
                "expected `module.exports = ...` or `export default ...`",
            ));
        };
        rest = skip_trivia(after_export);

        let Some(end) = literal_end(rest) else {
            return Err(script_error(
                "exported value must be a complete object or array literal",
            ));
        };
        let (literal, trailer) = rest.split_at(end);

        let mut trailer = skip_trivia(trailer);
        while let Some(next) = trailer.strip_prefix(';') {
            trailer = skip_trivia(next);
        }
        if !trailer.is_empty() {
            return Err(script_error("unexpected statements after the export"));
        }

        json5::from_str(literal).map_err(|err| ConfigError::Syntax {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

/// Skip whitespace and `//` or `/* */` comments.
fn skip_trivia(mut src: &str) -> &str {
    loop {
        src = src.trim_start();
        if let Some(rest) = src.strip_prefix("//") {
            src = rest.find('\n').map_or("", |idx| &rest[idx + 1..]);
        } else if let Some(rest) = src.strip_prefix("/*") {
            match rest.find("*/") {
                Some(idx) => src = &rest[idx + 2..],
                None => return rest,
            }
        } else {
            return src;
        }
    }
}

/// Skip leading `"use strict";` style directives.
fn skip_directives(mut src: &str) -> &str {
    for directive in ["\"use strict\"", "'use strict'"] {
        if let Some(rest) = src.strip_prefix(directive) {
            src = skip_trivia(rest);
            src = skip_trivia(src.strip_prefix(';').unwrap_or(src));
        }
    }
    src
}

/// Byte offset just past the object or array literal at the start of `src`.
fn literal_end(src: &str) -> Option<usize> {
    if !src.starts_with(['{', '[']) {
        return None;
    }
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                idx += 1;
                while idx < bytes.len() && bytes[idx] != quote {
                    if bytes[idx] == b'\\' {
                        idx += 1;
                    }
                    idx += 1;
                }
            }
            b'/' if bytes.get(idx + 1) == Some(&b'/') => {
                while idx < bytes.len() && bytes[idx] != b'\n' {
                    idx += 1;
                }
            }
            b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                idx += 2;
                while idx + 1 < bytes.len() && !(bytes[idx] == b'*' && bytes[idx + 1] == b'/') {
                    idx += 1;
                }
                idx += 1;
            }
            _ => {}
        }
        idx += 1;
    }
    None
}
