//! Type-checked merge of an override config onto a base config.
//!
//! The base declares the top-level sections: override keys that the base does
//! not have at the root are ignored. Inside a section both sides share, the
//! override may add entries. Values of different types never replace each
//! other (`null` is a type of its own), and arrays are replaced wholesale.

use crate::{ConfigError, MergeType};
use log::warn;
use serde_json::{Map, Value};

/// Merge `overlay` onto `base` in place. `None` leaves `base` unchanged.
pub fn merge(base: &mut Value, overlay: Option<&Value>) -> Result<(), ConfigError> {
    let Some(overlay) = overlay else {
        return Ok(());
    };
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for key in overlay_map.keys() {
                if !base_map.contains_key(key) {
                    warn!("ignoring override key '{key}' not declared by the base config");
                }
            }
            for (key, slot) in base_map.iter_mut() {
                if let Some(value) = overlay_map.get(key) {
                    merge_value(slot, value, key)?;
                }
            }
            Ok(())
        }
        (base, overlay) => Err(ConfigError::TypeMismatch {
            key: "root".to_string(),
            base: MergeType::of(base),
            overlay: MergeType::of(overlay),
        }),
    }
}

/// Fold several optional overrides onto `base` in order.
pub fn merge_all<'a>(
    base: &mut Value,
    overlays: impl IntoIterator<Item = Option<&'a Value>>,
) -> Result<(), ConfigError> {
    for overlay in overlays {
        merge(base, overlay)?;
    }
    Ok(())
}

/// Merge one value slot; `path` is the dotted key used in errors.
fn merge_value(slot: &mut Value, value: &Value, path: &str) -> Result<(), ConfigError> {
    let base_type = MergeType::of(slot);
    let overlay_type = MergeType::of(value);
    if base_type != overlay_type {
        return Err(ConfigError::TypeMismatch {
            key: path.to_string(),
            base: base_type,
            overlay: overlay_type,
        });
    }

    match (slot, value) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            merge_section(base_map, overlay_map, path)
        }
        (slot, value) => {
            *slot = value.clone();
            Ok(())
        }
    }
}

fn merge_section(
    base_map: &mut Map<String, Value>,
    overlay_map: &Map<String, Value>,
    path: &str,
) -> Result<(), ConfigError> {
    for (key, value) in overlay_map {
        let child_path = format!("{path}.{key}");
        match base_map.get_mut(key) {
            Some(slot) => merge_value(slot, value, &child_path)?,
            None => {
                base_map.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(())
}
