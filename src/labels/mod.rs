//! Class-label resolution from on-disk label sources.
//!
//! A model directory ships with either a `class_indices.json` mapping or a
//! plain `labels.txt`. The first source that yields a non-empty ordered list
//! of class names wins; parse failures degrade to the next source instead of
//! aborting.

use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{error, warn};

/// Resolves the ordered class name list for a model.
///
/// Output index equals model output position; indices are contiguous from 0
/// (positions left unfilled by a sparse mapping are dropped).
pub fn resolve_class_names(json_path: &Path, txt_path: &Path) -> Result<Vec<String>> {
    match from_class_indices(json_path) {
        Ok(Some(names)) if !names.is_empty() => return Ok(names),
        Ok(_) => {}
        Err(e) => warn!("Failed to parse class indices JSON: {}", e),
    }

    match from_labels_txt(txt_path) {
        Ok(Some(names)) if !names.is_empty() => return Ok(names),
        Ok(_) => {}
        Err(e) => error!("Failed to load class names from labels file: {}", e),
    }

    Err(Error::NoLabelSource)
}

/// Parses a `class_indices.json` object.
///
/// Two layouts are accepted. When every key is a numeric string the keys are
/// the output indices and the values are the names. Otherwise the keys are
/// the names and the values are the indices.
fn from_class_indices(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    let Some(object) = value.as_object() else {
        return Ok(None);
    };

    if object.keys().all(|k| is_numeric_token(k)) {
        // index -> name: sort by numeric key, emit values in that order
        let mut pairs: Vec<(u64, String)> = Vec::with_capacity(object.len());
        for (key, value) in object {
            let index: u64 = key
                .parse()
                .map_err(|_| Error::config(format!("class index key '{}' out of range", key)))?;
            pairs.push((index, value_as_name(value)));
        }
        pairs.sort_by_key(|(index, _)| *index);
        return Ok(Some(pairs.into_iter().map(|(_, name)| name).collect()));
    }

    // name -> index: place each name at its index, drop unfilled slots.
    // Colliding indices are last-write-wins in key iteration order.
    let mut indexed: Vec<(String, usize)> = Vec::with_capacity(object.len());
    for (name, value) in object {
        let index = value_as_index(value).ok_or_else(|| {
            Error::config(format!("class index for '{}' is not a valid index", name))
        })?;
        indexed.push((name.clone(), index));
    }

    let size = indexed.iter().map(|(_, i)| i + 1).max().unwrap_or(0);
    let mut slots: Vec<Option<String>> = vec![None; size];
    for (name, index) in indexed {
        slots[index] = Some(name);
    }
    Ok(Some(slots.into_iter().flatten().collect()))
}

/// Parses a newline-delimited `labels.txt`.
///
/// A line may carry an explicit leading index (`"3 Melanoma"`); lines without
/// one are assigned the next sequential position. A bare index with no name
/// names itself.
fn from_labels_txt(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let mut index_to_name: BTreeMap<usize, String> = BTreeMap::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or_default();
        if is_numeric_token(first) {
            let index: usize = first
                .parse()
                .map_err(|_| Error::config(format!("label index '{}' out of range", first)))?;
            let name = parts
                .next()
                .map(str::trim)
                .filter(|rest| !rest.is_empty())
                .map(String::from)
                .unwrap_or_else(|| index.to_string());
            index_to_name.insert(index, name);
        } else {
            index_to_name.insert(index_to_name.len(), trimmed.to_string());
        }
    }

    Ok(Some(index_to_name.into_values().collect()))
}

fn is_numeric_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn value_as_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Accepts both JSON numbers and numeric strings as index values.
fn value_as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) if is_numeric_token(s) => s.parse().ok(),
        _ => None,
    }
}
