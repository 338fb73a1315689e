//! Operations over untyped configuration trees.
//!
//! Documents, shape defaults and environment overrides are all handled as
//! `serde_json::Value` trees before figment layers them and extracts the
//! typed result. The shape tree is the serialized `Default` of the target
//! type; it supplies the canonical key spelling and the scalar type each
//! leaf must have.

use std::any::type_name;

use figment::providers::Serialized;
use figment::value::{Dict, Map as ProfileMap};
use figment::{Figment, Metadata, Profile, Provider};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::errors::{ConfigError, ConfigResult};

/// Provider name of the shape defaults layer.
pub const DEFAULTS_LAYER: &str = "shape defaults";
/// Provider name of the document layer.
pub const DOCUMENT_LAYER: &str = "document";
/// Provider name of the environment override layer.
pub const ENVIRONMENT_LAYER: &str = "environment";

/// A key path from the root of a tree to one of its leaves.
pub type KeyPath = Vec<String>;

/// Serialize the default instance of `S` into its shape tree.
pub fn shape_tree<S>() -> ConfigResult<Value>
where
    S: Serialize + Default,
{
    serde_json::to_value(S::default()).map_err(|e| ConfigError::Unmarshal {
        shape: type_name::<S>(),
        reason: format!("shape is not serializable: {e}"),
    })
}

/// Rewrite `doc` keys to the spelling used by `shape`, matching case-insensitively.
///
/// Keys without a counterpart in the shape (entries of map-typed fields,
/// unknown keys) are kept verbatim. A present but empty section (`database:`
/// with every child commented out) parses as null and is dropped, so the
/// section keeps its defaults.
pub fn canonicalize(doc: Value, shape: Option<&Value>) -> Value {
    match doc {
        Value::Object(entries) => {
            let shape_entries = shape.and_then(Value::as_object);
            let mut out = Map::new();
            for (key, value) in entries {
                let canonical = shape_entries.and_then(|s| {
                    s.keys()
                        .find(|candidate| candidate.eq_ignore_ascii_case(&key))
                        .cloned()
                });
                let child_shape = canonical
                    .as_ref()
                    .and_then(|k| shape_entries.and_then(|s| s.get(k)));
                if value.is_null() && child_shape.is_some_and(Value::is_object) {
                    continue;
                }
                let value = canonicalize(value, child_shape);
                out.insert(canonical.unwrap_or(key), value);
            }
            Value::Object(out)
        }
        other => other,
    }
}

/// Coerce scalar leaves of `doc` to the scalar types found in `shape`.
///
/// Documents that carry everything as text (dotenv files, quoted YAML) are
/// brought in line with the typed fields they populate. Leaves that cannot
/// be converted are left alone so extraction reports the mismatch.
pub fn conform(doc: &mut Value, shape: Option<&Value>) {
    if let Value::Object(entries) = doc {
        for (key, value) in entries.iter_mut() {
            conform(value, shape.and_then(|s| s.get(key.as_str())));
        }
        return;
    }
    let replacement = match (&*doc, shape) {
        (Value::String(raw), Some(like)) if !like.is_string() => Some(coerce(raw, Some(like))),
        (Value::Number(_) | Value::Bool(_), Some(Value::String(_))) => {
            Some(Value::String(doc.to_string()))
        }
        _ => None,
    };
    if let Some(value) = replacement {
        *doc = value;
    }
}

/// Convert raw text into a value shaped like `like`.
///
/// Without a reference value the text is parsed leniently: integer, float,
/// boolean, then plain string. Empty text for a numeric or boolean field
/// decodes to that field's zero value.
pub fn coerce(raw: &str, like: Option<&Value>) -> Value {
    if raw.trim().is_empty() {
        match like {
            Some(Value::Bool(_)) => return Value::Bool(false),
            Some(Value::Number(n)) if n.is_f64() => return Value::from(0.0),
            Some(Value::Number(_)) => return Value::from(0),
            _ => {}
        }
    }
    match like {
        Some(Value::Bool(_)) => {
            parse_bool(raw).map_or_else(|| Value::String(raw.to_string()), Value::Bool)
        }
        Some(Value::Number(n)) if n.is_f64() => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| Value::String(raw.to_string()), Value::Number),
        Some(Value::Number(_)) => parse_integer(raw).unwrap_or_else(|| Value::String(raw.to_string())),
        Some(_) => Value::String(raw.to_string()),
        None => parse_integer(raw)
            .or_else(|| {
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
            })
            .or_else(|| parse_bool(raw).map(Value::Bool))
            .unwrap_or_else(|| Value::String(raw.to_string())),
    }
}

fn parse_integer(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .map(Value::from)
        .or_else(|_| trimmed.parse::<u64>().map(Value::from))
        .ok()
}

/// Boolean spellings accepted for boolean fields.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Deep-merge `overlay` onto `base`; overlay scalars win, objects merge.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_entries), Value::Object(overlay_entries)) => {
            for (key, value) in overlay_entries {
                match base_entries.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_entries.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Every leaf path of `tree`, in key order.
///
/// Empty objects contribute no leaves; nulls and arrays are leaves.
pub fn leaf_paths(tree: &Value) -> Vec<KeyPath> {
    let mut paths = Vec::new();
    collect_leaves(tree, &mut Vec::new(), &mut paths);
    paths
}

fn collect_leaves(tree: &Value, prefix: &mut KeyPath, out: &mut Vec<KeyPath>) {
    match tree {
        Value::Object(entries) => {
            for (key, value) in entries {
                prefix.push(key.clone());
                collect_leaves(value, prefix, out);
                prefix.pop();
            }
        }
        _ if prefix.is_empty() => {}
        _ => out.push(prefix.clone()),
    }
}

pub fn get_path<'a>(tree: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(tree, |node, key| node.get(key.as_str()))
}

/// Set the value at `path`, creating intermediate objects as needed.
pub fn set_path(tree: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *tree = value;
        return;
    };
    let mut node = tree;
    for key in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(entries) = node else {
            return;
        };
        node = entries.entry(key.clone()).or_insert(Value::Null);
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(entries) = node {
        entries.insert(last.clone(), value);
    }
}

/// A figment provider that names the layer it contributes.
struct Layer<T> {
    name: &'static str,
    values: Serialized<T>,
}

impl<T: Serialize> Layer<T> {
    fn new(name: &'static str, values: T) -> Self {
        Self {
            name,
            values: Serialized::defaults(values),
        }
    }
}

impl<T: Serialize> Provider for Layer<T> {
    fn metadata(&self) -> Metadata {
        Metadata::named(self.name)
    }

    fn data(&self) -> Result<ProfileMap<Profile, Dict>, figment::Error> {
        self.values.data()
    }

    fn profile(&self) -> Option<Profile> {
        Provider::profile(&self.values)
    }
}

/// Extraction failure attributed to the layer that supplied the bad value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractError {
    pub shape: &'static str,
    /// Provider name of the offending value, when figment could tell
    pub layer: Option<String>,
    /// Dotted key of the offending value; empty for whole-shape failures
    pub key: String,
    pub reason: String,
}

impl ExtractError {
    fn from_figment<S>(err: &figment::Error) -> Self {
        Self {
            shape: type_name::<S>(),
            layer: err.metadata.as_ref().map(|m| m.name.to_string()),
            key: err.path.join("."),
            reason: err.kind.to_string(),
        }
    }

    pub fn from_environment(&self) -> bool {
        self.layer.as_deref() == Some(ENVIRONMENT_LAYER)
    }
}

impl From<ExtractError> for ConfigError {
    fn from(err: ExtractError) -> Self {
        let reason = if err.key.is_empty() {
            err.reason
        } else {
            format!("{} for key '{}'", err.reason, err.key)
        };
        Self::Unmarshal {
            shape: err.shape,
            reason,
        }
    }
}

/// Layer shape defaults, document and overrides, then extract `S`.
///
/// Precedence (lowest to highest):
/// 1. `S::default()`
/// 2. Document values
/// 3. Environment overrides
pub fn extract<S>(document: Value, overrides: Value) -> Result<S, ExtractError>
where
    S: Serialize + DeserializeOwned + Default,
{
    Figment::new()
        .merge(Layer::new(DEFAULTS_LAYER, S::default()))
        .merge(Layer::new(DOCUMENT_LAYER, document))
        .merge(Layer::new(ENVIRONMENT_LAYER, overrides))
        .extract()
        .map_err(|e| ExtractError::from_figment::<S>(&e))
}
