//! Environment variable overlay.
//!
//! Every bound key path is mapped to a variable name; when the variable is
//! present in the snapshot its value overrides whatever the document said
//! for that key. Absent variables are never an error.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use super::tree::{self, ExtractError, KeyPath};
use crate::domain::errors::{ConfigError, ConfigResult};

/// Immutable capture of environment variables.
///
/// Resolution reads the environment only through a snapshot, so the same
/// snapshot and document always resolve to the same configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// How a key path is turned into an environment variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMapping {
    /// Top-level field name, uppercased (`port` -> `PORT`).
    FieldName,
    /// Dotted path with each `(from, to)` replacement applied, uppercased
    /// (`server.port` -> `SERVER_PORT` for `(".", "_")`).
    Replace(Vec<(String, String)>),
}

/// A bound key and the variable that overrides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvKey {
    pub path: KeyPath,
    pub var: String,
}

impl EnvKey {
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// Ordered key-to-variable bindings for one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvKeyMap {
    keys: Vec<EnvKey>,
}

impl EnvKeyMap {
    pub fn iter(&self) -> impl Iterator<Item = &EnvKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Variable bound to the dotted key, if any.
    pub fn var_for(&self, dotted: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|key| key.dotted() == dotted)
            .map(|key| key.var.as_str())
    }

    /// Turn an extraction failure into a diagnostic naming its source.
    ///
    /// Failures caused by an override become [`ConfigError::Binding`] naming
    /// the variable and its value; anything else stays an unmarshal error.
    pub fn explain(&self, err: ExtractError, env: &EnvSnapshot) -> ConfigError {
        if !err.from_environment() {
            return err.into();
        }
        let reason = match self.var_for(&err.key) {
            Some(var) => format!(
                "{var}={:?}: {}",
                env.get(var).unwrap_or_default(),
                err.reason
            ),
            None => err.reason,
        };
        ConfigError::Binding {
            key: err.key,
            reason,
        }
    }
}

/// Environment overlay settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverlay {
    mapping: KeyMapping,
    allow_empty: bool,
}

impl EnvOverlay {
    /// Overlay used by the generic binder: field name verbatim.
    pub const fn field_names() -> Self {
        Self {
            mapping: KeyMapping::FieldName,
            allow_empty: true,
        }
    }

    /// Overlay used for nested shapes: `.` becomes `_`.
    pub fn hierarchical() -> Self {
        Self {
            mapping: KeyMapping::Replace(vec![(".".to_string(), "_".to_string())]),
            allow_empty: true,
        }
    }

    pub fn with_mapping(mut self, mapping: KeyMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// When false, a variable set to the empty string counts as unset.
    pub const fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    pub const fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }

    /// Variable name for a key path.
    pub fn var_name(&self, path: &[String]) -> String {
        match &self.mapping {
            KeyMapping::FieldName => path.first().map(String::as_str).unwrap_or_default().to_uppercase(),
            KeyMapping::Replace(replacements) => {
                let dotted = path.join(".");
                replacements
                    .iter()
                    .fold(dotted, |name, (from, to)| name.replace(from.as_str(), to))
                    .to_uppercase()
            }
        }
    }

    /// Bind every key path to its variable, rejecting names the environment cannot hold.
    pub fn bind<I>(&self, paths: I) -> ConfigResult<EnvKeyMap>
    where
        I: IntoIterator<Item = KeyPath>,
    {
        let keys = paths
            .into_iter()
            .map(|path| {
                let var = self.var_name(&path);
                validate_var_name(&path, &var)?;
                Ok(EnvKey { path, var })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(EnvKeyMap { keys })
    }

    /// Build the override tree for every bound key whose variable is present.
    ///
    /// Values are coerced to the type of the value found at the same path in
    /// `base` (shape defaults merged with the document).
    pub fn overrides(&self, keys: &EnvKeyMap, env: &EnvSnapshot, base: &Value) -> Value {
        let mut overrides = Value::Object(serde_json::Map::new());
        for key in keys.iter() {
            let Some(raw) = env.get(&key.var) else {
                continue;
            };
            if raw.is_empty() && !self.allow_empty {
                debug!(key = %key.dotted(), var = %key.var, "ignoring empty environment variable");
                continue;
            }
            let value = tree::coerce(raw, tree::get_path(base, &key.path));
            debug!(key = %key.dotted(), var = %key.var, "environment overrides key");
            tree::set_path(&mut overrides, &key.path, value);
        }
        overrides
    }
}

impl Default for EnvOverlay {
    fn default() -> Self {
        Self::hierarchical()
    }
}

fn validate_var_name(path: &[String], var: &str) -> ConfigResult<()> {
    let reason = if var.is_empty() {
        Some("variable name is empty")
    } else if var.contains('=') {
        Some("variable name contains '='")
    } else if var.contains('\0') {
        Some("variable name contains a NUL byte")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(ConfigError::Binding {
            key: path.join("."),
            reason: format!("{reason}: {var:?}"),
        })
    })
}
