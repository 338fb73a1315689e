//! Generic struct binder
//!
//! Populates any flat configuration shape from a document plus environment
//! variables named after the shape's top-level fields. The shape's fields
//! are discovered from its serialized `Default`, so no per-shape binding
//! code is needed:
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase", default)]
//! struct Database {
//!     host: String,
//!     port: u16,
//!     username: String,
//!     password: String,
//! }
//!
//! // Reads ./app.env, then PORT, HOST, USERNAME and PASSWORD from the environment.
//! let db: Database = strata::infrastructure::config::load_config(".")?;
//! # Ok::<(), strata::ConfigError>(())
//! ```
//!
//! Nested sections are not bound here; use [`super::ConfigLoader`] for
//! hierarchical shapes.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::env::{EnvOverlay, EnvSnapshot};
use super::source::{DocumentFormat, SourceSpec};
use super::tree;
use crate::domain::errors::ConfigResult;

/// Document name read by [`load_config`].
pub const APP_DOCUMENT: &str = "app";

/// Read `dir/app.env` and the process environment into `S`.
pub fn load_config<S>(dir: impl AsRef<Path>) -> ConfigResult<S>
where
    S: Serialize + DeserializeOwned + Default,
{
    let source = SourceSpec::new(dir.as_ref(), APP_DOCUMENT, [DocumentFormat::Env]);
    resolve(&source, &EnvSnapshot::from_process())
}

/// Resolve `S` from `source`, letting `env` override top-level fields.
///
/// Precedence (lowest to highest):
/// 1. `S::default()`
/// 2. Document values
/// 3. Environment variables named after each field, uppercased
#[instrument(skip_all, fields(shape = std::any::type_name::<S>(), dir = %source.dir().display()))]
pub fn resolve<S>(source: &SourceSpec, env: &EnvSnapshot) -> ConfigResult<S>
where
    S: Serialize + DeserializeOwned + Default,
{
    let document = source.read()?;
    let shape = tree::shape_tree::<S>()?;

    let mut doc = tree::canonicalize(document.into_value(), Some(&shape));
    tree::conform(&mut doc, Some(&shape));

    let overlay = EnvOverlay::field_names();
    let keys = overlay.bind(top_level_fields(&shape))?;

    let mut base = shape;
    tree::merge(&mut base, doc.clone());
    let overrides = overlay.overrides(&keys, env, &base);

    let resolved = tree::extract(doc, overrides).map_err(|e| keys.explain(e, env))?;
    debug!(bound = keys.len(), "resolved configuration shape");
    Ok(resolved)
}

/// Scalar top-level fields of a shape tree; nested sections are skipped.
fn top_level_fields(shape: &serde_json::Value) -> Vec<tree::KeyPath> {
    shape
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter(|(_, value)| !value.is_object())
                .map(|(name, _)| vec![name.clone()])
                .collect()
        })
        .unwrap_or_default()
}
