//! Structured source reader
//!
//! Locates a named document in a directory and parses it into an untyped
//! tree. YAML, TOML and JSON go through figment's format providers;
//! dotenv-style `KEY=VALUE` files are parsed with `dotenvy`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Json, Toml, Yaml};
use figment::Figment;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::errors::{ConfigError, ConfigResult};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Toml,
    Json,
    /// Flat `KEY=VALUE` lines
    Env,
}

impl DocumentFormat {
    /// File extensions tried for this format, in order.
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Yaml => &["yaml", "yml"],
            Self::Toml => &["toml"],
            Self::Json => &["json"],
            Self::Env => &["env"],
        }
    }

    fn parse(self, path: &Path) -> Result<Map<String, Value>, String> {
        let text = || fs::read_to_string(path).map_err(|e| e.to_string());
        let figment = match self {
            Self::Env => return parse_env_file(path),
            Self::Yaml => Figment::from(Yaml::string(&text()?)),
            Self::Toml => Figment::from(Toml::string(&text()?)),
            Self::Json => Figment::from(Json::string(&text()?)),
        };
        figment.extract().map_err(|e| e.to_string())
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Json => "json",
            Self::Env => "env",
        };
        f.write_str(name)
    }
}

fn parse_env_file(path: &Path) -> Result<Map<String, Value>, String> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| e.to_string())?;
    iter.map(|item| {
        item.map(|(key, value)| (key, Value::String(value)))
            .map_err(|e| e.to_string())
    })
    .collect()
}

/// Where to find a document: `dir/name.<ext>` for each accepted format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    dir: PathBuf,
    name: String,
    formats: Vec<DocumentFormat>,
}

impl SourceSpec {
    pub fn new(
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        formats: impl IntoIterator<Item = DocumentFormat>,
    ) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
            formats: formats.into_iter().collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path and format of the first candidate file that exists.
    pub fn locate(&self) -> ConfigResult<(PathBuf, DocumentFormat)> {
        self.formats
            .iter()
            .flat_map(|format| {
                format
                    .extensions()
                    .iter()
                    .map(move |ext| (self.dir.join(format!("{}.{ext}", self.name)), *format))
            })
            .find(|(path, _)| path.is_file())
            .ok_or_else(|| {
                let tried = self
                    .formats
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                ConfigError::SourceUnreadable {
                    path: self.dir.join(&self.name),
                    reason: format!("no document found (formats tried: {tried})"),
                }
            })
    }

    /// Locate and parse the document.
    pub fn read(&self) -> ConfigResult<RawDocument> {
        let (path, format) = self.locate()?;
        let entries = format
            .parse(&path)
            .map_err(|reason| ConfigError::SourceUnreadable {
                path: path.clone(),
                reason,
            })?;
        debug!(path = %path.display(), %format, keys = entries.len(), "read configuration document");
        Ok(RawDocument {
            path,
            format,
            entries,
        })
    }
}

/// Parsed document, discarded once resolution finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    path: PathBuf,
    format: DocumentFormat,
    entries: Map<String, Value>,
}

impl RawDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn format(&self) -> DocumentFormat {
        self.format
    }

    pub const fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }
}
