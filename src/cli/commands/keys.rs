//! Implementation of the `strata keys` command.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug, Default)]
pub struct KeysArgs {
    /// Only list keys starting with this dotted prefix (e.g. "database")
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct KeyRow {
    pub key: String,
    pub variable: String,
}

#[derive(Debug, Serialize)]
pub struct KeysOutput {
    pub keys: Vec<KeyRow>,
}

impl CommandOutput for KeysOutput {
    fn to_human(&self) -> String {
        if self.keys.is_empty() {
            return "No configuration keys found.".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Key").add_attribute(Attribute::Bold),
                Cell::new("Environment variable").add_attribute(Attribute::Bold),
            ]);
        for row in &self.keys {
            table.add_row(vec![Cell::new(&row.key), Cell::new(&row.variable)]);
        }
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Key bindings for the document in `dir`, filtered by `prefix`.
pub fn collect(dir: &Path, prefix: Option<&str>) -> Result<KeysOutput> {
    let keys = ConfigLoader::new(dir)
        .env_keys()
        .context("Failed to bind configuration keys")?;

    let keys = keys
        .iter()
        .map(|key| KeyRow {
            key: key.dotted(),
            variable: key.var.clone(),
        })
        .filter(|row| prefix.is_none_or(|p| row.key.starts_with(p)))
        .collect();

    Ok(KeysOutput { keys })
}

pub async fn execute(dir: &Path, args: KeysArgs, json_mode: bool) -> Result<()> {
    let result = collect(dir, args.prefix.as_deref())?;
    output(&result, json_mode);
    Ok(())
}
