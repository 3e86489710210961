//! Layered run configuration: built-in defaults, then an optional YAML file,
//! then command-line flags.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    cli::{Cli, parse_delimiter},
    io_utils,
    normalize::MissingValues,
    reader::ReadOptions,
};

pub const DEFAULT_DATABASE: &str = "baseball.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// SQLite database file that receives imported rows.
    pub database: PathBuf,
    /// Worksheet to read; the first one when unset.
    pub sheet: Option<String>,
    /// CSV delimiter, in any form `--delimiter` accepts.
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    /// Replaces the default missing-value markers when set.
    pub missing_values: Option<Vec<String>>,
    pub pretty: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            sheet: None,
            delimiter: None,
            input_encoding: None,
            missing_values: None,
            pretty: false,
        }
    }
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening config file {path:?}"))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(cli);
        debug!("Resolved configuration: {config:?}");
        Ok(config)
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(database) = &cli.database {
            self.database = database.clone();
        }
        if let Some(sheet) = &cli.sheet {
            self.sheet = Some(sheet.clone());
        }
        if let Some(delimiter) = cli.delimiter {
            self.delimiter = Some((delimiter as char).to_string());
        }
        if let Some(encoding) = &cli.input_encoding {
            self.input_encoding = Some(encoding.clone());
        }
        if !cli.missing_values.is_empty() {
            self.missing_values = Some(cli.missing_values.clone());
        }
        self.pretty |= cli.pretty;
    }

    pub fn read_options(&self) -> Result<ReadOptions> {
        let delimiter = match self.delimiter.as_deref() {
            Some(value) => parse_delimiter(value)
                .map_err(|err| anyhow!("Invalid delimiter '{value}': {err}"))?,
            None => io_utils::DEFAULT_CSV_DELIMITER,
        };
        let encoding = io_utils::resolve_encoding(self.input_encoding.as_deref())?;
        Ok(ReadOptions {
            delimiter,
            encoding,
            sheet: self.sheet.clone(),
        })
    }

    pub fn missing_values(&self) -> MissingValues {
        match &self.missing_values {
            Some(values) => MissingValues::new(values.iter().cloned()),
            None => MissingValues::default(),
        }
    }
}
