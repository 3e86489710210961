//! The import pipeline: locate → parse → normalize → preview or persist →
//! cleanup.
//!
//! [`run`] is the only entry point. It writes its normal output to the stream
//! it is handed and reports every failure as an [`ImportError`]; diagnostics
//! go through `log`, which writes to stderr.

use std::{
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{debug, info, warn};

use crate::{
    data::Value,
    error::{ImportError, ImportResult},
    format::SourceFormat,
    normalize::{self, MissingValues},
    preview,
    reader::{self, ReadOptions},
    record::{ImportRecord, PlayerRecord, RecordType},
    store::SqliteStore,
    table::Table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Preview,
    Import,
}

impl FromStr for Mode {
    type Err = ImportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(Mode::Preview),
            "import" => Ok(Mode::Import),
            _ => Err(ImportError::UnsupportedMode(value.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Preview => write!(f, "preview"),
            Mode::Import => write!(f, "import"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub path: PathBuf,
    pub record_type: String,
    pub mode: String,
    pub database: PathBuf,
    pub read: ReadOptions,
    pub missing: MissingValues,
    pub pretty: bool,
}

impl ImportRequest {
    pub fn new(path: impl Into<PathBuf>, record_type: &str, mode: &str) -> Self {
        Self {
            path: path.into(),
            record_type: record_type.to_string(),
            mode: mode.to_string(),
            database: PathBuf::from(crate::config::DEFAULT_DATABASE),
            read: ReadOptions::default(),
            missing: MissingValues::default(),
            pretty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Previewed { rows: usize },
    Imported { rows: usize },
}

pub fn run<W>(request: &ImportRequest, out: &mut W) -> ImportResult<Outcome>
where
    W: Write + ?Sized,
{
    let record_type: RecordType = request.record_type.parse()?;
    let mode: Mode = request.mode.parse()?;
    debug!("Running {mode} of {:?} as '{record_type}'", request.path);

    let table = load(&request.path, &request.read, &request.missing)?;

    match mode {
        Mode::Preview => {
            preview::write_json(&table, out, request.pretty)?;
            Ok(Outcome::Previewed { rows: table.len() })
        }
        Mode::Import => {
            let rows = match record_type {
                RecordType::Player => import_records::<PlayerRecord>(&table, &request.database)?,
            };
            // The rows are committed; a broken stdout must not keep the file.
            if let Err(err) = writeln!(out, "Imported {rows} {record_type} record(s)") {
                warn!("Confirmation not written: {err}");
            }
            tolerate(remove_source(&request.path))?;
            Ok(Outcome::Imported { rows })
        }
    }
}

/// Parses the source file and normalizes every missing value to null.
pub fn load(
    path: &Path,
    options: &ReadOptions,
    missing: &MissingValues,
) -> ImportResult<Table<Value>> {
    if !path.is_file() {
        return Err(ImportError::FileNotFound(path.to_path_buf()));
    }
    let format = SourceFormat::detect(path)?;
    let raw = reader::read_table(path, format, options)?;
    let table = normalize::normalize(raw, missing);
    info!(
        "Loaded {} row(s) across {} column(s) from {format} {:?}",
        table.len(),
        table.headers().len(),
        path
    );
    Ok(table)
}

/// Upserts every row inside one transaction. The records are built before the
/// store is opened, so malformed input never reaches the database; any
/// failure after that drops the batch uncommitted.
pub fn import_records<R: ImportRecord>(
    table: &Table<Value>,
    database: &Path,
) -> ImportResult<usize> {
    R::check_columns(table.headers())?;
    let records = table
        .records()
        .map(|row| R::from_row(&row).map(|record| (row.line(), record)))
        .collect::<ImportResult<Vec<_>>>()?;

    let mut store = SqliteStore::open(database)?;
    store.ensure_table::<R>()?;
    let mut batch = store.begin::<R>()?;
    for (line, record) in &records {
        batch.upsert(*line, record)?;
    }
    let rows = batch.commit()?;
    info!(
        "Committed {rows} row(s) into '{}' at {:?}",
        R::TABLE,
        store.path()
    );

    if let Err(err) = store.close() {
        warn!("{err}: {}", source_message(&err));
    }
    Ok(rows)
}

/// Removes the consumed source file.
fn remove_source(path: &Path) -> ImportResult<()> {
    fs::remove_file(path).map_err(|source| ImportError::CleanupFailure {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Removed source file {:?}", path);
    Ok(())
}

/// Downgrades non-fatal errors to a warning.
fn tolerate(result: ImportResult<()>) -> ImportResult<()> {
    match result {
        Err(err) if err.is_non_fatal() => {
            warn!("{err}: {}", source_message(&err));
            Ok(())
        }
        other => other,
    }
}

fn source_message(err: &ImportError) -> String {
    std::error::Error::source(err)
        .map(|source| source.to_string())
        .unwrap_or_default()
}
