//! Error taxonomy for the import pipeline.
//!
//! Every variant except [`ImportError::CleanupFailure`] aborts a run. Cleanup
//! failures are only ever logged by the pipeline; the variant exists so the
//! message is rendered the same way as everything else.
//!
//! Messages describe the failing step only; the underlying cause is exposed
//! through `source()` and printed by the caller.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("Unsupported file format '{extension}' for {path:?} (expected .csv or a spreadsheet such as .xlsx, .xls, .ods)")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Unsupported record type '{0}' (expected 'player')")]
    UnsupportedRecordType(String),

    #[error("Unsupported mode '{0}' (expected 'preview' or 'import')")]
    UnsupportedMode(String),

    #[error("Reading {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parsing CSV {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Reading spreadsheet {path:?}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Worksheet '{sheet}' not found in {path:?}")]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("Row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    #[error("Opening store {database:?}")]
    StoreConnectionFailure {
        database: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Upserting row {row} into '{table}'")]
    RowUpsertFailure {
        row: usize,
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Committing import into '{table}'")]
    CommitFailure {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Writing output")]
    Output(#[source] io::Error),

    #[error("Removing source file {path:?}")]
    CleanupFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ImportError {
    pub fn malformed(row: usize, message: impl Into<String>) -> Self {
        ImportError::MalformedRow {
            row,
            message: message.into(),
        }
    }

    /// Whether the error leaves the outcome of a run untouched.
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, ImportError::CleanupFailure { .. })
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
