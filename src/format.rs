use std::{fmt, path::Path};

use crate::error::{ImportError, ImportResult};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];
const DELIMITED_EXTENSIONS: &[&str] = &["csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    /// Infers the format from the file extension, ignoring case.
    pub fn detect(path: &Path) -> ImportResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let matches = |candidates: &[&str]| {
            candidates
                .iter()
                .any(|candidate| extension.eq_ignore_ascii_case(candidate))
        };
        if matches(SPREADSHEET_EXTENSIONS) {
            Ok(SourceFormat::Spreadsheet)
        } else if matches(DELIMITED_EXTENSIONS) {
            Ok(SourceFormat::Delimited)
        } else {
            Err(ImportError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: if extension.is_empty() {
                    "<none>".to_string()
                } else {
                    format!(".{extension}")
                },
            })
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Delimited => write!(f, "csv"),
            SourceFormat::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}
