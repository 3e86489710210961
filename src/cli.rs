use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Preview or import spreadsheet and CSV rosters",
    long_about = None
)]
pub struct Cli {
    /// Spreadsheet (.xlsx, .xls) or CSV file to read
    pub file: PathBuf,
    /// Record type selecting the column mapping and destination table
    #[arg(default_value = "player")]
    pub record_type: String,
    /// `preview` prints the rows as JSON, `import` upserts them into the database
    #[arg(default_value = "preview")]
    pub mode: String,
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// SQLite database file (defaults to baseball.db)
    #[arg(short, long)]
    pub database: Option<PathBuf>,
    /// Worksheet to read from a spreadsheet (defaults to the first)
    #[arg(long)]
    pub sheet: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Text treated as a missing value; repeat to list several (replaces the defaults)
    #[arg(long = "missing-value", action = ArgAction::Append, allow_hyphen_values = true)]
    pub missing_values: Vec<String>,
    /// Indent the preview JSON
    #[arg(long)]
    pub pretty: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
