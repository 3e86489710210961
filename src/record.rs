//! Typed destination records.
//!
//! Each [`RecordType`] variant has one [`ImportRecord`] implementation that
//! owns its column-to-field mapping, its key, and the subset of fields an
//! upsert is allowed to overwrite.

use std::{fmt, str::FromStr};

use crate::{
    data::Value,
    error::{ImportError, ImportResult},
    table::RowView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordType {
    #[default]
    Player,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Player => "player",
        }
    }
}

impl FromStr for RecordType {
    type Err = ImportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "player" => Ok(RecordType::Player),
            _ => Err(ImportError::UnsupportedRecordType(value.to_string())),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait ImportRecord: Sized {
    /// Destination table.
    const TABLE: &'static str;
    /// Source columns the mapping reads; all must be present in the file.
    const SOURCE_COLUMNS: &'static [&'static str];
    /// Destination columns, in the order [`ImportRecord::params`] yields values.
    const TABLE_COLUMNS: &'static [&'static str];
    /// Unique key an upsert collides on.
    const KEY_COLUMNS: &'static [&'static str];
    /// Columns overwritten when a row with the same key already exists.
    const MUTABLE_COLUMNS: &'static [&'static str];
    /// `CREATE TABLE IF NOT EXISTS` statement for the destination table.
    const TABLE_DEFINITION: &'static str;

    fn from_row(row: &RowView<'_, Value>) -> ImportResult<Self>;

    fn params(&self) -> Vec<Value>;

    /// Fails on the first mapped column the file does not provide.
    fn check_columns(headers: &[String]) -> ImportResult<()> {
        for column in Self::SOURCE_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(ImportError::malformed(
                    1,
                    format!("missing column '{column}' required for '{}'", Self::TABLE),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub family_id: String,
    pub serial_number: i64,
    pub year: i64,
    pub player_id: String,
    /// Team assignment happens elsewhere; imports always store null.
    pub p_team_id: Option<String>,
    pub ch_name: Option<String>,
    pub nickname: Option<String>,
    pub grade: Option<String>,
    pub school_name: Option<String>,
    pub jersey_number: Option<String>,
    pub sibling: Option<String>,
    pub staff: Option<String>,
    pub status: Option<String>,
}

impl ImportRecord for PlayerRecord {
    const TABLE: &'static str = "player";
    const SOURCE_COLUMNS: &'static [&'static str] = &[
        "family_id",
        "serial_number",
        "year",
        "player_id",
        "ch_name",
        "nickname",
        "grade",
        "school_name",
        "jersey_number",
        "sibling",
        "staff",
        "status",
    ];
    const TABLE_COLUMNS: &'static [&'static str] = &[
        "family_id",
        "serial_number",
        "year",
        "player_id",
        "p_team_id",
        "ch_name",
        "nickname",
        "grade",
        "school_name",
        "jersey_number",
        "sibling",
        "staff",
        "status",
    ];
    const KEY_COLUMNS: &'static [&'static str] =
        &["family_id", "serial_number", "year", "player_id"];
    const MUTABLE_COLUMNS: &'static [&'static str] =
        &["ch_name", "nickname", "jersey_number", "status"];
    const TABLE_DEFINITION: &'static str = "CREATE TABLE IF NOT EXISTS player (
        family_id TEXT NOT NULL,
        serial_number INTEGER NOT NULL,
        year INTEGER NOT NULL,
        player_id TEXT NOT NULL,
        p_team_id TEXT,
        ch_name TEXT,
        nickname TEXT,
        grade TEXT,
        school_name TEXT,
        jersey_number TEXT,
        sibling TEXT,
        staff TEXT,
        status TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (family_id, serial_number, year, player_id)
    )";

    fn from_row(row: &RowView<'_, Value>) -> ImportResult<Self> {
        Ok(Self {
            family_id: required_text(row, "family_id")?,
            serial_number: required_integer(row, "serial_number")?,
            year: required_integer(row, "year")?,
            player_id: required_text(row, "player_id")?,
            p_team_id: None,
            ch_name: optional_text(row, "ch_name")?,
            nickname: optional_text(row, "nickname")?,
            grade: optional_text(row, "grade")?,
            school_name: optional_text(row, "school_name")?,
            jersey_number: optional_text(row, "jersey_number")?,
            sibling: optional_text(row, "sibling")?,
            staff: optional_text(row, "staff")?,
            status: optional_text(row, "status")?,
        })
    }

    fn params(&self) -> Vec<Value> {
        vec![
            Value::Text(self.family_id.clone()),
            Value::Integer(self.serial_number),
            Value::Integer(self.year),
            Value::Text(self.player_id.clone()),
            text_or_null(&self.p_team_id),
            text_or_null(&self.ch_name),
            text_or_null(&self.nickname),
            text_or_null(&self.grade),
            text_or_null(&self.school_name),
            text_or_null(&self.jersey_number),
            text_or_null(&self.sibling),
            text_or_null(&self.staff),
            text_or_null(&self.status),
        ]
    }
}

fn text_or_null(value: &Option<String>) -> Value {
    value.clone().map(Value::Text).unwrap_or(Value::Null)
}

fn cell<'a>(row: &RowView<'a, Value>, column: &str) -> ImportResult<&'a Value> {
    row.get(column)
        .ok_or_else(|| ImportError::malformed(row.line(), format!("missing column '{column}'")))
}

fn optional_text(row: &RowView<'_, Value>, column: &str) -> ImportResult<Option<String>> {
    Ok(cell(row, column)?.as_display())
}

fn required_text(row: &RowView<'_, Value>, column: &str) -> ImportResult<String> {
    optional_text(row, column)?.ok_or_else(|| {
        ImportError::malformed(row.line(), format!("key column '{column}' is empty"))
    })
}

fn required_integer(row: &RowView<'_, Value>, column: &str) -> ImportResult<i64> {
    let invalid = |found: &Value| {
        ImportError::malformed(
            row.line(),
            format!("key column '{column}' must be a whole number, found '{found}'"),
        )
    };
    match cell(row, column)? {
        Value::Null => Err(ImportError::malformed(
            row.line(),
            format!("key column '{column}' is empty"),
        )),
        Value::Integer(i) => Ok(*i),
        Value::Float(f) => whole_number(*f).ok_or_else(|| invalid(&Value::Float(*f))),
        Value::Text(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(whole_number))
                .ok_or_else(|| invalid(&Value::Text(text.clone())))
        }
        other => Err(invalid(other)),
    }
}

/// `2024.0` is a whole number; `2024.5`, infinities and anything outside
/// `i64` are not.
fn whole_number(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (value.is_finite() && value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value))
        .then_some(value as i64)
}
