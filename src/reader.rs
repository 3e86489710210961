//! Parsers for the two supported source families.
//!
//! Both return a [`Table<Cell>`] with unique headers and rows in source order.
//! Missing values are left exactly as the format reports them; turning them
//! into nulls is the job of [`crate::normalize`].

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::{NaiveDateTime, Timelike};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    data::Cell,
    error::{ImportError, ImportResult},
    format::SourceFormat,
    io_utils,
    table::{Table, unique_headers},
};

/// Largest magnitude at which every integral `f64` maps to a distinct `i64`.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    pub sheet: Option<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
            sheet: None,
        }
    }
}

pub fn read_table(
    path: &Path,
    format: SourceFormat,
    options: &ReadOptions,
) -> ImportResult<Table<Cell>> {
    match format {
        SourceFormat::Delimited => parse_delimited(path, options.delimiter, options.encoding),
        SourceFormat::Spreadsheet => parse_spreadsheet(path, options.sheet.as_deref()),
    }
}

pub fn parse_delimited(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> ImportResult<Table<Cell>> {
    let csv_error = |source: csv::Error| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = io_utils::open_delimited_reader(path, delimiter, encoding)?;
    let headers = reader.headers().map_err(csv_error)?.clone();
    let headers = unique_headers(headers.iter().map(str::to_string));
    let width = headers.len();
    let mut table = Table::new(headers);

    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 2);
        if record.len() > width {
            return Err(ImportError::malformed(
                line,
                format!("expected {width} field(s) but found {}", record.len()),
            ));
        }
        let mut cells = record
            .iter()
            .map(|field| Cell::Text(field.to_string()))
            .collect::<Vec<_>>();
        cells.resize(width, Cell::Empty);
        table.push_row(line, cells);
    }

    debug!(
        "Parsed {} row(s) across {} column(s) from {:?}",
        table.len(),
        width,
        path
    );
    Ok(table)
}

pub fn parse_spreadsheet(path: &Path, sheet: Option<&str>) -> ImportResult<Table<Cell>> {
    let spreadsheet_error = |source: calamine::Error| ImportError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;

    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|candidate| candidate == name) {
                return Err(ImportError::MissingSheet {
                    path: path.to_path_buf(),
                    sheet: name.to_string(),
                });
            }
            workbook.worksheet_range(name).map_err(spreadsheet_error)?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::MissingSheet {
                path: path.to_path_buf(),
                sheet: "<first>".to_string(),
            })?
            .map_err(spreadsheet_error)?,
    };

    let table = table_from_range(&range);
    debug!(
        "Parsed {} row(s) across {} column(s) from {:?}",
        table.len(),
        table.headers().len(),
        path
    );
    Ok(table)
}

fn table_from_range(range: &Range<Data>) -> Table<Cell> {
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Table::new(Vec::new());
    };
    let headers = unique_headers(header_row.iter().map(header_text));
    let width = headers.len();
    let mut table = Table::new(headers);

    for (offset, row) in rows.enumerate() {
        if row.iter().all(|data| matches!(data, Data::Empty)) {
            continue;
        }
        let mut cells = row.iter().map(cell_from_data).collect::<Vec<_>>();
        cells.resize(width, Cell::Empty);
        table.push_row(first_line + offset + 1, cells);
    }
    table
}

fn header_text(data: &Data) -> String {
    match cell_from_data(data) {
        Cell::Empty => String::new(),
        Cell::Text(text) | Cell::Error(text) => text,
        Cell::Integer(i) => i.to_string(),
        Cell::Float(f) => f.to_string(),
        Cell::Boolean(b) => b.to_string(),
    }
}

pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Integer(*i),
        Data::Float(f) => float_cell(*f),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(moment) => Cell::Text(format_datetime(&moment)),
            None => float_cell(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(err) => Cell::Error(err.to_string()),
    }
}

/// Spreadsheets store every number as a float; whole numbers come back as
/// integers so `7` does not turn into `7.0` downstream.
fn float_cell(value: f64) -> Cell {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_FLOAT_INT {
        Cell::Integer(value as i64)
    } else {
        Cell::Float(value)
    }
}

fn format_datetime(moment: &NaiveDateTime) -> String {
    if moment.num_seconds_from_midnight() == 0 {
        moment.format("%Y-%m-%d").to_string()
    } else {
        moment.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
