//! In-memory table shared by both parsers.
//!
//! A [`Table`] keeps its headers and rows in source order. Each row remembers
//! the 1-based source line it came from so later stages can report errors
//! against the file the user actually uploaded.

use std::collections::HashSet;

use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    pub line: usize,
    pub cells: Vec<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
    headers: Vec<String>,
    rows: Vec<Row<T>>,
}

impl<T> Table<T> {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Callers pad or reject rows before they get here, so the
    /// cell count always equals the header count.
    pub fn push_row(&mut self, line: usize, cells: Vec<T>) {
        debug_assert_eq!(cells.len(), self.headers.len());
        self.rows.push(Row { line, cells });
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn map_cells<U, F>(self, mut f: F) -> Table<U>
    where
        F: FnMut(T) -> U,
    {
        Table {
            headers: self.headers,
            rows: self
                .rows
                .into_iter()
                .map(|row| Row {
                    line: row.line,
                    cells: row.cells.into_iter().map(&mut f).collect(),
                })
                .collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = RowView<'_, T>> {
        self.rows.iter().map(|row| RowView {
            headers: &self.headers,
            row,
        })
    }
}

/// A row paired with the table headers, so cells can be looked up by name.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a, T> {
    headers: &'a [String],
    row: &'a Row<T>,
}

impl<'a, T> RowView<'a, T> {
    pub fn line(&self) -> usize {
        self.row.line
    }

    /// Returns `None` when the column does not exist in the table.
    pub fn get(&self, column: &str) -> Option<&'a T> {
        self.headers
            .iter()
            .position(|header| header == column)
            .and_then(|idx| self.row.cells.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a T)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.row.cells.iter())
    }
}

impl<T: Serialize> Serialize for RowView<'_, T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (name, cell) in self.iter() {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

/// Serializes as an array of objects whose keys follow column order.
impl<T: Serialize> Serialize for Table<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

/// Makes header names usable as object keys: blank headers become
/// `Unnamed: <index>` and repeats get `.1`, `.2`, ... suffixes.
pub fn unique_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut headers = Vec::new();
    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut suffix = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}
