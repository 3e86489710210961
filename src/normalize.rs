//! Missing-value normalization.
//!
//! After [`normalize`] a table holds [`Value`]s only, and [`Value::Null`] is
//! the sole representation of a missing cell.

use std::collections::HashSet;

use crate::{
    data::{Cell, Value},
    table::Table,
};

/// Text markers conventionally written for "no value" by spreadsheet tools and
/// data-frame exports.
pub const DEFAULT_MISSING_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValues {
    sentinels: HashSet<String>,
}

impl Default for MissingValues {
    fn default() -> Self {
        Self::new(DEFAULT_MISSING_VALUES.iter().copied())
    }
}

impl MissingValues {
    pub fn new<I, S>(sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sentinels: sentinels.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches exactly; surrounding whitespace is significant.
    pub fn is_missing_text(&self, text: &str) -> bool {
        self.sentinels.contains(text)
    }

    pub fn normalize_cell(&self, cell: Cell) -> Value {
        match cell {
            Cell::Empty | Cell::Error(_) => Value::Null,
            Cell::Float(f) if f.is_nan() => Value::Null,
            Cell::Text(text) if self.is_missing_text(&text) => Value::Null,
            Cell::Text(text) => Value::Text(text),
            Cell::Integer(i) => Value::Integer(i),
            Cell::Float(f) => Value::Float(f),
            Cell::Boolean(b) => Value::Boolean(b),
        }
    }
}

pub fn normalize(table: Table<Cell>, missing: &MissingValues) -> Table<Value> {
    table.map_cells(|cell| missing.normalize_cell(cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sentinels_become_null() {
        let missing = MissingValues::default();
        for sentinel in DEFAULT_MISSING_VALUES {
            assert_eq!(
                missing.normalize_cell(Cell::Text(sentinel.to_string())),
                Value::Null,
                "sentinel {sentinel:?}"
            );
        }
        assert_eq!(missing.normalize_cell(Cell::Empty), Value::Null);
        assert_eq!(missing.normalize_cell(Cell::Float(f64::NAN)), Value::Null);
        assert_eq!(
            missing.normalize_cell(Cell::Error("#DIV/0!".to_string())),
            Value::Null
        );
    }

    #[test]
    fn present_values_pass_through_unchanged() {
        let missing = MissingValues::default();
        assert_eq!(
            missing.normalize_cell(Cell::Text(" NA".to_string())),
            Value::Text(" NA".to_string())
        );
        assert_eq!(
            missing.normalize_cell(Cell::Text("0".to_string())),
            Value::Text("0".to_string())
        );
        assert_eq!(missing.normalize_cell(Cell::Integer(0)), Value::Integer(0));
        assert_eq!(
            missing.normalize_cell(Cell::Boolean(false)),
            Value::Boolean(false)
        );
        assert_eq!(missing.normalize_cell(Cell::Float(2.5)), Value::Float(2.5));
    }

    #[test]
    fn custom_sentinels_replace_the_defaults() {
        let missing = MissingValues::new(["-", ""]);
        assert_eq!(missing.normalize_cell(Cell::Text("-".to_string())), Value::Null);
        assert_eq!(
            missing.normalize_cell(Cell::Text("NA".to_string())),
            Value::Text("NA".to_string())
        );
    }

    #[test]
    fn normalize_covers_every_cell() {
        let mut table = Table::new(vec!["a".to_string(), "b".to_string()]);
        table.push_row(2, vec![Cell::Text("x".to_string()), Cell::Empty]);
        table.push_row(3, vec![Cell::Text("nan".to_string()), Cell::Integer(1)]);

        let normalized = normalize(table, &MissingValues::default());
        assert_eq!(
            normalized.rows()[0].cells,
            vec![Value::Text("x".to_string()), Value::Null]
        );
        assert_eq!(normalized.rows()[1].cells, vec![Value::Null, Value::Integer(1)]);
    }
}
