use std::io::{self, Write};

use log::info;

use crate::{
    data::Value,
    error::{ImportError, ImportResult},
    table::Table,
};

/// Writes the table as one JSON array of row objects followed by a newline.
/// Non-ASCII text is written as-is rather than escaped.
pub fn write_json<W>(table: &Table<Value>, out: &mut W, pretty: bool) -> ImportResult<()>
where
    W: Write + ?Sized,
{
    let result = if pretty {
        serde_json::to_writer_pretty(&mut *out, table)
    } else {
        serde_json::to_writer(&mut *out, table)
    };
    result.map_err(|err| ImportError::Output(io::Error::from(err)))?;
    writeln!(out).map_err(ImportError::Output)?;
    out.flush().map_err(ImportError::Output)?;
    info!(
        "Previewed {} row(s) across {} column(s)",
        table.len(),
        table.headers().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Table<Value> {
        let mut table = Table::new(vec![
            "player_id".to_string(),
            "ch_name".to_string(),
            "jersey_number".to_string(),
        ]);
        table.push_row(
            2,
            vec![
                Value::Text("P001".to_string()),
                Value::Text("王小明".to_string()),
                Value::Null,
            ],
        );
        table
    }

    #[test]
    fn write_json_keeps_non_ascii_literal() {
        let mut out = Vec::new();
        write_json(&roster(), &mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "[{\"player_id\":\"P001\",\"ch_name\":\"王小明\",\"jersey_number\":null}]\n"
        );
    }

    #[test]
    fn write_json_pretty_is_still_valid_json() {
        let mut out = Vec::new();
        write_json(&roster(), &mut out, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["ch_name"], "王小明");
        assert!(parsed[0]["jersey_number"].is_null());
    }

    #[test]
    fn empty_tables_preview_as_empty_array() {
        let table: Table<Value> = Table::new(vec!["a".to_string()]);
        let mut out = Vec::new();
        write_json(&table, &mut out, false).unwrap();
        assert_eq!(out, b"[]\n");
    }
}
