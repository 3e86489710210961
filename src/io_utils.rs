//! Reader construction and encoding resolution for delimited input.
//!
//! - **Encoding**: labels resolve through `encoding_rs`, defaulting to UTF-8.
//!   A byte-order mark always wins over the configured label and is stripped
//!   before the CSV parser sees the first header.
//! - **Reader construction**: [`open_delimited_reader`] decodes the whole file
//!   up front, so the CSV parser only ever sees UTF-8. Bytes that are not
//!   valid in the source encoding fail the read instead of being replaced.

use std::{
    fs,
    io::{self, Cursor, Read},
    path::Path,
};

use anyhow::{Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

use crate::error::{ImportError, ImportResult};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Opens `path` for CSV parsing, transcoding from `encoding` to UTF-8.
pub fn open_delimited_reader(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> ImportResult<csv::Reader<Box<dyn Read>>> {
    let read_error = |source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    };
    let bytes = fs::read(path).map_err(read_error)?;
    let text = decode_strict(&bytes, encoding).map_err(read_error)?;
    let reader: Box<dyn Read> = Box::new(Cursor::new(text.into_bytes()));
    Ok(open_csv_reader(reader, delimiter))
}

/// Decodes `bytes`, letting a byte-order mark override `encoding`. Malformed
/// sequences are an `InvalidData` error.
pub fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> io::Result<String> {
    let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((encoding, 0));
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("input is not valid {}", encoding.name()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn resolve_encoding_defaults_to_utf8() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some(" latin1 ")).unwrap(), WINDOWS_1252);
        assert!(resolve_encoding(Some("klingon")).is_err());
    }

    #[test]
    fn open_csv_reader_tolerates_ragged_rows() {
        let data = "a,b,c\n1,2\n";
        let mut reader = open_csv_reader(data.as_bytes(), b',');
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn decode_strict_strips_bom_and_honours_it() {
        let utf8 = b"\xEF\xBB\xBFid\n";
        assert_eq!(decode_strict(utf8, WINDOWS_1252).unwrap(), "id\n");

        let utf16 = [0xFF, 0xFE, b'i', 0, b'd', 0];
        assert_eq!(decode_strict(&utf16, UTF_8).unwrap(), "id");
    }

    #[test]
    fn decode_strict_rejects_invalid_utf8() {
        let err = decode_strict(b"P001,\xFF\xFE\xE7\x8E\n", UTF_8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn open_delimited_reader_reports_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, b"id,name\nP001,\xFF\xFE\n").unwrap();

        let err = open_delimited_reader(&path, b',', UTF_8).err().unwrap();
        assert!(matches!(err, ImportError::Read { ref source, .. }
            if source.kind() == io::ErrorKind::InvalidData));
    }
}
