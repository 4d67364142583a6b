//! File readers for CSV, Excel and JSON uploads

use crate::error::{Error, Result};
use crate::table::{Table, Value};
use calamine::{Data, Reader, Xls, Xlsx};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Delimiters considered when sniffing a CSV sample
const DELIMITER_CANDIDATES: &[u8] = &[b',', b';', b'\t', b'|'];

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
    Json,
}

impl FileFormat {
    /// Detect the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            "xls" => Some(FileFormat::Xls),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }

    /// Detect the format from a path, failing on unrecognized extensions
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| Error::UnsupportedFormat {
            file_id: path.display().to_string(),
            format: ext.to_string(),
        })
    }
}

/// Parse options for file reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadOptions {
    /// CSV field delimiter; sniffed from content when absent
    pub delimiter: Option<u8>,
    /// CSV encoding label (e.g. "utf-8", "windows-1252"); BOM-sniffed when absent
    pub encoding: Option<String>,
    /// Whether the first row is a header row
    pub has_header: bool,
    /// Maximum accepted input size in bytes, if limited
    pub max_size_bytes: Option<usize>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: None,
            has_header: true,
            max_size_bytes: None,
        }
    }
}

/// Parse raw bytes into a Table according to the declared format
pub fn read_bytes(
    file_id: &str,
    bytes: &[u8],
    format: FileFormat,
    options: &ReadOptions,
) -> Result<Table> {
    if let Some(limit) = options.max_size_bytes {
        if bytes.len() > limit {
            return Err(Error::SizeLimit {
                file_id: file_id.to_string(),
                size: bytes.len(),
                limit,
            });
        }
    }

    let table = match format {
        FileFormat::Csv => read_csv(file_id, bytes, options)?,
        FileFormat::Xlsx | FileFormat::Xls => read_excel(file_id, bytes, format)?,
        FileFormat::Json => read_json(file_id, bytes)?,
    };

    if table.column_count() == 0 {
        return Err(Error::Parse {
            file_id: file_id.to_string(),
            message: "no columns found".to_string(),
        });
    }

    log::info!(
        "loaded '{}': {} rows, {} columns",
        file_id,
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Read a file from disk, detecting the format from its extension
///
/// Returns the file identifier (the file name) along with the table.
pub fn read_path(path: &Path, options: &ReadOptions) -> Result<(String, Table)> {
    let format = FileFormat::from_path(path)?;
    let file_id = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let bytes = std::fs::read(path)?;
    let table = read_bytes(&file_id, &bytes, format, options)?;
    Ok((file_id, table))
}

/// Walk directories collecting every file with a supported extension, sorted
pub fn discover_files<P: AsRef<Path>>(roots: &[P]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root.as_ref())
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(FileFormat::from_extension)
                .is_some();
            if supported {
                found.push(path.to_path_buf());
            }
        }
    }
    found.sort();
    found
}

fn read_csv(file_id: &str, bytes: &[u8], options: &ReadOptions) -> Result<Table> {
    let text = decode_text(file_id, bytes, options.encoding.as_deref())?;

    let delimiter = options
        .delimiter
        .unwrap_or_else(|| sniff_delimiter(&text));

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(delimiter)
        .flexible(true) // Allow varying number of fields
        .from_reader(text.as_bytes());

    let column_names: Vec<String> = if options.has_header {
        let headers = csv_reader.headers().map_err(|e| Error::Csv {
            file_id: file_id.to_string(),
            source: e,
        })?;
        headers.iter().map(|h| h.trim().to_string()).collect()
    } else {
        // Headerless files get positional names from the first record width
        let width = csv_reader
            .records()
            .next()
            .transpose()
            .map_err(|e| Error::Csv {
                file_id: file_id.to_string(),
                source: e,
            })?
            .map(|r| r.len())
            .unwrap_or(0);
        // Rebuild the reader so the probed record is not consumed
        csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());
        (1..=width).map(|i| format!("column_{}", i)).collect()
    };

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| Error::Csv {
            file_id: file_id.to_string(),
            source: e,
        })?;
        rows.push(record.iter().map(Value::parse).collect());
    }

    Ok(Table::from_rows(column_names, rows))
}

fn read_excel(file_id: &str, bytes: &[u8], format: FileFormat) -> Result<Table> {
    let parse_err = |message: String| Error::Parse {
        file_id: file_id.to_string(),
        message,
    };
    let cursor = Cursor::new(bytes.to_vec());

    // Only the first worksheet is read
    let range = match format {
        FileFormat::Xlsx => {
            let mut workbook: Xlsx<_> = Xlsx::new(cursor)
                .map_err(|e| parse_err(format!("failed to open workbook: {}", e)))?;
            workbook
                .worksheet_range_at(0)
                .ok_or_else(|| parse_err("no worksheet found".to_string()))?
                .map_err(|e| parse_err(format!("failed to read worksheet: {}", e)))?
        }
        FileFormat::Xls => {
            let mut workbook: Xls<_> = Xls::new(cursor)
                .map_err(|e| parse_err(format!("failed to open workbook: {}", e)))?;
            workbook
                .worksheet_range_at(0)
                .ok_or_else(|| parse_err("no worksheet found".to_string()))?
                .map_err(|e| parse_err(format!("failed to read worksheet: {}", e)))?
        }
        _ => unreachable!("read_excel called with non-excel format"),
    };

    let mut row_iter = range.rows();
    let column_names: Vec<String> = match row_iter.next() {
        Some(header) => header.iter().map(excel_cell_text).collect(),
        None => Vec::new(),
    };

    let rows: Vec<Vec<Value>> = row_iter
        .map(|row| row.iter().map(excel_cell_value).collect())
        .collect();

    Ok(Table::from_rows(column_names, rows))
}

fn excel_cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn excel_cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Value::Int(*f as i64)
            } else {
                Value::Float(*f)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Value::DateTime(ndt),
            None => Value::Missing,
        },
        Data::String(s) => Value::parse(s),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::parse(s),
        Data::Error(_) | Data::Empty => Value::Missing,
    }
}

fn read_json(file_id: &str, bytes: &[u8]) -> Result<Table> {
    let parsed: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| Error::Parse {
            file_id: file_id.to_string(),
            message: format!("invalid JSON: {}", e),
        })?;

    let records: Vec<serde_json::Map<String, serde_json::Value>> = match parsed {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Object(obj) => Ok(obj),
                other => Err(Error::Parse {
                    file_id: file_id.to_string(),
                    message: format!("expected an array of objects, found {}", json_kind(&other)),
                }),
            })
            .collect::<Result<_>>()?,
        serde_json::Value::Object(obj) => {
            // A wrapping object: use its first array-of-objects member,
            // otherwise treat the flat object as a single row
            let nested = obj.values().find_map(|v| match v {
                serde_json::Value::Array(items)
                    if items.iter().all(|i| i.is_object()) && !items.is_empty() =>
                {
                    Some(items.clone())
                }
                _ => None,
            });
            match nested {
                Some(items) => items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::Object(o) => Ok(o),
                        _ => unreachable!("filtered to objects above"),
                    })
                    .collect::<Result<_>>()?,
                None => vec![obj],
            }
        }
        other => {
            return Err(Error::Parse {
                file_id: file_id.to_string(),
                message: format!("unsupported JSON structure: {}", json_kind(&other)),
            })
        }
    };

    // Column order: first seen across records
    let mut column_names: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !column_names.iter().any(|c| c == key) {
                column_names.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<Value>> = records
        .iter()
        .map(|record| {
            column_names
                .iter()
                .map(|name| record.get(name).map(json_value).unwrap_or(Value::Missing))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(column_names, rows))
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn json_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Missing,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::parse(s),
        // Nested structures are kept as their JSON text
        other => Value::Text(other.to_string()),
    }
}

/// Decode CSV bytes with an optional encoding label
fn decode_text(file_id: &str, bytes: &[u8], label: Option<&str>) -> Result<String> {
    if let Some(label) = label {
        let encoding =
            encoding_rs::Encoding::for_label(label.as_bytes()).ok_or_else(|| Error::Parse {
                file_id: file_id.to_string(),
                message: format!("unknown encoding label '{}'", label),
            })?;
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            log::warn!("'{}': replacement characters while decoding as {}", file_id, label);
        }
        return Ok(text.into_owned());
    }

    // No label: honor a BOM, try UTF-8, fall back to windows-1252
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, _, _) = encoding.decode(&bytes[bom_len..]);
        return Ok(text.into_owned());
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            log::warn!("'{}': not valid UTF-8, decoded as windows-1252", file_id);
            Ok(text.into_owned())
        }
    }
}

/// Pick the most frequent candidate delimiter in the first line
fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    DELIMITER_CANDIDATES
        .iter()
        .copied()
        .map(|d| (d, first_line.matches(d as char).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_csv_str(content: &str) -> Table {
        read_bytes("test.csv", content.as_bytes(), FileFormat::Csv, &ReadOptions::default())
            .unwrap()
    }

    #[test]
    fn test_read_simple_csv() {
        let table = read_csv_str("id,name,value\n1,foo,100\n2,bar,200\n");

        assert_eq!(table.column_names(), vec!["id", "name", "value"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][0], Value::Int(1));
        assert_eq!(table.rows[1][1], Value::Text("bar".to_string()));
    }

    #[test]
    fn test_read_csv_empty_cells() {
        let table = read_csv_str("id,name,value\n1,,100\n2,bar,\n");

        assert_eq!(table.rows[0][1], Value::Missing);
        assert_eq!(table.rows[1][2], Value::Missing);
    }

    #[test]
    fn test_read_csv_semicolon_sniffed() {
        let table = read_csv_str("id;name\n1;foo\n2;bar\n");

        assert_eq!(table.column_names(), vec!["id", "name"]);
        assert_eq!(table.rows[0][1], Value::Text("foo".to_string()));
    }

    #[test]
    fn test_read_csv_explicit_delimiter() {
        let options = ReadOptions {
            delimiter: Some(b'|'),
            ..ReadOptions::default()
        };
        let table =
            read_bytes("t.csv", b"a|b\n1|2\n", FileFormat::Csv, &options).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_read_csv_without_header() {
        let options = ReadOptions {
            has_header: false,
            ..ReadOptions::default()
        };
        let table =
            read_bytes("t.csv", b"1,foo\n2,bar\n", FileFormat::Csv, &options).unwrap();
        assert_eq!(table.column_names(), vec!["column_1", "column_2"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_read_csv_windows_1252_fallback() {
        // "café" in windows-1252: the é byte is 0xE9
        let bytes = b"name\ncaf\xE9\n";
        let table =
            read_bytes("t.csv", bytes, FileFormat::Csv, &ReadOptions::default()).unwrap();
        assert_eq!(table.rows[0][0], Value::Text("café".to_string()));
    }

    #[test]
    fn test_size_limit_checked_before_parse() {
        let options = ReadOptions {
            max_size_bytes: Some(4),
            ..ReadOptions::default()
        };
        let err = read_bytes("big.csv", b"a,b\n1,2\n", FileFormat::Csv, &options)
            .unwrap_err();
        assert!(matches!(err, Error::SizeLimit { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FileFormat::from_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_read_json_array_of_objects() {
        let json = r#"[{"id": 1, "name": "foo"}, {"id": 2, "name": "bar", "extra": true}]"#;
        let table =
            read_bytes("t.json", json.as_bytes(), FileFormat::Json, &ReadOptions::default())
                .unwrap();

        assert_eq!(table.column_names(), vec!["id", "name", "extra"]);
        assert_eq!(table.rows[0][2], Value::Missing);
        assert_eq!(table.rows[1][2], Value::Bool(true));
    }

    #[test]
    fn test_read_json_wrapped_array() {
        let json = r#"{"meta": "x", "records": [{"id": 1}, {"id": 2}]}"#;
        let table =
            read_bytes("t.json", json.as_bytes(), FileFormat::Json, &ReadOptions::default())
                .unwrap();
        assert_eq!(table.column_names(), vec!["id"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_read_json_flat_object_single_row() {
        let json = r#"{"id": 1, "name": "solo"}"#;
        let table =
            read_bytes("t.json", json.as_bytes(), FileFormat::Json, &ReadOptions::default())
                .unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0][1], Value::Text("solo".to_string()));
    }

    #[test]
    fn test_read_json_scalar_rejected() {
        let err = read_bytes("t.json", b"42", FileFormat::Json, &ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
