//! Table serialization to CSV, Excel and JSON

use crate::error::{Error, Result};
use crate::table::{Table, Value};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    /// Detect the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    /// The conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
            .ok_or_else(|| Error::Export(format!("unknown export format '{}'", s)))
    }
}

/// Serialize a table to bytes in the requested format
pub fn export(table: &Table, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(table),
        ExportFormat::Xlsx => to_xlsx(table),
        ExportFormat::Json => to_json(table),
    }
}

/// Serialize a table to a file, detecting the format from the extension
pub fn export_to_path(table: &Table, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let format = ExportFormat::from_extension(ext)
        .ok_or_else(|| Error::Export(format!("unknown export format '{}'", ext)))?;

    let bytes = export(table, format)?;
    std::fs::write(path, bytes).map_err(|e| Error::Export(e.to_string()))?;
    log::info!(
        "exported {} rows to {}",
        table.row_count(),
        path.display()
    );
    Ok(())
}

/// CSV bytes; the missing marker becomes an empty field
fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(table.column_names())
        .map_err(|e| Error::Export(e.to_string()))?;

    for row in &table.rows {
        let fields: Vec<String> = row.iter().map(Value::render).collect();
        writer
            .write_record(&fields)
            .map_err(|e| Error::Export(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Export(e.to_string()))
}

/// Row-oriented JSON array of objects; the missing marker becomes null
fn to_json(table: &Table) -> Result<Vec<u8>> {
    let rows: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = table
                .columns
                .iter()
                .zip(row)
                .map(|(col, cell)| (col.name.clone(), cell_to_json(cell)))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();

    serde_json::to_vec_pretty(&rows).map_err(|e| Error::Export(e.to_string()))
}

fn cell_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Bool(b) => serde_json::Value::from(*b),
        Value::DateTime(_) | Value::Text(_) => serde_json::Value::from(value.render()),
        Value::Missing => serde_json::Value::Null,
    }
}

/// A single-sheet workbook with a bold header row and typed cells
fn to_xlsx(table: &Table) -> Result<Vec<u8>> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| Error::Export(e.to_string());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Data").map_err(xlsx_err)?;

    let header_format = Format::new().set_bold();
    for (col, name) in table.column_names().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *name, &header_format)
            .map_err(xlsx_err)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Value::Int(i) => {
                    worksheet.write_number(r, c, *i as f64).map_err(xlsx_err)?;
                }
                Value::Float(f) => {
                    worksheet.write_number(r, c, *f).map_err(xlsx_err)?;
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(r, c, *b).map_err(xlsx_err)?;
                }
                Value::DateTime(_) | Value::Text(_) => {
                    worksheet
                        .write_string(r, c, cell.render())
                        .map_err(xlsx_err)?;
                }
                Value::Missing => {}
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}
