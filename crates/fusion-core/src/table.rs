//! Core table types for tabular data loaded from files

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Datetime formats accepted by [`Value::parse`], tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats, promoted to midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Datetime value (no timezone)
    DateTime(NaiveDateTime),
    /// Text value
    Text(String),
    /// Missing-value marker
    Missing,
}

impl Value {
    /// Parse a string into a Value, detecting the type
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Value::Missing;
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }

        if let Some(dt) = parse_datetime(trimmed) {
            return Value::DateTime(dt);
        }

        Value::Text(trimmed.to_string())
    }

    /// Check if the value is the missing marker
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the value, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The data type this value belongs to, None for Missing
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int(_) | Value::Float(_) => Some(DataType::Number),
            Value::Bool(_) => Some(DataType::Bool),
            Value::DateTime(_) => Some(DataType::DateTime),
            Value::Text(_) => Some(DataType::Text),
            Value::Missing => None,
        }
    }

    /// Convert to a display string; Missing renders empty
    pub fn render(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Parse a datetime from the accepted format list
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Column data types, as inferred from cell values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Number,
    Text,
    Bool,
    DateTime,
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// A table of named columns over row-major cell data
///
/// Invariant: every row holds exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions, in display order
    pub columns: Vec<Column>,
    /// Row data, one cell per column
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new(column_names: &[&str]) -> Self {
        let columns = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(*name, i))
            .collect();
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from column names and rows, padding or truncating
    /// each row to the column count
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = column_names.len();
        let columns = column_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new(name, i))
            .collect();
        let rows = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, Value::Missing);
                cells
            })
            .collect();
        Self { columns, rows }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All values of one column, in row order
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |r| &r[index])
    }

    /// Append a row, padding or truncating to the column count
    pub fn push_row(&mut self, mut cells: Vec<Value>) {
        cells.resize(self.columns.len(), Value::Missing);
        self.rows.push(cells);
    }

    /// Rename columns in place according to (from, to) pairs
    pub fn rename_columns(&mut self, renames: &[(String, String)]) {
        for col in &mut self.columns {
            if let Some((_, to)) = renames.iter().find(|(from, _)| *from == col.name) {
                col.name = to.clone();
            }
        }
    }

    /// Infer the data type of a column as the dominant non-missing value type
    ///
    /// Returns None when every cell is missing.
    pub fn infer_column_type(&self, index: usize) -> Option<DataType> {
        let mut counts: Vec<(DataType, usize)> = Vec::new();
        for value in self.column_values(index) {
            if let Some(dt) = value.data_type() {
                match counts.iter_mut().find(|(t, _)| *t == dt) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((dt, 1)),
                }
            }
        }
        counts.into_iter().max_by_key(|(_, n)| *n).map(|(t, _)| t)
    }
}

/// A file loaded into the session, keyed by its upload identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedFile {
    /// File identifier (upload name)
    pub id: String,
    /// Parsed table
    pub table: Table,
}

/// Ordered set of loaded files, insertion order preserved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadedFileSet {
    files: Vec<LoadedFile>,
}

impl LoadedFileSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table under an id; an existing id is replaced in place
    pub fn insert(&mut self, id: impl Into<String>, table: Table) {
        let id = id.into();
        match self.files.iter_mut().find(|f| f.id == id) {
            Some(existing) => existing.table = table,
            None => self.files.push(LoadedFile { id, table }),
        }
    }

    /// Remove a file by id, returning whether it was present
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.id != id);
        self.files.len() != before
    }

    /// Look up a table by file id
    pub fn get(&self, id: &str) -> Option<&Table> {
        self.files.iter().find(|f| f.id == id).map(|f| &f.table)
    }

    /// Iterate files in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &LoadedFile> {
        self.files.iter()
    }

    /// Mutable iteration in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LoadedFile> {
        self.files.iter_mut()
    }

    /// Number of loaded files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Clear all files
    pub fn clear(&mut self) {
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parse_integer() {
        assert_eq!(Value::parse("42"), Value::Int(42));
        assert_eq!(Value::parse("-123"), Value::Int(-123));
        assert_eq!(Value::parse("0"), Value::Int(0));
    }

    #[test]
    fn test_value_parse_float() {
        assert_eq!(Value::parse("3.14"), Value::Float(3.14));
        assert_eq!(Value::parse("-2.5"), Value::Float(-2.5));
    }

    #[test]
    fn test_value_parse_bool() {
        assert_eq!(Value::parse("true"), Value::Bool(true));
        assert_eq!(Value::parse("FALSE"), Value::Bool(false));
    }

    #[test]
    fn test_value_parse_datetime() {
        let v = Value::parse("2024-03-01 12:30:00");
        match v {
            Value::DateTime(dt) => {
                assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-01 12:30:00")
            }
            other => panic!("expected datetime, got {:?}", other),
        }
        // Date-only promotes to midnight
        let v = Value::parse("2024-03-01");
        assert!(matches!(v, Value::DateTime(_)));
    }

    #[test]
    fn test_value_parse_text_and_missing() {
        assert_eq!(Value::parse("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("   "), Value::Missing);
    }

    #[test]
    fn test_value_render_round_trip() {
        for s in ["42", "-2.5", "true", "hello", "2024-03-01 12:30:00"] {
            let v = Value::parse(s);
            assert_eq!(Value::parse(&v.render()), v, "round trip for {}", s);
        }
        assert_eq!(Value::Missing.render(), "");
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let t = Table::from_rows(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![Value::Int(1)], vec![Value::Int(2), Value::Int(3)]],
        );
        assert_eq!(t.rows[0], vec![Value::Int(1), Value::Missing, Value::Missing]);
        assert_eq!(t.rows[1].len(), 3);
    }

    #[test]
    fn test_infer_column_type() {
        let t = Table::from_rows(
            vec!["x".into()],
            vec![
                vec![Value::Int(1)],
                vec![Value::Missing],
                vec![Value::Float(2.5)],
                vec![Value::Text("n/a".into())],
            ],
        );
        assert_eq!(t.infer_column_type(0), Some(DataType::Number));
    }

    #[test]
    fn test_loaded_file_set_order_and_replace() {
        let mut set = LoadedFileSet::new();
        set.insert("a.csv", Table::new(&["x"]));
        set.insert("b.csv", Table::new(&["y"]));
        set.insert("a.csv", Table::new(&["z"]));

        let ids: Vec<&str> = set.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a.csv", "b.csv"]);
        assert_eq!(set.get("a.csv").unwrap().columns[0].name, "z");
    }
}
