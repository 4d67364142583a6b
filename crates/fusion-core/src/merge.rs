//! Merge engine for combining loaded tables
//!
//! Supports three methods: append (stack rows over the reconciled column
//! union), join (relational join on a key column) and smart merge (join
//! when the schemas overlap enough, append otherwise). Post-merge cleanup
//! covers duplicate-row removal and per-type missing-value filling.

use crate::error::{Error, Result};
use crate::schema::{self, MatchOptions, SchemaMap, DEFAULT_FUZZY_THRESHOLD};
use crate::table::{DataType, LoadedFileSet, Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Default column-overlap ratio a smart merge needs before joining
pub const DEFAULT_SMART_THRESHOLD: f64 = 0.5;

/// How tables are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Stack rows vertically over the union of columns
    Append,
    /// Relational join on a key column
    Join,
    /// Join when schemas overlap enough, otherwise append
    Smart,
}

/// Which rows a join keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// All keys from both sides
    Outer,
    /// Only keys present in every table
    Inner,
    /// All rows of the first-loaded table
    Left,
}

/// Missing-value fill for numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericFill {
    Mean,
    Median,
    Mode,
    Zero,
    Custom(f64),
}

/// Missing-value fill for text and boolean columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFill {
    Mode,
    Empty,
    Custom(String),
}

/// Missing-value fill for datetime columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateTimeFill {
    Forward,
    Backward,
}

/// Per-type fill strategy applied after merging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillSpec {
    pub numeric: NumericFill,
    pub text: TextFill,
    pub datetime: DateTimeFill,
}

impl Default for FillSpec {
    fn default() -> Self {
        Self {
            numeric: NumericFill::Mean,
            text: TextFill::Empty,
            datetime: DateTimeFill::Forward,
        }
    }
}

/// Full description of one merge operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSpec {
    pub method: MergeMethod,
    /// Key column for join merges
    pub key: Option<String>,
    pub join: JoinType,
    /// Case-insensitive column matching
    pub ignore_case: bool,
    /// Fuzzy-match similarly named columns
    pub fuzzy_columns: bool,
    pub fuzzy_threshold: f64,
    /// Column-overlap ratio required before a smart merge joins
    pub smart_threshold: f64,
    /// Remove exactly-duplicated rows after merging
    pub dedup_rows: bool,
    /// Missing-value fill applied after merging
    pub fill: Option<FillSpec>,
}

impl Default for MergeSpec {
    fn default() -> Self {
        Self {
            method: MergeMethod::Append,
            key: None,
            join: JoinType::Outer,
            ignore_case: true,
            fuzzy_columns: false,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            smart_threshold: DEFAULT_SMART_THRESHOLD,
            dedup_rows: false,
            fill: None,
        }
    }
}

impl MergeSpec {
    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            ignore_case: self.ignore_case,
            fuzzy: self.fuzzy_columns,
            fuzzy_threshold: self.fuzzy_threshold,
        }
    }
}

/// Merge all loaded tables into one according to the spec
pub fn merge(files: &LoadedFileSet, spec: &MergeSpec) -> Result<Table> {
    if files.is_empty() {
        return Err(Error::InvalidSpec("no files loaded to merge".to_string()));
    }

    let options = spec.match_options();
    let map = schema::reconcile(files, &options);

    // Align every table to canonical column names before combining
    let aligned: Vec<(String, Table)> = files
        .iter()
        .map(|file| {
            let mut table = file.table.clone();
            table.rename_columns(&map.rename_plan(&file.id));
            (file.id.clone(), table)
        })
        .collect();

    let mut merged = match spec.method {
        MergeMethod::Append => append_tables(&aligned, &map),
        MergeMethod::Join => {
            let key = spec
                .key
                .as_deref()
                .ok_or_else(|| Error::InvalidSpec("join merge requires a key column".to_string()))?;
            let canonical = resolve_join_key(&map, &options, key, &aligned)?;
            join_tables(&aligned, &canonical, spec.join)
        }
        MergeMethod::Smart => smart_merge(&aligned, &map, spec),
    };

    if spec.dedup_rows {
        merged = dedup_rows(&merged);
    }
    if let Some(fill) = &spec.fill {
        merged = fill_missing(&merged, fill);
    }

    log::info!(
        "merged {} files: {} rows, {} columns",
        aligned.len(),
        merged.row_count(),
        merged.column_count()
    );
    Ok(merged)
}

/// Resolve the user's key column and require it in every table
fn resolve_join_key(
    map: &SchemaMap,
    options: &MatchOptions,
    key: &str,
    aligned: &[(String, Table)],
) -> Result<String> {
    let entry = map
        .resolve(key, options)
        .ok_or_else(|| Error::MissingKeyColumn {
            column: key.to_string(),
            file_id: aligned
                .first()
                .map(|(id, _)| id.clone())
                .unwrap_or_default(),
        })?;

    for (id, _) in aligned {
        if !entry.has_file(id) {
            return Err(Error::MissingKeyColumn {
                column: entry.canonical.clone(),
                file_id: id.clone(),
            });
        }
    }
    Ok(entry.canonical.clone())
}

/// Stack rows of all tables over the reconciled column union
fn append_tables(aligned: &[(String, Table)], map: &SchemaMap) -> Table {
    let column_names: Vec<String> = map
        .canonical_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut result = Table::from_rows(column_names.clone(), Vec::new());

    for (_, table) in aligned {
        let indices: Vec<Option<usize>> = column_names
            .iter()
            .map(|name| table.column_index(name))
            .collect();

        for row in &table.rows {
            let cells = indices
                .iter()
                .map(|idx| idx.map(|i| row[i].clone()).unwrap_or(Value::Missing))
                .collect();
            result.push_row(cells);
        }
    }

    result
}

/// Short label for a file id, used to suffix colliding columns
fn file_label(file_id: &str) -> String {
    Path::new(file_id)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_id)
        .to_string()
}

/// Join all tables pairwise from the first-loaded one
fn join_tables(aligned: &[(String, Table)], key: &str, how: JoinType) -> Table {
    // Disambiguate non-key columns shared by two or more tables: every
    // occurrence gets a `_<file>` suffix, so `val` from A and B become
    // `val_A` and `val_B`.
    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for (_, table) in aligned {
        for col in &table.columns {
            if col.name != key {
                *name_counts.entry(col.name.as_str()).or_insert(0) += 1;
            }
        }
    }
    let shared: HashSet<String> = name_counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name.to_string())
        .collect();

    let mut tables: Vec<Table> = aligned
        .iter()
        .map(|(id, table)| {
            let renames: Vec<(String, String)> = table
                .columns
                .iter()
                .filter(|c| shared.contains(&c.name))
                .map(|c| (c.name.clone(), format!("{}_{}", c.name, file_label(id))))
                .collect();
            let mut table = table.clone();
            table.rename_columns(&renames);
            table
        })
        .collect();

    let mut result = tables.remove(0);
    for right in tables {
        result = join_pair(&result, &right, key, how);
    }
    result
}

/// Join two tables on a shared key column
fn join_pair(left: &Table, right: &Table, key: &str, how: JoinType) -> Table {
    let left_key = left.column_index(key).expect("key resolved against all tables");
    let right_key = right.column_index(key).expect("key resolved against all tables");

    // Output columns: all of left, then right minus its key column
    let mut column_names: Vec<String> = left.columns.iter().map(|c| c.name.clone()).collect();
    let right_cols: Vec<usize> = (0..right.column_count())
        .filter(|&i| i != right_key)
        .collect();
    for &i in &right_cols {
        column_names.push(right.columns[i].name.clone());
    }

    // Rows of the right side grouped by rendered key; Missing never matches
    let mut right_map: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, row) in right.rows.iter().enumerate() {
        if !row[right_key].is_missing() {
            right_map
                .entry(row[right_key].render())
                .or_default()
                .push(idx);
        }
    }

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut matched_right: HashSet<usize> = HashSet::new();

    for row in &left.rows {
        let key_cell = &row[left_key];
        let matches = if key_cell.is_missing() {
            None
        } else {
            right_map.get(&key_cell.render())
        };

        match matches {
            Some(indices) => {
                for &ri in indices {
                    matched_right.insert(ri);
                    let mut cells = row.clone();
                    cells.extend(right_cols.iter().map(|&ci| right.rows[ri][ci].clone()));
                    rows.push(cells);
                }
            }
            None => {
                if matches!(how, JoinType::Outer | JoinType::Left) {
                    let mut cells = row.clone();
                    cells.extend(right_cols.iter().map(|_| Value::Missing));
                    rows.push(cells);
                }
            }
        }
    }

    // Outer join keeps right-side keys the left never produced
    if how == JoinType::Outer {
        for (ri, row) in right.rows.iter().enumerate() {
            if matched_right.contains(&ri) || row[right_key].is_missing() {
                continue;
            }
            let mut cells: Vec<Value> = vec![Value::Missing; left.column_count()];
            cells[left_key] = row[right_key].clone();
            cells.extend(right_cols.iter().map(|&ci| row[ci].clone()));
            rows.push(cells);
        }
    }

    Table::from_rows(column_names, rows)
}

/// Join on the best common key when schemas overlap enough, else append
fn smart_merge(aligned: &[(String, Table)], map: &SchemaMap, spec: &MergeSpec) -> Table {
    if aligned.len() < 2 {
        return append_tables(aligned, map);
    }

    let common = map.common_entries(aligned.len());
    let total = map.canonical_names().len();
    let overlap = if total == 0 {
        0.0
    } else {
        common.len() as f64 / total as f64
    };

    if overlap <= spec.smart_threshold {
        log::info!(
            "smart merge: column overlap {:.2} below threshold {:.2}, appending",
            overlap,
            spec.smart_threshold
        );
        return append_tables(aligned, map);
    }

    match pick_key_column(&common, aligned) {
        Some(key) => {
            log::info!("smart merge: joining on '{}'", key);
            join_tables(aligned, &key, JoinType::Outer)
        }
        None => {
            log::info!("smart merge: no usable key column, appending");
            append_tables(aligned, map)
        }
    }
}

/// Pick the common column best suited as a join key
///
/// A candidate must be unique and non-missing within every table; among
/// candidates the highest cross-table value overlap wins, ties keep the
/// first-seen column.
fn pick_key_column(
    common: &[&schema::SchemaEntry],
    aligned: &[(String, Table)],
) -> Option<String> {
    let mut best: Option<(String, f64)> = None;

    for entry in common {
        let name = &entry.canonical;
        let mut per_table: Vec<HashSet<String>> = Vec::new();
        let mut usable = true;

        for (_, table) in aligned {
            let Some(idx) = table.column_index(name) else {
                usable = false;
                break;
            };
            let mut seen = HashSet::new();
            for value in table.column_values(idx) {
                if value.is_missing() || !seen.insert(value.render()) {
                    usable = false;
                    break;
                }
            }
            if !usable {
                break;
            }
            per_table.push(seen);
        }

        if !usable || per_table.is_empty() {
            continue;
        }

        let mut intersection = per_table[0].clone();
        let mut union = per_table[0].clone();
        for set in &per_table[1..] {
            intersection.retain(|v| set.contains(v));
            union.extend(set.iter().cloned());
        }
        let score = if union.is_empty() {
            0.0
        } else {
            intersection.len() as f64 / union.len() as f64
        };

        match &best {
            Some((_, best_score)) if score <= *best_score => {}
            _ => best = Some((name.clone(), score)),
        }
    }

    best.map(|(name, _)| name)
}

/// Remove exactly-duplicated rows, keeping first occurrences
pub fn dedup_rows(table: &Table) -> Table {
    let mut seen: HashSet<String> = HashSet::new();
    let rows = table
        .rows
        .iter()
        .filter(|row| {
            let fingerprint = row
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join("\u{1f}");
            seen.insert(fingerprint)
        })
        .cloned()
        .collect();

    Table {
        columns: table.columns.clone(),
        rows,
    }
}

/// Fill missing values per column, by inferred column type
pub fn fill_missing(table: &Table, fill: &FillSpec) -> Table {
    let mut result = table.clone();

    for idx in 0..result.column_count() {
        let Some(data_type) = result.infer_column_type(idx) else {
            continue; // all-missing columns stay untouched
        };

        match data_type {
            DataType::Number => fill_numeric(&mut result, idx, &fill.numeric),
            DataType::Text | DataType::Bool => fill_text(&mut result, idx, &fill.text),
            DataType::DateTime => fill_datetime(&mut result, idx, fill.datetime),
        }
    }

    result
}

fn fill_numeric(table: &mut Table, idx: usize, method: &NumericFill) {
    let numbers: Vec<f64> = table
        .column_values(idx)
        .filter_map(Value::as_number)
        .collect();

    let replacement = match method {
        NumericFill::Zero => Value::Int(0),
        NumericFill::Custom(v) => Value::Float(*v),
        NumericFill::Mean => {
            if numbers.is_empty() {
                return;
            }
            Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
        }
        NumericFill::Median => {
            if numbers.is_empty() {
                return;
            }
            let mut sorted = numbers.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mid = sorted.len() / 2;
            let median = if sorted.len() % 2 == 0 {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            } else {
                sorted[mid]
            };
            Value::Float(median)
        }
        NumericFill::Mode => match mode_value(table, idx) {
            Some(v) => v,
            None => return,
        },
    };

    replace_missing(table, idx, replacement);
}

fn fill_text(table: &mut Table, idx: usize, method: &TextFill) {
    let replacement = match method {
        TextFill::Empty => Value::Text(String::new()),
        TextFill::Custom(s) => Value::parse(s),
        TextFill::Mode => match mode_value(table, idx) {
            Some(v) => v,
            None => return,
        },
    };
    replace_missing(table, idx, replacement);
}

fn fill_datetime(table: &mut Table, idx: usize, method: DateTimeFill) {
    match method {
        DateTimeFill::Forward => {
            let mut last: Option<Value> = None;
            for row in &mut table.rows {
                if row[idx].is_missing() {
                    if let Some(v) = &last {
                        row[idx] = v.clone();
                    }
                } else {
                    last = Some(row[idx].clone());
                }
            }
        }
        DateTimeFill::Backward => {
            let mut next: Option<Value> = None;
            for row in table.rows.iter_mut().rev() {
                if row[idx].is_missing() {
                    if let Some(v) = &next {
                        row[idx] = v.clone();
                    }
                } else {
                    next = Some(row[idx].clone());
                }
            }
        }
    }
}

/// Most frequent non-missing value of a column; ties keep the first seen
fn mode_value(table: &Table, idx: usize) -> Option<Value> {
    let mut counts: Vec<(Value, usize)> = Vec::new();
    for value in table.column_values(idx) {
        if value.is_missing() {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value.clone(), 1)),
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .map(|(v, _)| v)
}

fn replace_missing(table: &mut Table, idx: usize, replacement: Value) {
    for row in &mut table.rows {
        if row[idx].is_missing() {
            row[idx] = replacement.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{read_bytes, FileFormat, ReadOptions};

    fn csv_table(content: &str) -> Table {
        read_bytes("t.csv", content.as_bytes(), FileFormat::Csv, &ReadOptions::default())
            .unwrap()
    }

    fn file_set(files: &[(&str, &str)]) -> LoadedFileSet {
        let mut set = LoadedFileSet::new();
        for (id, content) in files {
            set.insert(*id, csv_table(content));
        }
        set
    }

    #[test]
    fn test_append_row_count_and_column_union() {
        let files = file_set(&[
            ("a.csv", "id,name\n1,foo\n2,bar\n"),
            ("b.csv", "id,extra\n3,x\n4,y\n5,z\n"),
        ]);
        let merged = merge(&files, &MergeSpec::default()).unwrap();

        assert_eq!(merged.row_count(), 5);
        assert_eq!(merged.column_names(), vec!["id", "name", "extra"]);
        // Cells absent from a source are missing
        assert_eq!(merged.rows[0][2], Value::Missing);
        assert_eq!(merged.rows[2][1], Value::Missing);
    }

    #[test]
    fn test_inner_join_scenario() {
        // A = {id:[1,2], val:[10,20]}, B = {id:[2,3], val:[99,30]}
        let files = file_set(&[
            ("A", "id,val\n1,10\n2,20\n"),
            ("B", "id,val\n2,99\n3,30\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Join,
            key: Some("id".to_string()),
            join: JoinType::Inner,
            ..MergeSpec::default()
        };
        let merged = merge(&files, &spec).unwrap();

        assert_eq!(merged.row_count(), 1);
        assert_eq!(merged.column_names(), vec!["id", "val_A", "val_B"]);
        assert_eq!(merged.rows[0], vec![Value::Int(2), Value::Int(20), Value::Int(99)]);
    }

    #[test]
    fn test_outer_join_keeps_all_keys() {
        let files = file_set(&[
            ("A", "id,val\n1,10\n2,20\n"),
            ("B", "id,val\n2,99\n3,30\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Join,
            key: Some("id".to_string()),
            join: JoinType::Outer,
            ..MergeSpec::default()
        };
        let merged = merge(&files, &spec).unwrap();

        assert_eq!(merged.row_count(), 3);
        // Unmatched sides fill with the missing marker
        assert_eq!(merged.rows[0][2], Value::Missing);
        assert_eq!(merged.rows[2][1], Value::Missing);
        assert_eq!(merged.rows[2][0], Value::Int(3));
    }

    #[test]
    fn test_left_join_anchors_on_first_table() {
        let files = file_set(&[
            ("A", "id,val\n1,10\n2,20\n"),
            ("B", "id,val\n2,99\n3,30\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Join,
            key: Some("id".to_string()),
            join: JoinType::Left,
            ..MergeSpec::default()
        };
        let merged = merge(&files, &spec).unwrap();

        assert_eq!(merged.row_count(), 2);
        let keys: Vec<&Value> = merged.rows.iter().map(|r| &r[0]).collect();
        assert_eq!(keys, vec![&Value::Int(1), &Value::Int(2)]);
    }

    #[test]
    fn test_inner_join_subset_of_outer_with_disjoint_keys() {
        let files = file_set(&[
            ("A", "id,x\n1,10\n2,20\n"),
            ("B", "id,y\n3,30\n4,40\n"),
        ]);
        let outer = merge(
            &files,
            &MergeSpec {
                method: MergeMethod::Join,
                key: Some("id".to_string()),
                join: JoinType::Outer,
                ..MergeSpec::default()
            },
        )
        .unwrap();
        let inner = merge(
            &files,
            &MergeSpec {
                method: MergeMethod::Join,
                key: Some("id".to_string()),
                join: JoinType::Inner,
                ..MergeSpec::default()
            },
        )
        .unwrap();

        assert_eq!(outer.row_count(), 4);
        assert_eq!(inner.row_count(), 0);
        for row in &inner.rows {
            assert!(outer.rows.contains(row));
        }
    }

    #[test]
    fn test_join_missing_key_column() {
        let files = file_set(&[
            ("a.csv", "id,x\n1,10\n"),
            ("b.csv", "other,y\n1,20\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Join,
            key: Some("id".to_string()),
            ..MergeSpec::default()
        };
        let err = merge(&files, &spec).unwrap_err();
        assert!(matches!(err, Error::MissingKeyColumn { file_id, .. } if file_id == "b.csv"));
    }

    #[test]
    fn test_join_key_resolves_case_insensitively() {
        let files = file_set(&[
            ("a.csv", "ID,x\n1,10\n"),
            ("b.csv", "id,y\n1,20\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Join,
            key: Some("Id".to_string()),
            join: JoinType::Inner,
            ..MergeSpec::default()
        };
        let merged = merge(&files, &spec).unwrap();
        assert_eq!(merged.row_count(), 1);
    }

    #[test]
    fn test_missing_keys_never_match() {
        let files = file_set(&[
            ("A", "id,x\n1,10\n,99\n"),
            ("B", "id,y\n,77\n2,20\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Join,
            key: Some("id".to_string()),
            join: JoinType::Inner,
            ..MergeSpec::default()
        };
        let merged = merge(&files, &spec).unwrap();
        assert_eq!(merged.row_count(), 0);
    }

    #[test]
    fn test_smart_merge_joins_on_overlapping_schema() {
        let files = file_set(&[
            ("A", "id,name\n1,foo\n2,bar\n"),
            ("B", "id,name\n2,baz\n3,qux\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Smart,
            ..MergeSpec::default()
        };
        let merged = merge(&files, &spec).unwrap();

        // Full column overlap; `id` is unique per table, `name` too, but
        // `id` overlaps more across tables? Both share one value; the
        // first-seen candidate wins ties, so the join key is `id`.
        assert!(merged.column_index("id").is_some());
        assert_eq!(merged.row_count(), 3);
    }

    #[test]
    fn test_smart_merge_appends_on_low_overlap() {
        let files = file_set(&[
            ("A", "id,name,x,y\n1,foo,1,2\n"),
            ("B", "id,other,z,w\n1,bar,3,4\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Smart,
            ..MergeSpec::default()
        };
        let merged = merge(&files, &spec).unwrap();

        // 1 of 7 columns shared: append, not join
        assert_eq!(merged.row_count(), 2);
        assert_eq!(merged.column_names().len(), 7);
    }

    #[test]
    fn test_smart_merge_skips_non_unique_key_candidates() {
        let files = file_set(&[
            ("A", "tag,val\nx,1\nx,2\n"),
            ("B", "tag,val\ny,3\n"),
        ]);
        let spec = MergeSpec {
            method: MergeMethod::Smart,
            ..MergeSpec::default()
        };
        let merged = merge(&files, &spec).unwrap();

        // `tag` repeats within A so it cannot be the key; `val` is unique
        // in both tables and becomes the join key. Outer join on disjoint
        // key values keeps all three rows.
        assert_eq!(merged.row_count(), 3);
        assert!(merged.column_index("val").is_some());
    }

    #[test]
    fn test_dedup_rows_idempotent() {
        let table = csv_table("a,b\n1,x\n1,x\n2,y\n1,x\n");
        let once = dedup_rows(&table);
        let twice = dedup_rows(&once);

        assert_eq!(once.row_count(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fill_numeric_mean() {
        let table = csv_table("v,tag\n10,a\n,b\n30,c\n");
        let filled = fill_missing(&table, &FillSpec::default());

        let values: Vec<f64> = filled
            .column_values(0)
            .map(|v| v.as_number().unwrap())
            .collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_fill_numeric_median_and_zero() {
        let table = csv_table("v,tag\n1,a\n,b\n100,c\n3,d\n");
        let median = fill_missing(
            &table,
            &FillSpec {
                numeric: NumericFill::Median,
                ..FillSpec::default()
            },
        );
        assert_eq!(median.rows[1][0], Value::Float(3.0));

        let zero = fill_missing(
            &table,
            &FillSpec {
                numeric: NumericFill::Zero,
                ..FillSpec::default()
            },
        );
        assert_eq!(zero.rows[1][0], Value::Int(0));
    }

    #[test]
    fn test_fill_text_mode() {
        let table = csv_table("c,n\nred,1\nblue,2\n,3\nred,4\n");
        let filled = fill_missing(
            &table,
            &FillSpec {
                text: TextFill::Mode,
                ..FillSpec::default()
            },
        );
        assert_eq!(filled.rows[2][0], Value::Text("red".to_string()));
    }

    #[test]
    fn test_fill_datetime_forward_and_backward() {
        let table = csv_table("d,n\n2024-01-01,1\n,2\n2024-01-03,3\n");
        let forward = fill_missing(&table, &FillSpec::default());
        assert_eq!(forward.rows[1][0], forward.rows[0][0]);

        let backward = fill_missing(
            &table,
            &FillSpec {
                datetime: DateTimeFill::Backward,
                ..FillSpec::default()
            },
        );
        assert_eq!(backward.rows[1][0], backward.rows[2][0]);
    }

    #[test]
    fn test_all_missing_column_left_untouched_by_mean() {
        let table = csv_table("a,b\n1,\n2,\n");
        let filled = fill_missing(&table, &FillSpec::default());
        assert_eq!(filled.rows[0][1], Value::Missing);
    }
}
