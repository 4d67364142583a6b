//! Schema reconciliation across loaded tables
//!
//! Builds the mapping from canonical column name to the (file, column)
//! pairs treated as equivalent. Exact matches come first, optionally
//! case-insensitive; fuzzy matching groups similarly named columns by
//! edit-distance similarity. The mapping drives join-key resolution and
//! smart-merge column alignment.

use crate::table::LoadedFileSet;
use serde::{Deserialize, Serialize};

/// Default similarity threshold for fuzzy column matching
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Column matching policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Fold column names to lowercase before comparing
    pub ignore_case: bool,
    /// Group columns whose names are merely similar
    pub fuzzy: bool,
    /// Similarity required for a fuzzy group, in 0..=1
    pub fuzzy_threshold: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            ignore_case: true,
            fuzzy: false,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

impl MatchOptions {
    fn fold(&self, name: &str) -> String {
        if self.ignore_case {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }
}

/// One reconciled column: a canonical name and its source columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// Canonical column name (first-seen, case-folded per options)
    pub canonical: String,
    /// (file id, original column name) pairs, in file order
    pub members: Vec<(String, String)>,
}

impl SchemaEntry {
    /// Whether a given file contributes to this column
    pub fn has_file(&self, file_id: &str) -> bool {
        self.members.iter().any(|(id, _)| id == file_id)
    }
}

/// Reconciled schema over a file set, canonical order = first seen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaMap {
    entries: Vec<SchemaEntry>,
}

impl SchemaMap {
    /// Canonical column names in first-seen order
    pub fn canonical_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.canonical.as_str()).collect()
    }

    /// Iterate entries in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.iter()
    }

    /// Look up an entry by canonical name
    pub fn entry(&self, canonical: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.canonical == canonical)
    }

    /// Resolve a user-supplied column name to its canonical entry
    pub fn resolve(&self, name: &str, options: &MatchOptions) -> Option<&SchemaEntry> {
        let folded = options.fold(name);
        self.entries.iter().find(|e| e.canonical == folded || {
            e.members
                .iter()
                .any(|(_, original)| options.fold(original) == folded)
        })
    }

    /// Entries present in every file of the set
    pub fn common_entries(&self, file_count: usize) -> Vec<&SchemaEntry> {
        self.entries
            .iter()
            .filter(|e| {
                let mut ids: Vec<&str> = e.members.iter().map(|(id, _)| id.as_str()).collect();
                ids.dedup();
                ids.len() == file_count
            })
            .collect()
    }

    /// The original-to-canonical column renames needed for one file
    pub fn rename_plan(&self, file_id: &str) -> Vec<(String, String)> {
        let mut plan = Vec::new();
        for entry in &self.entries {
            for (id, original) in &entry.members {
                if id == file_id && *original != entry.canonical {
                    plan.push((original.clone(), entry.canonical.clone()));
                }
            }
        }
        plan
    }
}

/// Reconcile column names across all loaded files
pub fn reconcile(files: &LoadedFileSet, options: &MatchOptions) -> SchemaMap {
    let mut map = SchemaMap::default();

    for file in files.iter() {
        for column in &file.table.columns {
            let folded = options.fold(&column.name);

            let slot = find_slot(&map, &folded, options);
            match slot {
                Some(idx) => map.entries[idx]
                    .members
                    .push((file.id.clone(), column.name.clone())),
                None => map.entries.push(SchemaEntry {
                    canonical: folded,
                    members: vec![(file.id.clone(), column.name.clone())],
                }),
            }
        }
    }

    map
}

/// Index of the entry a folded name belongs to, if any
fn find_slot(map: &SchemaMap, folded: &str, options: &MatchOptions) -> Option<usize> {
    // Exact match first
    if let Some(idx) = map.entries.iter().position(|e| e.canonical == folded) {
        return Some(idx);
    }

    if !options.fuzzy {
        return None;
    }

    // Best fuzzy match above threshold; ties keep the first-seen entry
    let mut best: Option<(usize, f64)> = None;
    for (idx, entry) in map.entries.iter().enumerate() {
        let score = similarity(folded, &entry.canonical);
        if score >= options.fuzzy_threshold {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((idx, score)),
            }
        }
    }
    best.map(|(idx, _)| idx)
}

/// Normalized similarity of two strings in 0..=1
///
/// 1 - levenshtein / max_len, which tracks difflib's ratio closely enough
/// for column-name matching.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn file_set(files: &[(&str, &[&str])]) -> LoadedFileSet {
        let mut set = LoadedFileSet::new();
        for (id, columns) in files {
            set.insert(*id, Table::new(columns));
        }
        set
    }

    #[test]
    fn test_exact_case_insensitive_grouping() {
        let set = file_set(&[("a.csv", &["ID", "Name"]), ("b.csv", &["id", "NAME"])]);
        let map = reconcile(&set, &MatchOptions::default());

        assert_eq!(map.canonical_names(), vec!["id", "name"]);
        let id = map.entry("id").unwrap();
        assert_eq!(id.members.len(), 2);
        assert!(id.has_file("a.csv") && id.has_file("b.csv"));
    }

    #[test]
    fn test_case_sensitive_keeps_separate() {
        let set = file_set(&[("a.csv", &["ID"]), ("b.csv", &["id"])]);
        let options = MatchOptions {
            ignore_case: false,
            ..MatchOptions::default()
        };
        let map = reconcile(&set, &options);
        assert_eq!(map.canonical_names(), vec!["ID", "id"]);
    }

    #[test]
    fn test_fuzzy_groups_similar_names() {
        let set = file_set(&[("a.csv", &["customer_id"]), ("b.csv", &["customerid"])]);
        let options = MatchOptions {
            fuzzy: true,
            ..MatchOptions::default()
        };
        let map = reconcile(&set, &options);

        assert_eq!(map.canonical_names(), vec!["customer_id"]);
        assert_eq!(map.entry("customer_id").unwrap().members.len(), 2);
    }

    #[test]
    fn test_fuzzy_below_threshold_stays_apart() {
        let set = file_set(&[("a.csv", &["price"]), ("b.csv", &["quantity"])]);
        let options = MatchOptions {
            fuzzy: true,
            ..MatchOptions::default()
        };
        let map = reconcile(&set, &options);
        assert_eq!(map.canonical_names().len(), 2);
    }

    #[test]
    fn test_rename_plan_maps_to_canonical() {
        let set = file_set(&[("a.csv", &["Id"]), ("b.csv", &["ID"])]);
        let map = reconcile(&set, &MatchOptions::default());

        assert_eq!(map.rename_plan("a.csv"), vec![("Id".to_string(), "id".to_string())]);
        assert_eq!(map.rename_plan("b.csv"), vec![("ID".to_string(), "id".to_string())]);
    }

    #[test]
    fn test_resolve_by_original_name() {
        let set = file_set(&[("a.csv", &["OrderId"])]);
        let options = MatchOptions::default();
        let map = reconcile(&set, &options);

        let entry = map.resolve("ORDERID", &options).unwrap();
        assert_eq!(entry.canonical, "orderid");
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert!(similarity("abc", "xyz") < 0.01);
        assert!(similarity("customer_id", "customerid") > 0.8);
    }

    #[test]
    fn test_common_entries() {
        let set = file_set(&[("a.csv", &["id", "x"]), ("b.csv", &["id", "y"])]);
        let map = reconcile(&set, &MatchOptions::default());

        let common = map.common_entries(2);
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].canonical, "id");
    }
}
