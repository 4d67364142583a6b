//! Session state and interaction handlers
//!
//! One explicit state object per session, passed to each interaction, in
//! place of ambient global state. Handlers commit only on success: any
//! error leaves the loaded files, the merged result and the step list at
//! their last-good values. Interactions are synchronous and run one at a
//! time.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::export::{self, ExportFormat};
use crate::merge::{self, MergeSpec};
use crate::plugin::{Registry, Transformer};
use crate::reader::{self, FileFormat, ReadOptions};
use crate::table::{LoadedFileSet, Table};
use crate::transform::{self, TransformStep};

/// The merged table plus its retained pre-transformation original
#[derive(Debug, Clone)]
pub struct MergedResult {
    /// Table as produced by the merge, untouched by transformations
    pub original: Table,
    /// Table after the current step list
    pub current: Table,
}

/// Per-session state holding everything one user works on
pub struct Session {
    config: AppConfig,
    registry: Registry,
    files: LoadedFileSet,
    spec: MergeSpec,
    merged: Option<MergedResult>,
    steps: Vec<TransformStep>,
}

impl Session {
    /// Create a session from configuration
    pub fn new(config: AppConfig) -> Self {
        let registry = if config.plugins_enabled {
            Registry::with_builtins()
        } else {
            Registry::new()
        };
        let spec = config.merge_spec();
        Self {
            config,
            registry,
            files: LoadedFileSet::new(),
            spec,
            merged: None,
            steps: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register an additional transformer for this session
    pub fn register_transformer(&mut self, transformer: Box<dyn Transformer>) {
        self.registry.register(transformer);
    }

    pub fn files(&self) -> &LoadedFileSet {
        &self.files
    }

    pub fn spec(&self) -> &MergeSpec {
        &self.spec
    }

    pub fn merged(&self) -> Option<&MergedResult> {
        self.merged.as_ref()
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// Parse and store an uploaded file; a duplicate id replaces in place
    pub fn load_file(
        &mut self,
        id: &str,
        bytes: &[u8],
        format: FileFormat,
        options: Option<ReadOptions>,
    ) -> Result<()> {
        let mut options = options.unwrap_or_default();
        if options.max_size_bytes.is_none() {
            options.max_size_bytes = Some(self.config.max_size_bytes());
        }

        let table = reader::read_bytes(id, bytes, format, &options)?;
        self.files.insert(id, table);
        Ok(())
    }

    /// Drop a loaded file
    pub fn remove_file(&mut self, id: &str) -> Result<()> {
        if !self.files.remove(id) {
            return Err(Error::InvalidSpec(format!("no loaded file '{}'", id)));
        }
        Ok(())
    }

    /// Clear all session state back to the configured defaults
    pub fn reset(&mut self) {
        self.files.clear();
        self.merged = None;
        self.steps.clear();
        self.spec = self.config.merge_spec();
        log::info!("session reset");
    }

    /// Replace the merge spec; takes effect on the next merge
    pub fn set_spec(&mut self, spec: MergeSpec) {
        self.spec = spec;
    }

    /// Recompute the merged result from the loaded files and current spec
    ///
    /// Clears the transformation step list: the fresh merge is both the
    /// current table and the retained original.
    pub fn merge(&mut self) -> Result<&Table> {
        let table = merge::merge(&self.files, &self.spec)?;
        self.steps.clear();
        let merged = self.merged.insert(MergedResult {
            original: table.clone(),
            current: table,
        });
        Ok(&merged.current)
    }

    /// Append a transformation step, replaying the whole list
    pub fn add_step(&mut self, step: TransformStep) -> Result<&Table> {
        let merged = self
            .merged
            .as_mut()
            .ok_or_else(|| Error::InvalidSpec("merge files before transforming".to_string()))?;

        let mut steps = self.steps.clone();
        steps.push(step);
        let current = transform::apply_steps(&merged.original, &steps, &self.registry)?;

        // Replay succeeded, commit
        self.steps = steps;
        merged.current = current;
        Ok(&merged.current)
    }

    /// Remove one step by index, replaying the remaining list
    pub fn remove_step(&mut self, index: usize) -> Result<&Table> {
        if index >= self.steps.len() {
            return Err(Error::InvalidSpec(format!(
                "no transformation step at index {}",
                index
            )));
        }
        let merged = self
            .merged
            .as_mut()
            .ok_or_else(|| Error::InvalidSpec("merge files before transforming".to_string()))?;

        let mut steps = self.steps.clone();
        steps.remove(index);
        let current = transform::apply_steps(&merged.original, &steps, &self.registry)?;

        self.steps = steps;
        merged.current = current;
        Ok(&merged.current)
    }

    /// Discard every transformation, restoring the original merged table
    pub fn reset_transformations(&mut self) -> Result<&Table> {
        let merged = self
            .merged
            .as_mut()
            .ok_or_else(|| Error::InvalidSpec("nothing merged yet".to_string()))?;
        merged.current = merged.original.clone();
        self.steps.clear();
        Ok(&merged.current)
    }

    /// Serialize the current table in an enabled export format
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let merged = self
            .merged
            .as_ref()
            .ok_or_else(|| Error::InvalidSpec("nothing merged yet".to_string()))?;
        if !self.config.format_enabled(format) {
            return Err(Error::Export(format!(
                "export format '{}' is not enabled",
                format.extension()
            )));
        }
        export::export(&merged.current, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{JoinType, MergeMethod};
    use crate::table::Value;
    use crate::transform::FilterOp;

    fn session_with_files() -> Session {
        let mut session = Session::new(AppConfig::default());
        session
            .load_file("a.csv", b"id,val\n1,10\n2,20\n", FileFormat::Csv, None)
            .unwrap();
        session
            .load_file("b.csv", b"id,score\n1,5\n2,7\n", FileFormat::Csv, None)
            .unwrap();
        session
    }

    #[test]
    fn test_full_interaction_flow() {
        let mut session = session_with_files();
        session.set_spec(MergeSpec {
            method: MergeMethod::Join,
            key: Some("id".to_string()),
            join: JoinType::Inner,
            ..MergeSpec::default()
        });

        let merged = session.merge().unwrap();
        assert_eq!(merged.row_count(), 2);

        let after = session
            .add_step(TransformStep::CalculatedColumn {
                name: "total".to_string(),
                expression: "val + score".to_string(),
            })
            .unwrap();
        assert_eq!(after.rows[0][3], Value::Int(15));

        let bytes = session.export(ExportFormat::Csv).unwrap();
        assert!(bytes.starts_with(b"id,val,score,total"));
    }

    #[test]
    fn test_failed_step_preserves_state() {
        let mut session = session_with_files();
        session.merge().unwrap();

        session
            .add_step(TransformStep::FilterRows {
                column: "val".to_string(),
                op: FilterOp::GreaterThan,
                value: "10".to_string(),
            })
            .unwrap();
        let rows_before = session.merged().unwrap().current.row_count();

        let err = session
            .add_step(TransformStep::CalculatedColumn {
                name: "x".to_string(),
                expression: "no_such_column * 2".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Expression(_)));

        // Committed state is untouched by the failed step
        assert_eq!(session.steps().len(), 1);
        assert_eq!(session.merged().unwrap().current.row_count(), rows_before);
    }

    #[test]
    fn test_reset_transformations_restores_original_exactly() {
        let mut session = session_with_files();
        session.merge().unwrap();
        let original = session.merged().unwrap().original.clone();

        session
            .add_step(TransformStep::FilterRows {
                column: "val".to_string(),
                op: FilterOp::LessThan,
                value: "100".to_string(),
            })
            .unwrap();
        session
            .add_step(TransformStep::CalculatedColumn {
                name: "double".to_string(),
                expression: "val * 2".to_string(),
            })
            .unwrap();

        let restored = session.reset_transformations().unwrap();
        assert_eq!(*restored, original);
        assert!(session.steps().is_empty());
    }

    #[test]
    fn test_remove_step_replays_from_original() {
        let mut session = session_with_files();
        session.merge().unwrap();

        session
            .add_step(TransformStep::FilterRows {
                column: "id".to_string(),
                op: FilterOp::Equals,
                value: "1".to_string(),
            })
            .unwrap();
        session
            .add_step(TransformStep::CalculatedColumn {
                name: "double".to_string(),
                expression: "val * 2".to_string(),
            })
            .unwrap();
        assert_eq!(session.merged().unwrap().current.row_count(), 1);

        // Dropping the filter brings both rows back, with the calculated
        // column still applied
        let after = session.remove_step(0).unwrap();
        assert_eq!(after.row_count(), 2);
        assert!(after.column_index("double").is_some());
    }

    #[test]
    fn test_merge_clears_steps() {
        let mut session = session_with_files();
        session.merge().unwrap();
        session
            .add_step(TransformStep::CalculatedColumn {
                name: "d".to_string(),
                expression: "val * 2".to_string(),
            })
            .unwrap();

        session.merge().unwrap();
        assert!(session.steps().is_empty());
        assert!(session.merged().unwrap().current.column_index("d").is_none());
    }

    #[test]
    fn test_oversized_upload_rejected() {
        let config: AppConfig =
            serde_json::from_str(r#"{"max_file_size_mb": 0}"#).unwrap();
        let mut session = Session::new(config);

        let err = session
            .load_file("big.csv", b"a,b\n1,2\n", FileFormat::Csv, None)
            .unwrap_err();
        assert!(matches!(err, Error::SizeLimit { .. }));
        assert!(session.files().is_empty());
    }

    #[test]
    fn test_disabled_export_format() {
        let config: AppConfig =
            serde_json::from_str(r#"{"export_formats": ["csv"]}"#).unwrap();
        let mut session = Session::new(config);
        session
            .load_file("a.csv", b"id\n1\n", FileFormat::Csv, None)
            .unwrap();
        session.merge().unwrap();

        assert!(session.export(ExportFormat::Csv).is_ok());
        let err = session.export(ExportFormat::Xlsx).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
    }

    #[test]
    fn test_plugin_step_through_session() {
        let mut session = session_with_files();
        session.merge().unwrap();

        let mut params = crate::plugin::Params::new();
        params.insert(
            "column".to_string(),
            crate::plugin::ParamValue::Text("val".to_string()),
        );
        let after = session
            .add_step(TransformStep::Plugin {
                name: "numeric_scaling".to_string(),
                params,
            })
            .unwrap();
        assert!(after.column_index("val_scaled").is_some());
    }
}
