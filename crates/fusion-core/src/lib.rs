//! fusion-core: engine for merging and transforming tabular data files
//!
//! This library provides functionality to:
//! - Parse CSV, Excel and JSON uploads into typed in-memory tables
//! - Reconcile column schemas across files (exact, case-insensitive, fuzzy)
//! - Merge tables by appending, key joins or a best-effort smart merge
//! - Apply an ordered, replayable pipeline of transformations
//! - Extend the pipeline with registered transformer plugins
//! - Export the result to CSV, Excel or JSON

pub mod config;
pub mod error;
pub mod export;
pub mod expr;
pub mod merge;
pub mod plugin;
pub mod reader;
pub mod schema;
pub mod session;
pub mod table;
pub mod transform;
pub mod transformers;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use export::{export, export_to_path, ExportFormat};
pub use expr::Expression;
pub use merge::{
    merge, DateTimeFill, FillSpec, JoinType, MergeMethod, MergeSpec, NumericFill, TextFill,
};
pub use plugin::{ParamKind, ParamSpec, ParamValue, Params, Registry, Transformer};
pub use reader::{discover_files, read_bytes, read_path, FileFormat, ReadOptions};
pub use schema::{reconcile, MatchOptions, SchemaMap};
pub use session::{MergedResult, Session};
pub use table::{Column, DataType, LoadedFile, LoadedFileSet, Table, Value};
pub use transform::{apply_step, apply_steps, FilterOp, TransformStep};
