//! Transformer plugin contract and registry
//!
//! A transformer exposes a name, a description and a declarative parameter
//! list, plus a pure transform over a table. Transformers are collected
//! into an explicit registry by registration calls at startup, never by
//! import-time discovery. The transformation pipeline treats a registered
//! transformer exactly like a built-in step.

use crate::error::{Error, Result};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared type of a transformer parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Select,
    SelectMultiple,
}

/// One option of a select parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamOption {
    pub value: String,
    pub label: String,
}

impl ParamOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Declaration of a single transformer parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name, the key callers pass values under
    pub name: String,
    pub kind: ParamKind,
    /// Display label
    pub label: String,
    pub required: bool,
    pub default: Option<ParamValue>,
    /// Static options for select kinds
    pub options: Vec<ParamOption>,
    /// Populate options dynamically from the table's column names
    pub column_options: bool,
}

impl ParamSpec {
    /// A required parameter with no default or options
    pub fn required(name: impl Into<String>, kind: ParamKind, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            label: label.into(),
            required: true,
            default: None,
            options: Vec::new(),
            column_options: false,
        }
    }

    /// An optional parameter with a default value
    pub fn optional(
        name: impl Into<String>,
        kind: ParamKind,
        label: impl Into<String>,
        default: ParamValue,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            label: label.into(),
            required: false,
            default: Some(default),
            options: Vec::new(),
            column_options: false,
        }
    }

    /// Attach static select options
    pub fn with_options(mut self, options: Vec<ParamOption>) -> Self {
        self.options = options;
        self
    }

    /// Mark the parameter as column-populated
    pub fn with_column_options(mut self) -> Self {
        self.column_options = true;
        self
    }
}

/// A parameter value supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Choices(Vec<String>),
}

impl ParamValue {
    /// Text view, covering string and select values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ParamValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

/// Parameter values keyed by parameter name
pub type Params = BTreeMap<String, ParamValue>;

/// Fetch a required text parameter, falling back to the spec default
pub fn text_param<'a>(
    specs: &'a [ParamSpec],
    params: &'a Params,
    name: &str,
) -> Option<&'a str> {
    match params.get(name) {
        Some(value) => value.as_text(),
        None => specs
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.default.as_ref())
            .and_then(|d| d.as_text()),
    }
}

/// Fetch a numeric parameter, falling back to the spec default
pub fn number_param(specs: &[ParamSpec], params: &Params, name: &str) -> Option<f64> {
    match params.get(name) {
        Some(value) => value.as_number(),
        None => specs
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.default.as_ref())
            .and_then(|d| d.as_number()),
    }
}

/// A registered data transformer
pub trait Transformer {
    /// Unique transformer name
    fn name(&self) -> &str;

    /// Short description of what the transformer does
    fn description(&self) -> &str;

    /// Declared parameter list
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Apply the transformation, returning a new table
    fn transform(&self, table: &Table, params: &Params) -> Result<Table>;

    /// Check that every required parameter was supplied
    fn validate_params(&self, params: &Params) -> Result<()> {
        for spec in self.parameters() {
            if spec.required && !params.contains_key(&spec.name) {
                return Err(Error::InvalidParams {
                    transformer: self.name().to_string(),
                    message: format!("parameter '{}' is required", spec.name),
                });
            }
        }
        Ok(())
    }
}

/// Ordered mapping from transformer name to implementation
///
/// Registration order is preserved; registering a name twice replaces the
/// earlier entry in place.
#[derive(Default)]
pub struct Registry {
    transformers: Vec<Box<dyn Transformer>>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in transformers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::transformers::register_builtins(&mut registry);
        registry
    }

    /// Register a transformer; a duplicate name replaces the earlier entry
    pub fn register(&mut self, transformer: Box<dyn Transformer>) {
        let name = transformer.name().to_string();
        match self.transformers.iter().position(|t| t.name() == name) {
            Some(idx) => {
                log::warn!("transformer '{}' re-registered, replacing", name);
                self.transformers[idx] = transformer;
            }
            None => self.transformers.push(transformer),
        }
    }

    /// Look up a transformer by name
    pub fn get(&self, name: &str) -> Option<&dyn Transformer> {
        self.transformers
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Iterate transformers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Transformer> {
        self.transformers.iter().map(|t| t.as_ref())
    }

    /// Number of registered transformers
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Validate parameters and apply a named transformer
    pub fn apply(&self, table: &Table, name: &str, params: &Params) -> Result<Table> {
        let transformer = self
            .get(name)
            .ok_or_else(|| Error::UnknownTransformer(name.to_string()))?;
        transformer.validate_params(params)?;
        transformer.transform(table, params)
    }
}
