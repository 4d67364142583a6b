//! Transformation pipeline over merged tables
//!
//! An ordered list of steps is replayed from the retained original table
//! whenever the list changes, so edits and resets are non-destructive.
//! Every step is pure: the input table is never mutated.

use crate::error::{Error, Result};
use crate::expr::Expression;
use crate::plugin::{Params, Registry};
use crate::table::{DataType, Table, Value};
use serde::{Deserialize, Serialize};

/// Row filter predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// One step of the transformation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformStep {
    /// Evaluate an expression per row and store it as a column
    CalculatedColumn { name: String, expression: String },
    /// Cast a column to a target type; ill-formed cells become missing
    ConvertType { column: String, target: DataType },
    /// Exact-match value substitution within a column
    ReplaceValue {
        column: String,
        find: String,
        replace: String,
    },
    /// Keep only rows satisfying a predicate over one column
    FilterRows {
        column: String,
        op: FilterOp,
        value: String,
    },
    /// Delegate to a registered transformer
    Plugin { name: String, params: Params },
}

impl TransformStep {
    /// Short human-readable description for logs and listings
    pub fn describe(&self) -> String {
        match self {
            TransformStep::CalculatedColumn { name, expression } => {
                format!("calculated column '{}' = {}", name, expression)
            }
            TransformStep::ConvertType { column, target } => {
                format!("convert '{}' to {:?}", column, target)
            }
            TransformStep::ReplaceValue { column, find, replace } => {
                format!("replace '{}' with '{}' in '{}'", find, replace, column)
            }
            TransformStep::FilterRows { column, op, value } => {
                format!("filter '{}' {:?} '{}'", column, op, value)
            }
            TransformStep::Plugin { name, .. } => format!("plugin '{}'", name),
        }
    }
}

/// Apply a single step, producing a new table
pub fn apply_step(table: &Table, step: &TransformStep, registry: &Registry) -> Result<Table> {
    match step {
        TransformStep::CalculatedColumn { name, expression } => {
            calculated_column(table, name, expression)
        }
        TransformStep::ConvertType { column, target } => convert_type(table, column, *target),
        TransformStep::ReplaceValue { column, find, replace } => {
            replace_value(table, column, find, replace)
        }
        TransformStep::FilterRows { column, op, value } => filter_rows(table, column, *op, value),
        TransformStep::Plugin { name, params } => registry.apply(table, name, params),
    }
}

/// Replay an ordered step list against a table
pub fn apply_steps(table: &Table, steps: &[TransformStep], registry: &Registry) -> Result<Table> {
    let mut current = table.clone();
    for step in steps {
        current = apply_step(&current, step, registry)?;
        log::debug!("applied {}: {} rows", step.describe(), current.row_count());
    }
    Ok(current)
}

fn calculated_column(table: &Table, name: &str, expression: &str) -> Result<Table> {
    if name.trim().is_empty() {
        return Err(Error::InvalidSpec("calculated column needs a name".to_string()));
    }

    let expr = Expression::parse(expression)?;
    let values = expr.evaluate(table)?;

    let mut result = table.clone();
    match result.column_index(name) {
        // Overwriting an existing column keeps its position
        Some(idx) => {
            for (row, value) in result.rows.iter_mut().zip(values) {
                row[idx] = value;
            }
        }
        None => {
            let index = result.column_count();
            result.columns.push(crate::table::Column::new(name, index));
            for (row, value) in result.rows.iter_mut().zip(values) {
                row.push(value);
            }
        }
    }
    Ok(result)
}

fn convert_type(table: &Table, column: &str, target: DataType) -> Result<Table> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;

    let mut result = table.clone();
    for row in &mut result.rows {
        row[idx] = convert_cell(&row[idx], target);
    }
    Ok(result)
}

/// Cast one cell; anything ill-formed becomes the missing marker
fn convert_cell(value: &Value, target: DataType) -> Value {
    if value.is_missing() {
        return Value::Missing;
    }
    match target {
        DataType::Text => Value::Text(value.render()),
        DataType::Number => match value {
            Value::Int(_) | Value::Float(_) => value.clone(),
            Value::Bool(b) => Value::Int(*b as i64),
            Value::Text(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Value::Int(i)
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    Value::Float(f)
                } else {
                    Value::Missing
                }
            }
            _ => Value::Missing,
        },
        DataType::Bool => match value {
            Value::Bool(_) => value.clone(),
            Value::Int(i) => Value::Bool(*i != 0),
            Value::Float(f) => Value::Bool(*f != 0.0),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Value::Bool(true),
                "false" | "no" | "0" => Value::Bool(false),
                _ => Value::Missing,
            },
            _ => Value::Missing,
        },
        DataType::DateTime => match value {
            Value::DateTime(_) => value.clone(),
            Value::Text(s) => match Value::parse(s) {
                Value::DateTime(dt) => Value::DateTime(dt),
                _ => Value::Missing,
            },
            _ => Value::Missing,
        },
    }
}

fn replace_value(table: &Table, column: &str, find: &str, replace: &str) -> Result<Table> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;

    let replacement = Value::parse(replace);
    let mut result = table.clone();
    for row in &mut result.rows {
        if row[idx].render() == find && !row[idx].is_missing() {
            row[idx] = replacement.clone();
        }
    }
    Ok(result)
}

fn filter_rows(table: &Table, column: &str, op: FilterOp, value: &str) -> Result<Table> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;

    let mut result = table.clone();
    result.rows.retain(|row| satisfies(&row[idx], op, value));
    Ok(result)
}

/// Predicate over one cell; missing cells never match
fn satisfies(cell: &Value, op: FilterOp, value: &str) -> bool {
    if cell.is_missing() {
        return false;
    }

    // Numeric comparison when both sides are numeric, else lexical
    let numeric = cell.as_number().zip(value.trim().parse::<f64>().ok());

    match op {
        FilterOp::Equals => match numeric {
            Some((a, b)) => a == b,
            None => cell.render() == value,
        },
        FilterOp::NotEquals => match numeric {
            Some((a, b)) => a != b,
            None => cell.render() != value,
        },
        FilterOp::Contains => cell.render().contains(value),
        FilterOp::GreaterThan => match numeric {
            Some((a, b)) => a > b,
            None => cell.render().as_str() > value,
        },
        FilterOp::LessThan => match numeric {
            Some((a, b)) => a < b,
            None => cell.render().as_str() < value,
        },
    }
}
