//! Built-in transformers registered at startup

use crate::error::{Error, Result};
use crate::plugin::{
    number_param, text_param, ParamKind, ParamOption, ParamSpec, ParamValue, Params, Registry,
    Transformer,
};
use crate::table::{Column, Table, Value};
use chrono::{Datelike, Timelike};

/// Register every built-in transformer
pub fn register_builtins(registry: &mut Registry) {
    registry.register(Box::new(NumericScaling));
    registry.register(Box::new(TextCase));
    registry.register(Box::new(TextPatternExtract));
    registry.register(Box::new(DateComponent));
    log::info!("registered {} built-in transformers", registry.len());
}

fn required_column<'a>(
    table: &Table,
    specs: &'a [ParamSpec],
    params: &'a Params,
    name: &str,
) -> Result<usize> {
    let column = text_param(specs, params, name).unwrap_or_default();
    table
        .column_index(column)
        .ok_or_else(|| Error::UnknownColumn(column.to_string()))
}

/// Scale a numeric column into a new column
pub struct NumericScaling;

impl Transformer for NumericScaling {
    fn name(&self) -> &str {
        "numeric_scaling"
    }

    fn description(&self) -> &str {
        "Scale numeric data using min-max, z-score, max-abs or a custom range"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("column", ParamKind::Select, "Column").with_column_options(),
            ParamSpec::optional(
                "method",
                ParamKind::Select,
                "Scaling Method",
                ParamValue::Text("min_max".to_string()),
            )
            .with_options(vec![
                ParamOption::new("min_max", "Min-Max Scaling (0-1)"),
                ParamOption::new("z_score", "Z-Score Standardization"),
                ParamOption::new("max_abs", "Max Absolute Scaling (-1 to 1)"),
                ParamOption::new("custom_range", "Custom Range Scaling"),
            ]),
            ParamSpec::optional(
                "min_value",
                ParamKind::Number,
                "Min Value (for Custom Range)",
                ParamValue::Number(0.0),
            ),
            ParamSpec::optional(
                "max_value",
                ParamKind::Number,
                "Max Value (for Custom Range)",
                ParamValue::Number(100.0),
            ),
            ParamSpec::optional(
                "new_column",
                ParamKind::String,
                "New Column Name",
                ParamValue::Text(String::new()),
            ),
        ]
    }

    fn transform(&self, table: &Table, params: &Params) -> Result<Table> {
        let specs = self.parameters();
        let idx = required_column(table, &specs, params, "column")?;
        let method = text_param(&specs, params, "method").unwrap_or("min_max");
        let range_min = number_param(&specs, params, "min_value").unwrap_or(0.0);
        let range_max = number_param(&specs, params, "max_value").unwrap_or(100.0);

        let numbers: Vec<Option<f64>> =
            table.column_values(idx).map(Value::as_number).collect();
        let present: Vec<f64> = numbers.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(Error::InvalidParams {
                transformer: self.name().to_string(),
                message: format!(
                    "column '{}' does not contain numeric data",
                    table.columns[idx].name
                ),
            });
        }

        let min = present.iter().copied().fold(f64::INFINITY, f64::min);
        let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        let std = sample_std(&present, mean);

        let scale = |x: f64| -> f64 {
            match method {
                "z_score" => {
                    if std == 0.0 {
                        0.0
                    } else {
                        (x - mean) / std
                    }
                }
                "max_abs" => {
                    let max_abs = min.abs().max(max.abs());
                    if max_abs == 0.0 {
                        0.0
                    } else {
                        x / max_abs
                    }
                }
                "custom_range" => {
                    if min == max {
                        (range_min + range_max) / 2.0
                    } else {
                        (x - min) / (max - min) * (range_max - range_min) + range_min
                    }
                }
                // min_max
                _ => {
                    if min == max {
                        0.5
                    } else {
                        (x - min) / (max - min)
                    }
                }
            }
        };

        let source_name = table.columns[idx].name.clone();
        let target = match text_param(&specs, params, "new_column") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                let suffix = match method {
                    "z_score" => "zscore",
                    "max_abs" => "maxabs",
                    "custom_range" => "custom",
                    _ => "scaled",
                };
                format!("{}_{}", source_name, suffix)
            }
        };

        let scaled: Vec<Value> = numbers
            .iter()
            .map(|n| match n {
                Some(x) => Value::Float(scale(*x)),
                None => Value::Missing,
            })
            .collect();

        Ok(with_column(table, &target, scaled))
    }
}

/// Sample standard deviation, zero for fewer than two values
fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Change the case of text in a column
pub struct TextCase;

impl Transformer for TextCase {
    fn name(&self) -> &str {
        "text_case"
    }

    fn description(&self) -> &str {
        "Change the case of text data in a column"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("column", ParamKind::Select, "Column").with_column_options(),
            ParamSpec::optional(
                "case_type",
                ParamKind::Select,
                "Case Type",
                ParamValue::Text("lower".to_string()),
            )
            .with_options(vec![
                ParamOption::new("lower", "Lowercase"),
                ParamOption::new("upper", "Uppercase"),
                ParamOption::new("title", "Title Case"),
                ParamOption::new("sentence", "Sentence case"),
            ]),
        ]
    }

    fn transform(&self, table: &Table, params: &Params) -> Result<Table> {
        let specs = self.parameters();
        let idx = required_column(table, &specs, params, "column")?;
        let case_type = text_param(&specs, params, "case_type").unwrap_or("lower");

        let mut result = table.clone();
        for row in &mut result.rows {
            if row[idx].is_missing() {
                continue;
            }
            let text = row[idx].render();
            let changed = match case_type {
                "upper" => text.to_uppercase(),
                "title" => title_case(&text),
                "sentence" => sentence_case(&text),
                _ => text.to_lowercase(),
            };
            row[idx] = Value::Text(changed);
        }
        Ok(result)
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn sentence_case(text: &str) -> String {
    capitalize(&text.to_lowercase())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Extract a regex match into a new column
pub struct TextPatternExtract;

impl Transformer for TextPatternExtract {
    fn name(&self) -> &str {
        "text_pattern_extract"
    }

    fn description(&self) -> &str {
        "Extract text matching a pattern into a new column"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("column", ParamKind::Select, "Column").with_column_options(),
            ParamSpec::required("pattern", ParamKind::String, "Regular Expression"),
            ParamSpec::required("target_column", ParamKind::String, "Target Column Name"),
        ]
    }

    fn transform(&self, table: &Table, params: &Params) -> Result<Table> {
        let specs = self.parameters();
        let idx = required_column(table, &specs, params, "column")?;
        let pattern = text_param(&specs, params, "pattern").unwrap_or_default();
        let target = text_param(&specs, params, "target_column").unwrap_or_default();
        if target.is_empty() {
            return Err(Error::InvalidParams {
                transformer: self.name().to_string(),
                message: "target column name cannot be empty".to_string(),
            });
        }

        let regex = regex::Regex::new(pattern).map_err(|e| Error::InvalidParams {
            transformer: self.name().to_string(),
            message: format!("invalid pattern: {}", e),
        })?;

        let extracted: Vec<Value> = table
            .rows
            .iter()
            .map(|row| {
                if row[idx].is_missing() {
                    return Value::Missing;
                }
                let text = row[idx].render();
                match regex.captures(&text) {
                    Some(caps) => {
                        // First capture group when present, whole match otherwise
                        let m = caps.get(1).or_else(|| caps.get(0));
                        m.map(|m| Value::Text(m.as_str().to_string()))
                            .unwrap_or(Value::Missing)
                    }
                    None => Value::Missing,
                }
            })
            .collect();

        Ok(with_column(table, target, extracted))
    }
}

/// Extract a component of a datetime column
pub struct DateComponent;

impl Transformer for DateComponent {
    fn name(&self) -> &str {
        "date_component"
    }

    fn description(&self) -> &str {
        "Extract a component (year, month, day, ...) from a datetime column"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("column", ParamKind::Select, "Date Column").with_column_options(),
            ParamSpec::optional(
                "component",
                ParamKind::Select,
                "Component to Extract",
                ParamValue::Text("year".to_string()),
            )
            .with_options(vec![
                ParamOption::new("year", "Year"),
                ParamOption::new("month", "Month (number)"),
                ParamOption::new("month_name", "Month Name"),
                ParamOption::new("day", "Day of Month"),
                ParamOption::new("day_of_week", "Day of Week (number)"),
                ParamOption::new("day_name", "Day Name"),
                ParamOption::new("quarter", "Quarter"),
                ParamOption::new("week", "Week of Year"),
                ParamOption::new("hour", "Hour"),
                ParamOption::new("minute", "Minute"),
                ParamOption::new("second", "Second"),
            ]),
            ParamSpec::required("target_column", ParamKind::String, "Target Column Name"),
        ]
    }

    fn transform(&self, table: &Table, params: &Params) -> Result<Table> {
        let specs = self.parameters();
        let idx = required_column(table, &specs, params, "column")?;
        let component = text_param(&specs, params, "component").unwrap_or("year");
        let target = text_param(&specs, params, "target_column").unwrap_or_default();
        if target.is_empty() {
            return Err(Error::InvalidParams {
                transformer: self.name().to_string(),
                message: "target column name cannot be empty".to_string(),
            });
        }

        let extracted: Vec<Value> = table
            .rows
            .iter()
            .map(|row| {
                let dt = match &row[idx] {
                    Value::DateTime(dt) => Some(*dt),
                    Value::Text(s) => match Value::parse(s) {
                        Value::DateTime(dt) => Some(dt),
                        _ => None,
                    },
                    _ => None,
                };
                let Some(dt) = dt else {
                    return Value::Missing;
                };
                match component {
                    "month" => Value::Int(dt.month() as i64),
                    "month_name" => Value::Text(dt.format("%B").to_string()),
                    "day" => Value::Int(dt.day() as i64),
                    // 1-based, Monday first
                    "day_of_week" => Value::Int(dt.weekday().num_days_from_monday() as i64 + 1),
                    "day_name" => Value::Text(dt.format("%A").to_string()),
                    "quarter" => Value::Int(((dt.month() - 1) / 3 + 1) as i64),
                    "week" => Value::Int(dt.iso_week().week() as i64),
                    "hour" => Value::Int(dt.hour() as i64),
                    "minute" => Value::Int(dt.minute() as i64),
                    "second" => Value::Int(dt.second() as i64),
                    _ => Value::Int(dt.year() as i64),
                }
            })
            .collect();

        Ok(with_column(table, target, extracted))
    }
}

/// Copy a table, writing values into a (new or existing) column
fn with_column(table: &Table, name: &str, values: Vec<Value>) -> Table {
    let mut result = table.clone();
    match result.column_index(name) {
        Some(idx) => {
            for (row, value) in result.rows.iter_mut().zip(values) {
                row[idx] = value;
            }
        }
        None => {
            let index = result.column_count();
            result.columns.push(Column::new(name, index));
            for (row, value) in result.rows.iter_mut().zip(values) {
                row.push(value);
            }
        }
    }
    result
}
