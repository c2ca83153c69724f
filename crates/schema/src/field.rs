use crate::schema::Schema;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use core_types::{ISO_DATE, ISO_DATETIME, Value};
use polars::prelude::{DataType, TimeUnit};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::sync::Arc;

pub(crate) const NULL_MESSAGE: &str = "Field may not be null.";
pub(crate) const REQUIRED_MESSAGE: &str = "Missing data for required field.";

/// Datetime layouts tried after the field's own format.
const DATETIME_FALLBACKS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", ISO_DATETIME];

/// The declared type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Integer,
    Float,
    Decimal,
    Str,
    Bool,
    Date { format: String },
    DateTime { format: String },
    List(Box<FieldKind>),
    Dict,
    Nested(Arc<Schema>),
}

impl FieldKind {
    /// A date field using the ISO layout.
    pub fn date() -> Self {
        FieldKind::Date {
            format: ISO_DATE.to_string(),
        }
    }

    /// A datetime field using the ISO layout.
    pub fn datetime() -> Self {
        FieldKind::DateTime {
            format: ISO_DATETIME.to_string(),
        }
    }

    pub fn list(item: FieldKind) -> Self {
        FieldKind::List(Box::new(item))
    }

    pub fn nested(schema: Schema) -> Self {
        FieldKind::Nested(Arc::new(schema))
    }

    /// Short name used in listings and declarations.
    pub fn label(&self) -> String {
        match self {
            FieldKind::Integer => "integer".into(),
            FieldKind::Float => "float".into(),
            FieldKind::Decimal => "decimal".into(),
            FieldKind::Str => "string".into(),
            FieldKind::Bool => "bool".into(),
            FieldKind::Date { .. } => "date".into(),
            FieldKind::DateTime { .. } => "datetime".into(),
            FieldKind::List(item) => format!("list<{}>", item.label()),
            FieldKind::Dict => "dict".into(),
            FieldKind::Nested(schema) => format!("nested<{}>", schema.name()),
        }
    }

    /// The frame dtype a column of this kind is stored as.
    ///
    /// Containers have no flat column representation and are carried as JSON text.
    pub fn frame_dtype(&self) -> DataType {
        match self {
            FieldKind::Integer => DataType::Int64,
            FieldKind::Float | FieldKind::Decimal => DataType::Float64,
            FieldKind::Str => DataType::String,
            FieldKind::Bool => DataType::Boolean,
            FieldKind::Date { .. } => DataType::Date,
            FieldKind::DateTime { .. } => DataType::Datetime(TimeUnit::Nanoseconds, None),
            FieldKind::List(_) | FieldKind::Dict | FieldKind::Nested(_) => DataType::String,
        }
    }

    /// Whether frame cells of this kind hold JSON text rather than a scalar.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            FieldKind::List(_) | FieldKind::Dict | FieldKind::Nested(_)
        )
    }

    /// Validates one non-null JSON value against this kind.
    pub(crate) fn deserialize(&self, raw: &JsonValue) -> Result<Value, Vec<String>> {
        match self {
            FieldKind::Integer => parse_integer(raw).ok_or_else(|| invalid("Not a valid integer.")),
            FieldKind::Float => parse_float(raw).ok_or_else(|| invalid("Not a valid number.")),
            FieldKind::Decimal => parse_decimal(raw).ok_or_else(|| invalid("Not a valid number.")),
            FieldKind::Str => match raw {
                JsonValue::String(s) => Ok(Value::Str(s.clone())),
                _ => Err(invalid("Not a valid string.")),
            },
            FieldKind::Bool => parse_bool(raw).ok_or_else(|| invalid("Not a valid boolean.")),
            FieldKind::Date { format } => raw
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), format).ok())
                .map(Value::Date)
                .ok_or_else(|| invalid("Not a valid date.")),
            FieldKind::DateTime { format } => raw
                .as_str()
                .and_then(|s| parse_datetime(s.trim(), format))
                .map(Value::DateTime)
                .ok_or_else(|| invalid("Not a valid datetime.")),
            FieldKind::List(item) => {
                let JsonValue::Array(items) = raw else {
                    return Err(invalid("Not a valid list."));
                };
                let mut values = Vec::with_capacity(items.len());
                let mut errors = Vec::new();
                for (i, entry) in items.iter().enumerate() {
                    if entry.is_null() {
                        errors.push(format!("Item {i}: {NULL_MESSAGE}"));
                        continue;
                    }
                    match item.deserialize(entry) {
                        Ok(v) => values.push(v),
                        Err(messages) => {
                            errors.extend(messages.into_iter().map(|m| format!("Item {i}: {m}")))
                        }
                    }
                }
                if errors.is_empty() {
                    Ok(Value::List(values))
                } else {
                    Err(errors)
                }
            }
            FieldKind::Dict => match raw {
                JsonValue::Object(_) => Ok(Value::from_json(raw)),
                _ => Err(invalid("Not a valid mapping type.")),
            },
            FieldKind::Nested(schema) => {
                let JsonValue::Object(map) = raw else {
                    return Err(invalid("Invalid input type."));
                };
                let kind = schema.record_kind();
                match schema.validate(map) {
                    Ok(values) => kind
                        .make(values)
                        .map(Value::Record)
                        .map_err(|e| vec![e.to_string()]),
                    Err(fields) => Err(fields
                        .into_iter()
                        .flat_map(|(field, messages)| {
                            messages.into_iter().map(move |m| format!("{field}: {m}"))
                        })
                        .collect()),
                }
            }
        }
    }

    /// Renders a validated value back to JSON, applying date formats.
    pub fn render(&self, value: &Value) -> JsonValue {
        match (self, value) {
            (FieldKind::Date { format }, Value::Date(d)) => {
                JsonValue::String(d.format(format).to_string())
            }
            (FieldKind::DateTime { format }, Value::DateTime(dt)) => {
                JsonValue::String(dt.format(format).to_string())
            }
            (FieldKind::List(item), Value::List(items)) => {
                JsonValue::Array(items.iter().map(|v| item.render(v)).collect())
            }
            (FieldKind::Nested(schema), Value::Record(record)) => {
                JsonValue::Object(schema.dump(record))
            }
            (_, other) => other.to_json(),
        }
    }
}

fn invalid(message: &str) -> Vec<String> {
    vec![message.to_string()]
}

fn parse_integer(raw: &JsonValue) -> Option<Value> {
    match raw {
        JsonValue::Number(n) => n.as_i64().map(Value::Int).or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| Value::Int(f as i64))
        }),
        JsonValue::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
        _ => None,
    }
}

/// NaN and infinities are rejected: they have no JSON form to dump to.
fn parse_float(raw: &JsonValue) -> Option<Value> {
    let parsed = match raw {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).map(Value::Float)
}

fn parse_decimal(raw: &JsonValue) -> Option<Value> {
    let text = match raw {
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .map(Value::Decimal)
}

fn parse_bool(raw: &JsonValue) -> Option<Value> {
    match raw {
        JsonValue::Bool(b) => Some(Value::Bool(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(1) => Some(Value::Bool(true)),
            Some(0) => Some(Value::Bool(false)),
            _ => None,
        },
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" | "on" => Some(Value::Bool(true)),
            "false" | "f" | "0" | "no" | "n" | "off" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn parse_datetime(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            DATETIME_FALLBACKS
                .iter()
                .filter(|layout| **layout != format)
                .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// A named, typed field of a `Schema`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    kind: FieldKind,
    allow_none: bool,
    required: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            allow_none: false,
            required: false,
        }
    }

    /// Accept explicit nulls for this field.
    pub fn allow_none(mut self) -> Self {
        self.allow_none = true;
        self
    }

    /// Reject records that omit this field.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn allows_none(&self) -> bool {
        self.allow_none
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}
