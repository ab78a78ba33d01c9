use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::AdapterError;
use super::spec::{Constraint, ParamSpec, ParamType, ToolSpec};

/// Parameters after coercion, constraint checks, and defaults.
///
/// Every value already has its declared type: strings are JSON strings,
/// integers are `i64` numbers, lists are arrays of strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedParams {
    values: BTreeMap<String, Value>,
}

impl ValidatedParams {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    /// `false` when absent.
    pub fn flag(&self, name: &str) -> bool {
        self.values.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// The value rendered as argv tokens. Lists yield one token per item,
    /// objects their compact JSON text.
    pub fn tokens(&self, name: &str) -> Vec<String> {
        match self.values.get(name) {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
            Some(other) => vec![scalar_text(other)],
        }
    }
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Check `args` against `spec`.
///
/// Parameters are visited in declaration order and the first failure is
/// returned; nothing is applied unless every parameter passes. Unknown
/// keys are rejected. `null` counts as absent.
pub fn validate(args: Option<&Value>, spec: &ToolSpec) -> Result<ValidatedParams, AdapterError> {
    let empty = Map::new();
    let object = match args {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => return Err(AdapterError::NotAnObject),
    };

    if let Some(unknown) = object.keys().find(|key| spec.param_spec(key).is_none()) {
        return Err(AdapterError::UnknownParam(unknown.clone()));
    }

    let mut values = BTreeMap::new();
    for param in &spec.params {
        let supplied = object.get(&param.name).filter(|v| !v.is_null());
        let raw = match (supplied, &param.default) {
            (Some(v), _) => v,
            (None, Some(default)) => default,
            (None, None) if param.required => {
                return Err(AdapterError::MissingParam(param.name.clone()));
            }
            (None, None) => continue,
        };

        let value = coerce(param, raw)?;
        check_constraints(param, &value)?;
        values.insert(param.name.clone(), value);
    }

    Ok(ValidatedParams { values })
}

fn coerce(param: &ParamSpec, raw: &Value) -> Result<Value, AdapterError> {
    let name = param.name.as_str();
    match &param.kind {
        ParamType::String => coerce_string(name, raw).map(Value::String),
        ParamType::Integer => coerce_integer(name, raw).map(Value::from),
        ParamType::Boolean => coerce_bool(name, raw).map(Value::Bool),
        ParamType::Enum(allowed) => {
            let s = coerce_string(name, raw)?;
            if allowed.iter().any(|a| *a == s) {
                Ok(Value::String(s))
            } else {
                Err(AdapterError::invalid(
                    name,
                    format!("'{s}' is not one of: {}", allowed.join(", ")),
                ))
            }
        }
        ParamType::StringList => match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_string(name, item).map(Value::String))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            scalar => coerce_string(name, scalar).map(|s| Value::Array(vec![Value::String(s)])),
        },
        ParamType::Object => match raw {
            Value::Object(_) => Ok(raw.clone()),
            _ => Err(AdapterError::invalid(name, "expected an object")),
        },
    }
}

fn coerce_string(name: &str, raw: &Value) -> Result<String, AdapterError> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(AdapterError::invalid(name, "expected a string")),
    }
}

fn coerce_integer(name: &str, raw: &Value) -> Result<i64, AdapterError> {
    match raw {
        Value::Number(n) => n.as_i64().ok_or_else(|| {
            AdapterError::invalid(name, format!("expected an integer, got {n}"))
        }),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| AdapterError::invalid(name, format!("expected an integer, got '{s}'"))),
        _ => Err(AdapterError::invalid(name, "expected an integer")),
    }
}

fn coerce_bool(name: &str, raw: &Value) -> Result<bool, AdapterError> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(AdapterError::invalid(name, format!("expected a boolean, got '{s}'"))),
        },
        _ => Err(AdapterError::invalid(name, "expected a boolean")),
    }
}

fn check_constraints(param: &ParamSpec, value: &Value) -> Result<(), AdapterError> {
    let name = param.name.as_str();
    let texts: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    for constraint in &param.constraints {
        match constraint {
            Constraint::Range { min, max } => {
                if let Some(n) = value.as_i64() {
                    if min.map_or(false, |m| n < m) || max.map_or(false, |m| n > m) {
                        return Err(AdapterError::invalid(
                            name,
                            format!("{n} is outside {}..={}", bound(*min), bound(*max)),
                        ));
                    }
                }
            }
            Constraint::NonEmpty => {
                let empty = match value {
                    Value::String(s) => s.trim().is_empty(),
                    Value::Array(items) => items.is_empty(),
                    _ => false,
                };
                if empty {
                    return Err(AdapterError::invalid(name, "must not be empty"));
                }
            }
            Constraint::PathExists => {
                if let Some(missing) = texts.iter().find(|p| !Path::new(p).exists()) {
                    return Err(AdapterError::PathNotFound {
                        param: name.to_string(),
                        path: missing.to_string(),
                    });
                }
            }
            Constraint::NoLeadingDash => {
                if let Some(bad) = texts.iter().find(|t| t.starts_with('-')) {
                    return Err(AdapterError::invalid(
                        name,
                        format!("'{bad}' must not start with '-'"),
                    ));
                }
            }
            Constraint::Identifier => {
                let ok = |t: &str| {
                    t.chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
                        && t.chars().any(|c| c != '.')
                };
                if let Some(bad) = texts.iter().find(|t| !ok(**t)) {
                    return Err(AdapterError::invalid(
                        name,
                        format!(
                            "'{bad}' must be letters, digits, '.', '_' and '-', not only dots"
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn bound(b: Option<i64>) -> String {
    b.map(|v| v.to_string()).unwrap_or_default()
}
