//! Parameter → command translation.
//!
//! Everything here is pure: the same validated parameters and variables
//! always produce the same [`CommandPlan`]. Temp files are described by
//! their JSON payload and only written by the executor.

use std::collections::BTreeMap;

use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::AdapterError;
use super::spec::{
    Action, BodyTemplate, Builtin, CommandTemplate, Condition, HttpMethod, HttpTemplate, JsonField,
    JsonSource, Segment,
};
use super::validate::{scalar_text, ValidatedParams};

/// A single argv token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanArg {
    Literal(String),
    /// Replaced by the path of a temp file containing this JSON.
    JsonFile(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessStage {
    pub program: String,
    pub args: Vec<PlanArg>,
}

impl ProcessStage {
    fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            match arg {
                PlanArg::Literal(s) => out.push_str(s),
                PlanArg::JsonFile(_) => out.push_str("<json-file>"),
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpRequestPlan {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandPlan {
    Process { stages: Vec<ProcessStage> },
    Http(HttpRequestPlan),
    Builtin { op: Builtin, params: ValidatedParams },
}

impl CommandPlan {
    /// Human-readable form for logs. Never passed to a shell.
    pub fn describe(&self) -> String {
        match self {
            Self::Process { stages } => stages
                .iter()
                .map(ProcessStage::display)
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Http(req) => {
                let method = serde_json::to_value(req.method)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                format!("{method} {}", req.url)
            }
            Self::Builtin { op, .. } => format!("builtin {op:?}"),
        }
    }

    /// The argv of each process stage; JSON files shown as `<json-file>`.
    pub fn argv(&self) -> Vec<Vec<String>> {
        match self {
            Self::Process { stages } => stages
                .iter()
                .map(|stage| {
                    std::iter::once(stage.program.clone())
                        .chain(stage.args.iter().map(|arg| match arg {
                            PlanArg::Literal(s) => s.clone(),
                            PlanArg::JsonFile(_) => "<json-file>".to_string(),
                        }))
                        .collect()
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Build the plan for `action` from validated parameters.
///
/// `vars` are the immutable configuration variables templates may
/// reference as `{var:name}`.
pub fn build_command(
    params: &ValidatedParams,
    action: &Action,
    vars: &BTreeMap<String, String>,
) -> Result<CommandPlan, AdapterError> {
    match action {
        Action::Command(template) => build_process(params, template, vars),
        Action::Http(template) => build_http(params, template, vars).map(CommandPlan::Http),
        Action::Builtin(op) => Ok(CommandPlan::Builtin {
            op: *op,
            params: params.clone(),
        }),
    }
}

fn build_process(
    params: &ValidatedParams,
    template: &CommandTemplate,
    vars: &BTreeMap<String, String>,
) -> Result<CommandPlan, AdapterError> {
    let mut stages = Vec::with_capacity(template.stages.len());
    for stage in &template.stages {
        if let Some(condition) = &stage.when {
            if !holds(condition, params) {
                continue;
            }
        }
        let mut args = Vec::new();
        expand(&stage.segments, params, vars, &mut args)?;
        stages.push(ProcessStage {
            program: stage.program.clone(),
            args,
        });
    }
    Ok(CommandPlan::Process { stages })
}

fn expand(
    segments: &[Segment],
    params: &ValidatedParams,
    vars: &BTreeMap<String, String>,
    out: &mut Vec<PlanArg>,
) -> Result<(), AdapterError> {
    for segment in segments {
        match segment {
            Segment::Literal(token) => out.push(PlanArg::Literal(token.clone())),
            Segment::Param(param) => {
                out.extend(params.tokens(param).into_iter().map(PlanArg::Literal));
            }
            Segment::Flag { param, flag } => {
                if params.flag(param) {
                    out.push(PlanArg::Literal(flag.clone()));
                }
            }
            Segment::Opt { param, flag } => {
                for token in params.tokens(param) {
                    out.push(PlanArg::Literal(flag.clone()));
                    out.push(PlanArg::Literal(token));
                }
            }
            Segment::Joined { param, flag, sep } => {
                let tokens = params.tokens(param);
                if !tokens.is_empty() {
                    if let Some(flag) = flag {
                        out.push(PlanArg::Literal(flag.clone()));
                    }
                    out.push(PlanArg::Literal(tokens.join(sep)));
                }
            }
            Segment::Assign { param, key } => {
                let tokens = params.tokens(param);
                if !tokens.is_empty() {
                    out.push(PlanArg::Literal(format!("{key}={}", tokens.join(","))));
                }
            }
            Segment::Format(template) => {
                if let Some(text) = render(template, params, vars, Placement::Text)? {
                    out.push(PlanArg::Literal(text));
                }
            }
            Segment::Var { name, flag } => {
                let value = lookup_var(vars, name)?;
                if let Some(flag) = flag {
                    out.push(PlanArg::Literal(flag.clone()));
                }
                out.push(PlanArg::Literal(value.to_string()));
            }
            Segment::JsonFile { flag, fields } => {
                out.push(PlanArg::Literal(flag.clone()));
                out.push(PlanArg::JsonFile(build_object(fields, params, vars)?));
            }
            Segment::When {
                condition,
                segments,
            } => {
                if holds(condition, params) {
                    expand(segments, params, vars, out)?;
                }
            }
        }
    }
    Ok(())
}

fn holds(condition: &Condition, params: &ValidatedParams) -> bool {
    match condition {
        Condition::Present(p) => params.is_present(p),
        Condition::Absent(p) => !params.is_present(p),
        Condition::AnyPresent(ps) => ps.iter().any(|p| params.is_present(p)),
        Condition::All(cs) => cs.iter().all(|c| holds(c, params)),
        Condition::Not(c) => !holds(c, params),
    }
}

fn lookup_var<'a>(vars: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str, AdapterError> {
    vars.get(name)
        .map(String::as_str)
        .ok_or_else(|| AdapterError::MissingVar(name.to_string()))
}

/// Where rendered text ends up.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Placement {
    Text,
    /// Inside a URL: a parameter that is only part of the template must
    /// stay one path segment.
    Url,
}

/// Substitute `{param}` and `{var:name}` placeholders.
///
/// Returns `None` when a referenced parameter is absent. List values are
/// joined with `,`. An unmatched `{` is kept literally.
fn render(
    template: &str,
    params: &ValidatedParams,
    vars: &BTreeMap<String, String>,
    placement: Placement,
) -> Result<Option<String>, AdapterError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return Ok(Some(out));
        };
        let key = &after[..close];
        if let Some(var) = key.strip_prefix("var:") {
            out.push_str(lookup_var(vars, var)?);
        } else {
            let tokens = params.tokens(key);
            if tokens.is_empty() {
                return Ok(None);
            }
            let whole = template.len() == key.len() + 2;
            if placement == Placement::Url && !whole {
                for token in &tokens {
                    check_url_segment(key, token)?;
                }
            }
            out.push_str(&tokens.join(","));
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(Some(out))
}

/// A value substituted into part of a URL must stay one path segment:
/// no dot segments, separators or escapes.
fn check_url_segment(param: &str, value: &str) -> Result<(), AdapterError> {
    if value.is_empty() || value.chars().all(|c| c == '.') {
        return Err(AdapterError::invalid(param, format!("'{value}' is not a valid URL path segment")));
    }
    if let Some(c) = value.chars().find(|c| matches!(c, '/' | '\\' | '?' | '#' | '%')) {
        return Err(AdapterError::invalid(param, format!("'{c}' is not allowed in a URL path segment")));
    }
    Ok(())
}

fn build_object(
    fields: &[JsonField],
    params: &ValidatedParams,
    vars: &BTreeMap<String, String>,
) -> Result<Value, AdapterError> {
    let mut object = Map::new();
    for field in fields {
        let value = match &field.source {
            JsonSource::Param(p) => params.get(p).cloned(),
            JsonSource::ParamOr(p, fallback) => params.get(p).or_else(|| params.get(fallback)).cloned(),
            JsonSource::Var(name) => Some(Value::String(lookup_var(vars, name)?.to_string())),
            JsonSource::Literal(v) => Some(v.clone()),
            JsonSource::Zip(columns) => zip_objects(columns, params)?,
        };
        if let Some(value) = value {
            object.insert(field.key.clone(), value);
        }
    }
    Ok(Value::Object(object))
}

/// `[(key, param)]` → `[{key: value, ...}, ...]`, broadcasting single
/// values. Lists of any other differing length are rejected.
fn zip_objects(
    columns: &[(String, String)],
    params: &ValidatedParams,
) -> Result<Option<Value>, AdapterError> {
    let mut values: Vec<(&str, &str, Vec<Value>)> = Vec::with_capacity(columns.len());
    for (key, param) in columns {
        let column = match params.get(param) {
            None => return Ok(None),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        };
        values.push((key.as_str(), param.as_str(), column));
    }

    let rows = values.iter().map(|(_, _, c)| c.len()).max().unwrap_or(0);
    for (_, param, column) in &values {
        if column.len() != 1 && column.len() != rows {
            return Err(AdapterError::invalid(
                *param,
                format!("expected 1 or {rows} values, got {}", column.len()),
            ));
        }
    }

    let objects = (0..rows)
        .map(|i| {
            let row: Map<String, Value> = values
                .iter()
                .map(|(key, _, column)| {
                    let cell = if column.len() == 1 { &column[0] } else { &column[i] };
                    (key.to_string(), cell.clone())
                })
                .collect();
            Value::Object(row)
        })
        .collect();
    Ok(Some(Value::Array(objects)))
}

fn build_http(
    params: &ValidatedParams,
    template: &HttpTemplate,
    vars: &BTreeMap<String, String>,
) -> Result<HttpRequestPlan, AdapterError> {
    let rendered = render(&template.url, params, vars, Placement::Url)?
        .ok_or_else(|| AdapterError::invalid("url", "URL template references an absent parameter"))?;
    let mut url = Url::parse(&rendered)
        .map_err(|e| AdapterError::invalid("url", format!("'{rendered}' is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AdapterError::invalid(
            "url",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if let Some(param) = &template.query_param {
        let pairs = sorted_pairs(params.get(param));
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (k, v) in &pairs {
                query.append_pair(k, v);
            }
        }
    }

    let mut headers = Vec::new();
    for (name, value) in &template.headers {
        if let Some(value) = render(value, params, vars, Placement::Text)? {
            headers.push((name.clone(), value));
        }
    }
    if let Some(param) = &template.header_param {
        headers.extend(sorted_pairs(params.get(param)));
    }

    let body = match &template.body {
        None => None,
        Some(BodyTemplate::Param(p)) => params.get(p).cloned(),
        Some(BodyTemplate::Fields(fields)) => Some(build_object(fields, params, vars)?),
    };

    Ok(HttpRequestPlan {
        method: template.method,
        url: url.to_string(),
        headers,
        body,
    })
}

fn sorted_pairs(value: Option<&Value>) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = match value {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), scalar_text(v))).collect(),
        _ => Vec::new(),
    };
    pairs.sort();
    pairs
}
