//! Declarative tool descriptions.
//!
//! A [`ToolSpec`] is pure data: parameter declarations, a command or HTTP
//! template, and the success/output conventions of the wrapped program.
//! Catalogs build these once at startup and never mutate them.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Semantic type of a parameter. Validation coerces incoming JSON to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    Enum(Vec<String>),
    /// A list of strings. A single scalar is accepted as a one-element list.
    StringList,
    /// An arbitrary JSON object (headers, request bodies).
    Object,
}

impl ParamType {
    pub fn one_of(values: &[&str]) -> Self {
        Self::Enum(values.iter().map(|v| v.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Inclusive integer bounds.
    Range { min: Option<i64>, max: Option<i64> },
    /// Strings and lists must not be empty.
    NonEmpty,
    /// The value names a path that must exist. Failing this is `NotFound`.
    PathExists,
    /// Rejects values starting with `-` so they cannot be read as options.
    NoLeadingDash,
    /// ASCII letters, digits, `.`, `_`, `-` only, and not just dots, so the
    /// value is one URL path segment.
    Identifier,
}

impl Constraint {
    pub fn range(min: i64, max: i64) -> Self {
        Self::Range {
            min: Some(min),
            max: Some(max),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub kind: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    pub constraints: Vec<Constraint>,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            required: true,
            default: None,
            constraints: Vec::new(),
        }
    }

    pub fn optional(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Value applied when the caller omits the parameter.
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn schema(&self) -> Value {
        let mut prop = Map::new();
        match &self.kind {
            ParamType::String => {
                prop.insert("type".into(), json!("string"));
            }
            ParamType::Integer => {
                prop.insert("type".into(), json!("integer"));
            }
            ParamType::Boolean => {
                prop.insert("type".into(), json!("boolean"));
            }
            ParamType::Enum(values) => {
                prop.insert("type".into(), json!("string"));
                prop.insert("enum".into(), json!(values));
            }
            ParamType::StringList => {
                prop.insert("type".into(), json!("array"));
                prop.insert("items".into(), json!({ "type": "string" }));
            }
            ParamType::Object => {
                prop.insert("type".into(), json!("object"));
            }
        }
        prop.insert("description".into(), json!(self.description));
        for constraint in &self.constraints {
            if let Constraint::Range { min, max } = constraint {
                if let Some(min) = min {
                    prop.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    prop.insert("maximum".into(), json!(max));
                }
            }
        }
        if let Some(default) = &self.default {
            prop.insert("default".into(), default.clone());
        }
        Value::Object(prop)
    }
}

/// Predicate over validated parameters, used to gate template pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Present(String),
    Absent(String),
    AnyPresent(Vec<String>),
    All(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn present(param: &str) -> Self {
        Self::Present(param.to_string())
    }

    pub fn absent(param: &str) -> Self {
        Self::Absent(param.to_string())
    }

    pub fn any_present(params: &[&str]) -> Self {
        Self::AnyPresent(params.iter().map(|p| p.to_string()).collect())
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }
}

/// Where a JSON payload field gets its value.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonSource {
    /// Field omitted when the parameter is absent.
    Param(String),
    /// First parameter, else the second one.
    ParamOr(String, String),
    /// A configuration variable; missing is an error.
    Var(String),
    Literal(Value),
    /// Zips list parameters into an array of objects. Single values are
    /// broadcast; the field is omitted unless every parameter is present.
    Zip(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonField {
    pub key: String,
    pub source: JsonSource,
}

impl JsonField {
    pub fn param(key: &str, param: &str) -> Self {
        Self {
            key: key.to_string(),
            source: JsonSource::Param(param.to_string()),
        }
    }

    pub fn param_or(key: &str, param: &str, fallback: &str) -> Self {
        Self {
            key: key.to_string(),
            source: JsonSource::ParamOr(param.to_string(), fallback.to_string()),
        }
    }

    pub fn var(key: &str, var: &str) -> Self {
        Self {
            key: key.to_string(),
            source: JsonSource::Var(var.to_string()),
        }
    }

    pub fn literal(key: &str, value: Value) -> Self {
        Self {
            key: key.to_string(),
            source: JsonSource::Literal(value),
        }
    }

    pub fn zip(key: &str, fields: &[(&str, &str)]) -> Self {
        Self {
            key: key.to_string(),
            source: JsonSource::Zip(
                fields
                    .iter()
                    .map(|(k, p)| (k.to_string(), p.to_string()))
                    .collect(),
            ),
        }
    }
}

/// One piece of an argv template. Segments expand in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    /// The parameter's value as positional token(s); nothing when absent.
    Param(String),
    /// `flag` when the boolean parameter is true.
    Flag { param: String, flag: String },
    /// `flag value` per value token; nothing when absent.
    Opt { param: String, flag: String },
    /// List values joined into one token, optionally after `flag`.
    Joined {
        param: String,
        flag: Option<String>,
        sep: String,
    },
    /// `key=value` (list values joined with `,`).
    Assign { param: String, key: String },
    /// `{param}` / `{var:name}` placeholders; skipped if a param is absent.
    Format(String),
    /// Configuration variable, optionally preceded by `flag`.
    Var { name: String, flag: Option<String> },
    /// `flag <path>` where `<path>` is a temp file holding the JSON object.
    JsonFile { flag: String, fields: Vec<JsonField> },
    When {
        condition: Condition,
        segments: Vec<Segment>,
    },
}

impl Segment {
    pub fn literal(token: &str) -> Self {
        Self::Literal(token.to_string())
    }

    pub fn param(param: &str) -> Self {
        Self::Param(param.to_string())
    }

    pub fn flag(param: &str, flag: &str) -> Self {
        Self::Flag {
            param: param.to_string(),
            flag: flag.to_string(),
        }
    }

    pub fn opt(param: &str, flag: &str) -> Self {
        Self::Opt {
            param: param.to_string(),
            flag: flag.to_string(),
        }
    }

    pub fn joined(param: &str, flag: Option<&str>, sep: &str) -> Self {
        Self::Joined {
            param: param.to_string(),
            flag: flag.map(str::to_string),
            sep: sep.to_string(),
        }
    }

    pub fn assign(param: &str, key: &str) -> Self {
        Self::Assign {
            param: param.to_string(),
            key: key.to_string(),
        }
    }

    pub fn format(template: &str) -> Self {
        Self::Format(template.to_string())
    }

    pub fn json_file(flag: &str, fields: Vec<JsonField>) -> Self {
        Self::JsonFile {
            flag: flag.to_string(),
            fields,
        }
    }

    pub fn when(condition: Condition, segments: Vec<Segment>) -> Self {
        Self::When {
            condition,
            segments,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageTemplate {
    /// Stage runs only when this holds. The first stage is unconditional.
    pub when: Option<Condition>,
    pub program: String,
    pub segments: Vec<Segment>,
}

/// A pipeline of argv templates. Stage N's stdout feeds stage N+1's stdin;
/// no shell is involved.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    pub stages: Vec<StageTemplate>,
}

impl CommandTemplate {
    pub fn new(program: &str) -> Self {
        Self {
            stages: vec![StageTemplate {
                when: None,
                program: program.to_string(),
                segments: Vec::new(),
            }],
        }
    }

    /// Append a segment to the last stage.
    pub fn arg(mut self, segment: Segment) -> Self {
        if let Some(stage) = self.stages.last_mut() {
            stage.segments.push(segment);
        }
        self
    }

    pub fn literals(self, tokens: &[&str]) -> Self {
        tokens
            .iter()
            .fold(self, |template, token| template.arg(Segment::literal(token)))
    }

    /// Start a new stage that runs only when `condition` holds.
    pub fn pipe_when(mut self, condition: Condition, program: &str) -> Self {
        self.stages.push(StageTemplate {
            when: Some(condition),
            program: program.to_string(),
            segments: Vec::new(),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyTemplate {
    /// The whole body is an object parameter.
    Param(String),
    Fields(Vec<JsonField>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpTemplate {
    pub method: HttpMethod,
    /// `{param}` and `{var:name}` placeholders.
    pub url: String,
    /// Object parameter appended as query pairs.
    pub query_param: Option<String>,
    /// Static headers; values may hold placeholders.
    pub headers: Vec<(String, String)>,
    /// Object parameter holding extra headers.
    pub header_param: Option<String>,
    pub body: Option<BodyTemplate>,
}

impl HttpTemplate {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            query_param: None,
            headers: Vec::new(),
            header_param: None,
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query_from(mut self, param: &str) -> Self {
        self.query_param = Some(param.to_string());
        self
    }

    pub fn headers_from(mut self, param: &str) -> Self {
        self.header_param = Some(param.to_string());
        self
    }

    pub fn body(mut self, body: BodyTemplate) -> Self {
        self.body = Some(body);
        self
    }
}

/// Operations served in-process instead of by an external program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    Health,
    StartSession,
    AttachSession,
    StopSession,
    ListSessions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Command(CommandTemplate),
    Http(HttpTemplate),
    Builtin(Builtin),
}

/// What counts as success for the wrapped program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessPolicy {
    pub exit_codes: BTreeSet<i32>,
    /// `None` means any 2xx.
    pub http_statuses: Option<BTreeSet<u16>>,
}

impl Default for SuccessPolicy {
    fn default() -> Self {
        Self {
            exit_codes: BTreeSet::from([0]),
            http_statuses: None,
        }
    }
}

impl SuccessPolicy {
    pub fn accepts_exit(&self, code: i32) -> bool {
        self.exit_codes.contains(&code)
    }

    pub fn accepts_status(&self, status: u16) -> bool {
        match &self.http_statuses {
            Some(statuses) => statuses.contains(&status),
            None => (200..300).contains(&status),
        }
    }
}

/// How successful stdout (or HTTP body) becomes `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// The text without trailing newlines.
    Text,
    /// Array of non-empty lines.
    Lines,
    Json,
    /// One JSON document per non-empty line.
    JsonLines,
    /// JSON when it parses, text otherwise.
    Auto,
    /// `key<sep>value` lines into an object; other lines are skipped.
    KeyValue { sep: char },
    /// Each line split into `names.len()` fields. Field `i` ends at the
    /// first `seps[i]` after it starts; the last field takes the rest.
    /// Lines with too few separators are skipped.
    Fields { seps: Vec<char>, names: Vec<String> },
}

impl OutputFormat {
    /// Fields all separated by `sep`.
    pub fn fields(sep: char, names: &[&str]) -> Self {
        Self::delimited(&vec![sep; names.len().saturating_sub(1)], names)
    }

    /// Fields with a separator of their own, e.g. `['\0', ':']` for
    /// `rg --null` output where paths may contain `:`.
    pub fn delimited(seps: &[char], names: &[&str]) -> Self {
        Self::Fields {
            seps: seps.to_vec(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub action: Action,
    pub success: SuccessPolicy,
    pub output: OutputFormat,
    /// Overrides the server-wide tool timeout.
    pub timeout: Option<Duration>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str, action: Action) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params: Vec::new(),
            action,
            success: SuccessPolicy::default(),
            output: OutputFormat::Text,
            timeout: None,
        }
    }

    pub fn command(name: &str, description: &str, template: CommandTemplate) -> Self {
        Self::new(name, description, Action::Command(template))
    }

    pub fn http(name: &str, description: &str, template: HttpTemplate) -> Self {
        Self::new(name, description, Action::Http(template)).output(OutputFormat::Auto)
    }

    pub fn builtin(name: &str, description: &str, op: Builtin) -> Self {
        Self::new(name, description, Action::Builtin(op))
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn success_exit_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.success.exit_codes = codes.into_iter().collect();
        self
    }

    pub fn success_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.success.http_statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn output(mut self, format: OutputFormat) -> Self {
        self.output = format;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn param_spec(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema advertised in `tools/list`.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }
}
