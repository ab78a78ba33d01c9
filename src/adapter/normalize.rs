use serde_json::{Map, Value};

use super::error::AdapterError;
use super::execute::RawOutput;
use super::spec::{OutputFormat, SuccessPolicy};

const TRUNCATED_MARKER: &str = "[output truncated]";

/// Classify `raw` against `policy` and shape successful output per `format`.
///
/// HTTP successes become `{status, body}`; the body goes through the same
/// output format as process stdout.
pub fn normalize(
    raw: RawOutput,
    policy: &SuccessPolicy,
    format: &OutputFormat,
) -> Result<Value, AdapterError> {
    match raw {
        RawOutput::Value(value) => Ok(value),
        RawOutput::Process {
            code,
            stdout,
            stderr,
            truncated,
        } => {
            if !policy.accepts_exit(code) {
                return Err(process_failure(code, &stdout, stderr));
            }
            parse_output(&stdout, format, truncated)
        }
        RawOutput::Http {
            status,
            reason,
            body,
            truncated,
        } => {
            if !policy.accepts_status(status) {
                let message = format!("HTTP {status} {reason}").trim_end().to_string();
                return Err(AdapterError::Execution {
                    message,
                    raw_stderr: Some(body).filter(|b| !b.trim().is_empty()),
                });
            }
            let body = parse_output(&body, format, truncated)?;
            Ok(serde_json::json!({ "status": status, "body": body }))
        }
    }
}

/// The message is the trimmed stderr, falling back to stdout (some tools
/// report errors there) and then to the exit status. The untrimmed stderr
/// is kept only when it says more than the message.
fn process_failure(code: i32, stdout: &str, stderr: String) -> AdapterError {
    let message = [stderr.trim(), stdout.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("command exited with status {code}"));
    let raw_stderr = Some(stderr).filter(|s| !s.trim().is_empty() && s.trim() != message);
    AdapterError::Execution {
        message,
        raw_stderr,
    }
}

fn parse_output(text: &str, format: &OutputFormat, truncated: bool) -> Result<Value, AdapterError> {
    match format {
        OutputFormat::Text => {
            let mut out = text.trim_end_matches(['\r', '\n']).to_string();
            if truncated {
                out.push('\n');
                out.push_str(TRUNCATED_MARKER);
            }
            Ok(Value::String(out))
        }
        OutputFormat::Lines => {
            let mut lines: Vec<Value> = non_empty_lines(text).map(Value::from).collect();
            if truncated {
                lines.push(Value::from(TRUNCATED_MARKER));
            }
            Ok(Value::Array(lines))
        }
        OutputFormat::Json => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(trimmed).map_err(|e| AdapterError::Parse(format!("expected JSON: {e}")))
        }
        OutputFormat::JsonLines => non_empty_lines(text)
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| {
                    AdapterError::Parse(format!("line {} is not JSON: {e}", i + 1))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        OutputFormat::Auto => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            Ok(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(text.to_string())))
        }
        OutputFormat::KeyValue { sep } => {
            let mut object = Map::new();
            for line in non_empty_lines(text) {
                if let Some((key, value)) = line.split_once(*sep) {
                    let key = key.trim();
                    if !key.is_empty() {
                        object.insert(key.to_string(), Value::from(value.trim()));
                    }
                }
            }
            Ok(Value::Object(object))
        }
        OutputFormat::Fields { seps, names } => {
            let rows = non_empty_lines(text)
                .filter_map(|line| split_fields(line, seps, names.len()))
                .map(|parts| {
                    let row: Map<String, Value> = names
                        .iter()
                        .zip(parts)
                        .map(|(name, part)| (name.clone(), Value::from(part)))
                        .collect();
                    Value::Object(row)
                })
                .collect();
            Ok(Value::Array(rows))
        }
    }
}

fn split_fields<'a>(line: &'a str, seps: &[char], count: usize) -> Option<Vec<&'a str>> {
    if count == 0 {
        return None;
    }
    let mut parts = Vec::with_capacity(count);
    let mut rest = line;
    for sep in seps.iter().take(count - 1) {
        let (field, tail) = rest.split_once(*sep)?;
        parts.push(field);
        rest = tail;
    }
    parts.push(rest);
    (parts.len() == count).then_some(parts)
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorKind;
    use serde_json::json;

    fn process(code: i32, stdout: &str, stderr: &str) -> RawOutput {
        RawOutput::Process {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            truncated: false,
        }
    }

    #[test]
    fn stderr_becomes_the_message() {
        let err = normalize(
            process(1, "", "device not found\n"),
            &SuccessPolicy::default(),
            &OutputFormat::Text,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert_eq!(err.to_string(), "device not found");
        assert!(matches!(err, AdapterError::Execution { raw_stderr: None, .. }));
    }

    #[test]
    fn silent_failure_reports_exit_status() {
        let err = normalize(process(3, "", ""), &SuccessPolicy::default(), &OutputFormat::Text)
            .unwrap_err();
        assert_eq!(err.to_string(), "command exited with status 3");
    }

    #[test]
    fn extra_success_codes_are_honoured() {
        let policy = SuccessPolicy {
            exit_codes: [0, 1].into(),
            http_statuses: None,
        };
        let data = normalize(process(1, "", ""), &policy, &OutputFormat::Lines).unwrap();
        assert_eq!(data, json!([]));
    }

    #[test]
    fn key_value_and_fields() {
        let data = normalize(
            process(0, "Name        : bash\nVersion     : 5.2\n\nnoise\n", ""),
            &SuccessPolicy::default(),
            &OutputFormat::KeyValue { sep: ':' },
        )
        .unwrap();
        assert_eq!(data, json!({"Name": "bash", "Version": "5.2"}));

        let data = normalize(
            process(0, "src/a.rs:3:let x = 1;\nbroken\n", ""),
            &SuccessPolicy::default(),
            &OutputFormat::fields(':', &["path", "line", "text"]),
        )
        .unwrap();
        assert_eq!(data, json!([{"path": "src/a.rs", "line": "3", "text": "let x = 1;"}]));
    }

    #[test]
    fn per_field_separators_keep_colons_in_paths() {
        let data = normalize(
            process(0, "logs/12:30.txt\012:error: disk full\nno-separator\n", ""),
            &SuccessPolicy::default(),
            &OutputFormat::delimited(&['\0', ':'], &["file", "line", "content"]),
        )
        .unwrap();
        assert_eq!(
            data,
            json!([{"file": "logs/12:30.txt", "line": "12", "content": "error: disk full"}])
        );
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let err = normalize(process(0, "{nope", ""), &SuccessPolicy::default(), &OutputFormat::Json)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn truncated_text_is_marked() {
        let raw = RawOutput::Process {
            code: 0,
            stdout: "abc".into(),
            stderr: String::new(),
            truncated: true,
        };
        let data = normalize(raw, &SuccessPolicy::default(), &OutputFormat::Text).unwrap();
        assert_eq!(data, json!("abc\n[output truncated]"));
    }

    #[test]
    fn http_error_keeps_body() {
        let raw = RawOutput::Http {
            status: 404,
            reason: "Not Found".into(),
            body: "{\"message\":\"missing\"}".into(),
            truncated: false,
        };
        let err = normalize(raw, &SuccessPolicy::default(), &OutputFormat::Auto).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404 Not Found");
        assert!(
            matches!(err, AdapterError::Execution { raw_stderr: Some(ref b), .. } if b.contains("missing"))
        );
    }
}
