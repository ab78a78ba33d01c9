//! Running command plans.
//!
//! The [`Launcher`] trait is the only place that touches the OS or the
//! network. [`SystemLauncher`] is the real one; tests substitute canned or
//! recording launchers.

use std::collections::BTreeMap;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::Instant;

use super::error::AdapterError;
use super::plan::{HttpRequestPlan, PlanArg, ProcessStage};
use super::spec::HttpMethod;

/// Captured result of an external call, before success classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Process {
        code: i32,
        stdout: String,
        stderr: String,
        truncated: bool,
    },
    Http {
        status: u16,
        reason: String,
        body: String,
        truncated: bool,
    },
    /// Structured data produced in-process by a builtin.
    Value(Value),
}

/// A process stage with temp files already written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Bounds applied to one invocation.
#[derive(Debug, Clone, Copy)]
pub struct ExecLimits {
    pub timeout: Duration,
    pub deadline: Instant,
    pub max_output_bytes: usize,
}

impl ExecLimits {
    /// Limits whose deadline starts now.
    pub fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            deadline: Instant::now() + timeout,
            max_output_bytes,
        }
    }

    fn timeout_error(&self) -> AdapterError {
        AdapterError::Timeout {
            timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[async_trait]
pub trait Launcher: Send + Sync {
    /// Run one process to completion or until `limits.deadline`.
    ///
    /// On expiry the process must be killed and reaped before returning
    /// [`AdapterError::Timeout`].
    async fn run_process(
        &self,
        command: &ResolvedCommand,
        stdin: Option<Vec<u8>>,
        env: &BTreeMap<String, String>,
        limits: &ExecLimits,
    ) -> Result<RawOutput, AdapterError>;

    async fn send_http(
        &self,
        request: &HttpRequestPlan,
        limits: &ExecLimits,
    ) -> Result<RawOutput, AdapterError>;
}

/// Temp files live exactly as long as this value.
struct MaterializedStage {
    command: ResolvedCommand,
    _files: Vec<NamedTempFile>,
}

fn materialize(stage: &ProcessStage) -> Result<MaterializedStage, AdapterError> {
    let mut args = Vec::with_capacity(stage.args.len());
    let mut files = Vec::new();
    for arg in &stage.args {
        match arg {
            PlanArg::Literal(token) => args.push(token.clone()),
            PlanArg::JsonFile(payload) => {
                let mut file = tempfile::Builder::new()
                    .prefix("mcp-toolbox-")
                    .suffix(".json")
                    .tempfile()
                    .map_err(AdapterError::TempFile)?;
                serde_json::to_writer_pretty(&mut file, payload)
                    .map_err(|e| AdapterError::TempFile(e.into()))?;
                file.flush().map_err(AdapterError::TempFile)?;
                args.push(file.path().to_string_lossy().into_owned());
                files.push(file);
            }
        }
    }
    Ok(MaterializedStage {
        command: ResolvedCommand {
            program: stage.program.clone(),
            args,
        },
        _files: files,
    })
}

/// Run pipeline stages in order, feeding each stage's stdout to the next.
///
/// Every stage but the last must exit 0; the last stage's raw output is
/// returned for the tool's own success policy to judge.
pub async fn run_pipeline(
    stages: &[ProcessStage],
    launcher: &dyn Launcher,
    env: &BTreeMap<String, String>,
    limits: &ExecLimits,
) -> Result<RawOutput, AdapterError> {
    let mut input: Option<Vec<u8>> = None;
    for (index, stage) in stages.iter().enumerate() {
        let materialized = materialize(stage)?;
        let output = launcher
            .run_process(&materialized.command, input.take(), env, limits)
            .await?;
        drop(materialized);

        if index + 1 == stages.len() {
            return Ok(output);
        }
        match output {
            RawOutput::Process { code: 0, stdout, .. } => input = Some(stdout.into_bytes()),
            RawOutput::Process { code, stderr, .. } => {
                let detail = stderr.trim();
                return Err(AdapterError::Execution {
                    message: if detail.is_empty() {
                        format!("'{}' exited with status {code}", stage.program)
                    } else {
                        detail.to_string()
                    },
                    raw_stderr: None,
                });
            }
            other => return Ok(other),
        }
    }
    Err(AdapterError::Execution {
        message: "command plan has no stages".into(),
        raw_stderr: None,
    })
}

/// Spawns real processes (no shell) and performs real HTTP calls.
pub struct SystemLauncher {
    http: reqwest::Client,
}

impl SystemLauncher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Launcher for SystemLauncher {
    async fn run_process(
        &self,
        command: &ResolvedCommand,
        stdin: Option<Vec<u8>>,
        env: &BTreeMap<String, String>,
        limits: &ExecLimits,
    ) -> Result<RawOutput, AdapterError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(env)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AdapterError::DependencyMissing {
                    program: command.program.clone(),
                }
            } else {
                AdapterError::Launch {
                    program: command.program.clone(),
                    source,
                }
            }
        })?;
        let group = ProcessGroup { pgid: child.id() };

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            tokio::spawn(async move {
                // The child may exit without reading; a broken pipe is fine.
                let _ = pipe.write_all(&input).await;
            });
        }

        let cap = limits.max_output_bytes;
        let mut stdout_task = tokio::spawn(read_capped(child.stdout.take(), cap));
        let mut stderr_task = tokio::spawn(read_capped(child.stderr.take(), cap));

        let status = match tokio::time::timeout_at(limits.deadline, child.wait()).await {
            Ok(status) => status.map_err(|source| AdapterError::Launch {
                program: command.program.clone(),
                source,
            })?,
            Err(_) => {
                group.kill();
                if let Err(e) = child.kill().await {
                    tracing::warn!(program = %command.program, "failed to kill timed out process: {e}");
                }
                stdout_task.abort();
                stderr_task.abort();
                return Err(limits.timeout_error());
            }
        };

        // A background grandchild can hold the pipes open past exit.
        let drained = tokio::time::timeout_at(limits.deadline, async {
            let out = (&mut stdout_task).await.unwrap_or_default();
            let err = (&mut stderr_task).await.unwrap_or_default();
            (out, err)
        })
        .await;
        let ((stdout, out_truncated), (stderr, err_truncated)) = match drained {
            Ok(captured) => captured,
            Err(_) => {
                group.kill();
                stdout_task.abort();
                stderr_task.abort();
                return Err(limits.timeout_error());
            }
        };

        Ok(RawOutput::Process {
            code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            truncated: out_truncated || err_truncated,
        })
    }

    async fn send_http(
        &self,
        request: &HttpRequestPlan,
        limits: &ExecLimits,
    ) -> Result<RawOutput, AdapterError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };
        let remaining = limits.deadline.saturating_duration_since(Instant::now());

        let mut builder = self.http.request(method, &request.url).timeout(remaining);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| http_error(e, limits))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| http_error(e, limits))?;
        let truncated = bytes.len() > limits.max_output_bytes;
        let kept = &bytes[..bytes.len().min(limits.max_output_bytes)];

        Ok(RawOutput::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: String::from_utf8_lossy(kept).into_owned(),
            truncated,
        })
    }
}

fn http_error(err: reqwest::Error, limits: &ExecLimits) -> AdapterError {
    if err.is_timeout() {
        limits.timeout_error()
    } else if err.is_builder() {
        AdapterError::invalid("request", err.to_string())
    } else {
        AdapterError::Execution {
            message: format!("HTTP request failed: {err}"),
            raw_stderr: None,
        }
    }
}

/// The process group a stage runs in. Everything left in it is killed
/// when the stage is done, so nothing the program forked outlives the call.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn kill(&self) {
        if let Some(pgid) = self.pgid {
            kill_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal. An empty group yields ESRCH,
    // which is the normal case once every member has exited.
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// Drain `reader` to EOF, keeping at most `cap` bytes.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> (Vec<u8>, bool)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return (Vec::new(), false);
    };
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = cap.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
                if n > room {
                    truncated = true;
                }
            }
        }
    }
    (kept, truncated)
}
