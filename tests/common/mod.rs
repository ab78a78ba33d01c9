//! Launchers that never touch the OS: they record every call and replay
//! canned outputs in order.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mcp_toolbox_server::adapter::{
    AdapterError, ExecLimits, HttpRequestPlan, Launcher, RawOutput, ResolvedCommand,
};
use mcp_toolbox_server::config::ServerConfig;
use mcp_toolbox_server::registry::ToolRegistry;
use mcp_toolbox_server::toolbox::Toolbox;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ProcessCall {
    pub command: ResolvedCommand,
    pub stdin: Option<Vec<u8>>,
    /// JSON temp files named on the command line, read at launch time.
    pub json_files: Vec<(PathBuf, Value)>,
}

#[derive(Default)]
pub struct RecordingLauncher {
    pub processes: Mutex<Vec<ProcessCall>>,
    pub requests: Mutex<Vec<HttpRequestPlan>>,
    replies: Mutex<VecDeque<Result<RawOutput, AdapterError>>>,
}

impl RecordingLauncher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the result of the next launch.
    pub fn reply(&self, reply: Result<RawOutput, AdapterError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn reply_process(&self, code: i32, stdout: &str, stderr: &str) {
        self.reply(Ok(process(code, stdout, stderr)));
    }

    pub fn process_calls(&self) -> Vec<ProcessCall> {
        self.processes.lock().unwrap().clone()
    }

    pub fn http_calls(&self) -> Vec<HttpRequestPlan> {
        self.requests.lock().unwrap().clone()
    }

    pub fn launches(&self) -> usize {
        self.processes.lock().unwrap().len() + self.requests.lock().unwrap().len()
    }

    fn next(&self) -> Result<RawOutput, AdapterError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(process(0, "", "")))
    }
}

pub fn process(code: i32, stdout: &str, stderr: &str) -> RawOutput {
    RawOutput::Process {
        code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        truncated: false,
    }
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn run_process(
        &self,
        command: &ResolvedCommand,
        stdin: Option<Vec<u8>>,
        _env: &BTreeMap<String, String>,
        _limits: &ExecLimits,
    ) -> Result<RawOutput, AdapterError> {
        let json_files = command
            .args
            .iter()
            .filter(|a| a.ends_with(".json"))
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .map(|p| {
                let text = std::fs::read_to_string(&p).unwrap();
                (p, serde_json::from_str(&text).unwrap())
            })
            .collect();
        self.processes.lock().unwrap().push(ProcessCall {
            command: command.clone(),
            stdin,
            json_files,
        });
        self.next()
    }

    async fn send_http(
        &self,
        request: &HttpRequestPlan,
        _limits: &ExecLimits,
    ) -> Result<RawOutput, AdapterError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next()
    }
}

/// Toolbox with the given catalogs and a recording launcher.
pub fn toolbox_with(catalogs: &[&str], config: ServerConfig) -> (Toolbox, Arc<RecordingLauncher>) {
    let launcher = RecordingLauncher::new();
    let config = ServerConfig {
        catalogs: Some(catalogs.iter().map(|c| c.to_string()).collect()),
        ..config
    };
    let toolbox = Toolbox::with_launcher(config, launcher.clone()).unwrap();
    (toolbox, launcher)
}

/// Toolbox serving exactly `registry`.
pub fn toolbox_from(registry: ToolRegistry, config: ServerConfig) -> (Toolbox, Arc<RecordingLauncher>) {
    let launcher = RecordingLauncher::new();
    let toolbox = Toolbox::from_parts(config, registry, launcher.clone());
    (toolbox, launcher)
}
