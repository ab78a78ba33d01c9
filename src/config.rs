use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default timeout for tool operations (30 seconds).
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;
const DEFAULT_MAX_SESSIONS: usize = 5;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
const DEFAULT_GITEE_API_BASE: &str = "https://gitee.com/api/v5";

const ENV_CONFIG: &str = "TOOLBOX_CONFIG";
const ENV_TOOL_TIMEOUT: &str = "TOOLBOX_TOOL_TIMEOUT_SECS";
const ENV_MAX_OUTPUT: &str = "TOOLBOX_MAX_OUTPUT_BYTES";
const ENV_CATALOGS: &str = "TOOLBOX_CATALOGS";
const ENV_MAX_SESSIONS: &str = "TOOLBOX_MAX_SESSIONS";
const ENV_SESSION_TTL: &str = "TOOLBOX_SESSION_TTL_SECS";
const ENV_GITEE_TOKEN: &str = "GITEE_PERSONAL_ACCESS_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{name} must be a positive integer, got '{value}'")]
    NotPositive { name: String, value: String },
}

/// Server configuration, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tool_timeout: Duration,
    pub max_output_bytes: usize,
    /// Catalogs to register; `None` means all of them.
    pub catalogs: Option<Vec<String>>,
    pub max_sessions: usize,
    pub session_ttl: Duration,
    /// Named values templates reference as `{var:name}`.
    pub vars: BTreeMap<String, String>,
    /// Extra environment for child processes.
    pub env: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            catalogs: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            vars: BTreeMap::from([(
                "gitee_api_base".to_string(),
                DEFAULT_GITEE_API_BASE.to_string(),
            )]),
            env: BTreeMap::new(),
        }
    }
}

/// On-disk TOML form. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    tool_timeout_secs: Option<u64>,
    max_output_bytes: Option<usize>,
    catalogs: Option<Vec<String>>,
    max_sessions: Option<usize>,
    session_ttl_secs: Option<u64>,
    #[serde(default)]
    vars: BTreeMap<String, String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

impl SettingsFile {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// - `TOOLBOX_CONFIG` (optional) — TOML settings file
    /// - `TOOLBOX_TOOL_TIMEOUT_SECS` (optional, default 30) — max seconds per tool call
    /// - `TOOLBOX_MAX_OUTPUT_BYTES` (optional, default 1 MiB) — per-stream capture limit
    /// - `TOOLBOX_CATALOGS` (optional) — comma-separated catalogs to enable
    /// - `TOOLBOX_MAX_SESSIONS`, `TOOLBOX_SESSION_TTL_SECS` — session registry bounds
    /// - `GITEE_PERSONAL_ACCESS_TOKEN` (optional) — exposed as the `gitee_token` var
    ///
    /// Environment values override the file, which overrides defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_CONFIG).filter(|p| !p.trim().is_empty()) {
            config.apply_file(SettingsFile::load(Path::new(&path))?)?;
        }

        if let Some(value) = lookup(ENV_TOOL_TIMEOUT) {
            config.tool_timeout = Duration::from_secs(positive(ENV_TOOL_TIMEOUT, &value)?);
        }
        if let Some(value) = lookup(ENV_MAX_OUTPUT) {
            config.max_output_bytes = positive(ENV_MAX_OUTPUT, &value)? as usize;
        }
        if let Some(value) = lookup(ENV_CATALOGS) {
            config.catalogs = Some(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(value) = lookup(ENV_MAX_SESSIONS) {
            config.max_sessions = positive(ENV_MAX_SESSIONS, &value)? as usize;
        }
        if let Some(value) = lookup(ENV_SESSION_TTL) {
            config.session_ttl = Duration::from_secs(positive(ENV_SESSION_TTL, &value)?);
        }
        if let Some(token) = lookup(ENV_GITEE_TOKEN).filter(|t| !t.is_empty()) {
            config.vars.insert("gitee_token".to_string(), token);
        }

        Ok(config)
    }

    fn apply_file(&mut self, file: SettingsFile) -> Result<(), ConfigError> {
        if let Some(secs) = file.tool_timeout_secs {
            self.tool_timeout = Duration::from_secs(nonzero("tool_timeout_secs", secs)?);
        }
        if let Some(bytes) = file.max_output_bytes {
            self.max_output_bytes = nonzero("max_output_bytes", bytes as u64)? as usize;
        }
        if let Some(catalogs) = file.catalogs {
            self.catalogs = Some(catalogs);
        }
        if let Some(max) = file.max_sessions {
            self.max_sessions = nonzero("max_sessions", max as u64)? as usize;
        }
        if let Some(secs) = file.session_ttl_secs {
            self.session_ttl = Duration::from_secs(nonzero("session_ttl_secs", secs)?);
        }
        self.vars.extend(file.vars);
        self.env.extend(file.env);
        Ok(())
    }
}

fn positive(name: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::NotPositive {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

fn nonzero(name: &str, value: u64) -> Result<u64, ConfigError> {
    positive(name, &value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.tool_timeout, Duration::from_secs(30));
        assert_eq!(config.max_output_bytes, 1024 * 1024);
        assert_eq!(config.max_sessions, 5);
        assert!(config.catalogs.is_none());
        assert_eq!(config.vars["gitee_api_base"], "https://gitee.com/api/v5");
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"
tool_timeout_secs = 10
catalogs = ["git", "pci"]
max_sessions = 2

[vars]
gitee_api_base = "http://127.0.0.1:9/api"

[env]
HOME = "/tmp/ccb-home"
"#,
        )
        .unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = ServerConfig::from_lookup(lookup(&[
            ("TOOLBOX_CONFIG", path.as_str()),
            ("TOOLBOX_TOOL_TIMEOUT_SECS", "3"),
            ("GITEE_PERSONAL_ACCESS_TOKEN", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.tool_timeout, Duration::from_secs(3));
        assert_eq!(config.max_sessions, 2);
        assert_eq!(config.catalogs, Some(vec!["git".into(), "pci".into()]));
        assert_eq!(config.vars["gitee_api_base"], "http://127.0.0.1:9/api");
        assert_eq!(config.vars["gitee_token"], "secret");
        assert_eq!(config.env["HOME"], "/tmp/ccb-home");
    }

    #[test]
    fn catalog_list_is_trimmed() {
        let config = ServerConfig::from_lookup(lookup(&[("TOOLBOX_CATALOGS", " git, ,rpm ")])).unwrap();
        assert_eq!(config.catalogs, Some(vec!["git".into(), "rpm".into()]));
    }

    #[test]
    fn rejects_bad_numbers_and_files() {
        let err = ServerConfig::from_lookup(lookup(&[("TOOLBOX_TOOL_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { .. }));

        let err =
            ServerConfig::from_lookup(lookup(&[("TOOLBOX_CONFIG", "/no/such/toolbox.toml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"unknown_key = 1\n").unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let err = ServerConfig::from_lookup(lookup(&[("TOOLBOX_CONFIG", path.as_str())])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
