use std::sync::Arc;

use serde_json::Value;

use crate::adapter::{InvocationContext, Launcher, ToolAdapter};
use crate::config::ServerConfig;
use crate::protocol::{ErrorKind, Outcome};
use crate::registry::{RegistryError, ToolRegistry};
use crate::session::SessionRegistry;

/// Everything a tool call needs: configuration, the registry, the adapter
/// and session state. Built once at startup.
pub struct Toolbox {
    config: ServerConfig,
    registry: ToolRegistry,
    adapter: ToolAdapter,
    sessions: SessionRegistry,
}

impl Toolbox {
    pub fn new(config: ServerConfig) -> Result<Self, RegistryError> {
        let registry = ToolRegistry::from_catalogs(config.catalogs.as_deref())?;
        Ok(Self::assemble(config, registry, ToolAdapter::system()))
    }

    /// Use `launcher` instead of real processes and HTTP.
    pub fn with_launcher(
        config: ServerConfig,
        launcher: Arc<dyn Launcher>,
    ) -> Result<Self, RegistryError> {
        let registry = ToolRegistry::from_catalogs(config.catalogs.as_deref())?;
        Ok(Self::assemble(config, registry, ToolAdapter::new(launcher)))
    }

    /// Serve a hand-built registry.
    pub fn from_parts(config: ServerConfig, registry: ToolRegistry, launcher: Arc<dyn Launcher>) -> Self {
        Self::assemble(config, registry, ToolAdapter::new(launcher))
    }

    fn assemble(config: ServerConfig, registry: ToolRegistry, adapter: ToolAdapter) -> Self {
        let sessions = SessionRegistry::new(config.max_sessions, config.session_ttl);
        Self {
            config,
            registry,
            adapter,
            sessions,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Call a tool by name. Unknown names are a `ValidationError` outcome.
    pub async fn call(&self, name: &str, args: Option<&Value>) -> Outcome {
        let Some(spec) = self.registry.get(name) else {
            tracing::warn!(tool = %name, "unknown tool");
            return Outcome::failure(ErrorKind::ValidationError, format!("Unknown tool: {name}"));
        };
        let ctx = InvocationContext {
            config: &self.config,
            sessions: &self.sessions,
        };
        self.adapter.invoke(&spec, args, ctx).await
    }
}
