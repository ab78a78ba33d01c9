use mcp_toolbox_server::config::ServerConfig;
use mcp_toolbox_server::server::McpServer;
use mcp_toolbox_server::toolbox::Toolbox;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let toolbox = match Toolbox::new(config) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("failed to build tool registry: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        tools = toolbox.registry().len(),
        timeout_secs = toolbox.config().tool_timeout.as_secs(),
        "mcp-toolbox-server ready"
    );

    let mut server = McpServer::new(toolbox);
    if let Err(e) = server.run().await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}
