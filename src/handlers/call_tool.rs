use crate::protocol::{ToolCallParams, ToolResult};
use crate::toolbox::Toolbox;

/// Run one `tools/call` and wrap its outcome as MCP tool content.
pub async fn handle(params: &ToolCallParams, toolbox: &Toolbox) -> ToolResult {
    tracing::info!(tool = %params.name, "tools/call");
    toolbox
        .call(&params.name, params.arguments.as_ref())
        .await
        .into()
}
