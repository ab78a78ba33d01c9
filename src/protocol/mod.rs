pub mod request;
pub mod response;

pub use request::{InitializeParams, JsonRpcRequest, RpcId, ToolCallParams};
pub use response::{
    ErrorKind, JsonRpcError, JsonRpcResponse, Outcome, ToolFailure, ToolResult, ToolResultContent,
};
