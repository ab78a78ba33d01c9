use serde_json::{json, Value};

use super::error::AdapterError;
use super::spec::Builtin;
use super::validate::ValidatedParams;
use crate::session::{SessionRegistry, SessionState};

/// Serve a builtin operation in-process.
pub(crate) fn run(
    op: Builtin,
    params: &ValidatedParams,
    sessions: &SessionRegistry,
) -> Result<Value, AdapterError> {
    match op {
        Builtin::Health => Ok(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Builtin::StartSession => {
            let id = session_id(params)?;
            let port = params.int("port").unwrap_or(5678);
            let port = u16::try_from(port)
                .map_err(|_| AdapterError::invalid("port", format!("{port} is not a valid port")))?;
            let record = sessions.create(id, port, params.flag("wait_for_client"))?;
            tracing::info!(session_id = %id, port, "debug session started");
            Ok(json!(record))
        }
        Builtin::AttachSession => {
            let id = session_id(params)?;
            let record = sessions.update_state(id, SessionState::Active)?;
            Ok(json!(record))
        }
        Builtin::StopSession => {
            let id = session_id(params)?;
            sessions.delete(id)?;
            tracing::info!(session_id = %id, "debug session stopped");
            Ok(json!({ "session_id": id, "stopped": true }))
        }
        Builtin::ListSessions => Ok(json!({ "sessions": sessions.list() })),
    }
}

fn session_id(params: &ValidatedParams) -> Result<&str, AdapterError> {
    params
        .str("session_id")
        .ok_or_else(|| AdapterError::MissingParam("session_id".into()))
}
