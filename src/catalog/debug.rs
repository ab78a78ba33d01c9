use serde_json::json;

use crate::adapter::{Builtin, Constraint, ParamSpec, ParamType, ToolSpec};

fn session_id() -> ParamSpec {
    ParamSpec::required("session_id", ParamType::String, "Session id, unique per server")
        .with(Constraint::Identifier)
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::builtin(
            "debug.start_session",
            "Register a debug session; it waits for a client when wait_for_client is set",
            Builtin::StartSession,
        )
        .param(session_id())
        .param(
            ParamSpec::optional("port", ParamType::Integer, "Debug port")
                .default(json!(5678))
                .with(Constraint::range(1, 65535)),
        )
        .param(
            ParamSpec::optional("wait_for_client", ParamType::Boolean, "Start in the waiting state")
                .default(json!(false)),
        ),
        ToolSpec::builtin(
            "debug.attach_session",
            "Mark a session as active once a client has attached",
            Builtin::AttachSession,
        )
        .param(session_id()),
        ToolSpec::builtin("debug.stop_session", "Remove a debug session", Builtin::StopSession)
            .param(session_id()),
        ToolSpec::builtin(
            "debug.list_sessions",
            "List live debug sessions",
            Builtin::ListSessions,
        ),
    ]
}
