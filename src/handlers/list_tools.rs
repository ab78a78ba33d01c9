use serde_json::{json, Value};

use crate::toolbox::Toolbox;

/// `tools/list` result: every registered tool, sorted by name.
pub fn handle(toolbox: &Toolbox) -> Value {
    json!({ "tools": toolbox.registry().descriptors() })
}
