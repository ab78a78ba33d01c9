use serde_json::json;

use crate::adapter::{CommandTemplate, OutputFormat, ParamSpec, ParamType, Segment, ToolSpec};

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command(
            "usb.list_devices",
            "List connected USB devices (lsusb)",
            CommandTemplate::new("lsusb").arg(Segment::flag("verbose", "-v")),
        )
        .param(
            ParamSpec::optional("verbose", ParamType::Boolean, "Show detailed descriptors")
                .default(json!(false)),
        )
        .output(OutputFormat::Lines),
        ToolSpec::command(
            "usb.device_tree",
            "Show the USB device hierarchy (lsusb -t)",
            CommandTemplate::new("lsusb").literals(&["-t"]),
        ),
    ]
}
