use serde_json::json;

use crate::adapter::{
    CommandTemplate, Condition, Constraint, OutputFormat, ParamSpec, ParamType, Segment, ToolSpec,
};

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command(
            "pci.device_info",
            "Show PCI devices in machine-readable form (lspci -mm)",
            CommandTemplate::new("lspci")
                .literals(&["-mm"])
                .arg(Segment::flag("verbose", "-v")),
        )
        .param(
            ParamSpec::optional("verbose", ParamType::Boolean, "Include detailed information")
                .default(json!(true)),
        ),
        // grep exits 1 when nothing matches.
        ToolSpec::command(
            "pci.list_devices",
            "List PCI devices, optionally only those matching a filter such as VGA or Network",
            CommandTemplate::new("lspci")
                .pipe_when(Condition::present("filter"), "grep")
                .arg(Segment::param("filter")),
        )
        .param(
            ParamSpec::optional("filter", ParamType::String, "Device type to match, e.g. VGA")
                .with(Constraint::NonEmpty)
                .with(Constraint::NoLeadingDash),
        )
        .success_exit_codes([0, 1])
        .output(OutputFormat::Lines),
    ]
}
