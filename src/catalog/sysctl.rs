use crate::adapter::{
    CommandTemplate, Constraint, OutputFormat, ParamSpec, ParamType, Segment, ToolSpec,
};

fn key_param(description: &str) -> ParamSpec {
    ParamSpec::required("param", ParamType::String, description).with(Constraint::Identifier)
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command(
            "sysctl.get_param",
            "Read a kernel parameter, e.g. vm.swappiness",
            CommandTemplate::new("sysctl")
                .literals(&["-n"])
                .arg(Segment::param("param")),
        )
        .param(key_param("Kernel parameter name")),
        ToolSpec::command(
            "sysctl.set_param",
            "Set a kernel parameter at runtime",
            CommandTemplate::new("sysctl")
                .literals(&["-w"])
                .arg(Segment::format("{param}={value}")),
        )
        .param(key_param("Kernel parameter name"))
        .param(
            ParamSpec::required("value", ParamType::String, "New value")
                .with(Constraint::NonEmpty),
        ),
        ToolSpec::command(
            "sysctl.list_params",
            "List all kernel parameters with their current values",
            CommandTemplate::new("sysctl").literals(&["-a"]),
        )
        .output(OutputFormat::KeyValue { sep: '=' }),
    ]
}
