use serde_json::json;

use crate::adapter::{
    CommandTemplate, Constraint, ParamSpec, ParamType, Segment, ToolSpec,
};

fn zone() -> ParamSpec {
    ParamSpec::optional("zone", ParamType::String, "Zone; the default zone when omitted")
        .with(Constraint::Identifier)
}

fn port_change(name: &str, description: &str, flag: &str) -> ToolSpec {
    ToolSpec::command(
        name,
        description,
        CommandTemplate::new("firewall-cmd")
            .arg(Segment::format(&format!("{flag}={{port}}/{{protocol}}")))
            .arg(Segment::format("--zone={zone}"))
            .arg(Segment::flag("permanent", "--permanent")),
    )
    .param(
        ParamSpec::required("port", ParamType::Integer, "Port number")
            .with(Constraint::range(1, 65535)),
    )
    .param(
        ParamSpec::optional("protocol", ParamType::one_of(&["tcp", "udp"]), "Protocol")
            .default(json!("tcp")),
    )
    .param(zone())
    .param(
        ParamSpec::optional("permanent", ParamType::Boolean, "Persist across reloads")
            .default(json!(true)),
    )
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command(
            "firewall.state",
            "Report whether firewalld is running",
            CommandTemplate::new("firewall-cmd").literals(&["--state"]),
        ),
        ToolSpec::command(
            "firewall.get_zones",
            "List available zones",
            CommandTemplate::new("firewall-cmd").literals(&["--get-zones"]),
        ),
        ToolSpec::command(
            "firewall.get_default_zone",
            "Show the default zone",
            CommandTemplate::new("firewall-cmd").literals(&["--get-default-zone"]),
        ),
        ToolSpec::command(
            "firewall.list_ports",
            "List open ports in a zone",
            CommandTemplate::new("firewall-cmd")
                .arg(Segment::format("--zone={zone}"))
                .literals(&["--list-ports"]),
        )
        .param(zone()),
        port_change("firewall.add_port", "Open a port", "--add-port"),
        port_change("firewall.remove_port", "Close a port", "--remove-port"),
        ToolSpec::command(
            "firewall.reload",
            "Reload the permanent configuration",
            CommandTemplate::new("firewall-cmd").literals(&["--reload"]),
        ),
    ]
}
