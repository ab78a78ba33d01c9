use crate::adapter::{
    CommandTemplate, Constraint, OutputFormat, ParamSpec, ParamType, Segment, ToolSpec,
};

fn container_ids() -> ParamSpec {
    ParamSpec::required("container_ids", ParamType::StringList, "Container ids or names")
        .with(Constraint::NonEmpty)
        .with(Constraint::NoLeadingDash)
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command(
            "docker.list_images",
            "List local images",
            CommandTemplate::new("docker").literals(&["images", "--format", "{{json .}}"]),
        )
        .output(OutputFormat::JsonLines),
        ToolSpec::command(
            "docker.list_containers",
            "List containers, including stopped ones",
            CommandTemplate::new("docker").literals(&["ps", "--all", "--format", "{{json .}}"]),
        )
        .output(OutputFormat::JsonLines),
        ToolSpec::command(
            "docker.run",
            "Start a detached container and return its id",
            CommandTemplate::new("docker")
                .literals(&["run", "--detach"])
                .arg(Segment::opt("name", "--name"))
                .arg(Segment::opt("env", "--env"))
                .arg(Segment::opt("ports", "--publish"))
                .arg(Segment::opt("volumes", "--volume"))
                .arg(Segment::param("image"))
                .arg(Segment::param("command")),
        )
        .param(
            ParamSpec::required("image", ParamType::String, "Image reference")
                .with(Constraint::NonEmpty)
                .with(Constraint::NoLeadingDash),
        )
        .param(ParamSpec::optional("name", ParamType::String, "Container name").with(Constraint::Identifier))
        .param(ParamSpec::optional("env", ParamType::StringList, "KEY=VALUE environment entries"))
        .param(ParamSpec::optional("ports", ParamType::StringList, "host:container port mappings"))
        .param(ParamSpec::optional("volumes", ParamType::StringList, "host:container volume mounts"))
        .param(ParamSpec::optional("command", ParamType::StringList, "Command and arguments to run in the container")),
        ToolSpec::command(
            "docker.remove",
            "Force-remove containers",
            CommandTemplate::new("docker")
                .literals(&["rm", "--force"])
                .arg(Segment::param("container_ids")),
        )
        .param(container_ids())
        .output(OutputFormat::Lines),
        ToolSpec::command(
            "docker.manage",
            "Start, stop or restart containers",
            CommandTemplate::new("docker")
                .arg(Segment::param("action"))
                .arg(Segment::param("container_ids")),
        )
        .param(ParamSpec::required(
            "action",
            ParamType::one_of(&["start", "stop", "restart"]),
            "Lifecycle action",
        ))
        .param(container_ids())
        .output(OutputFormat::Lines),
    ]
}
