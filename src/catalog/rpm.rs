use crate::adapter::{
    CommandTemplate, Constraint, OutputFormat, ParamSpec, ParamType, Segment, ToolSpec,
};

fn package() -> ParamSpec {
    ParamSpec::required("package", ParamType::String, "Package name")
        .with(Constraint::NonEmpty)
        .with(Constraint::NoLeadingDash)
}

fn rpm_query(name: &str, description: &str, flags: &[&str], output: OutputFormat) -> ToolSpec {
    ToolSpec::command(
        name,
        description,
        CommandTemplate::new("rpm")
            .literals(flags)
            .arg(Segment::param("package")),
    )
    .param(package())
    .output(output)
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        rpm_query(
            "rpm.query_info",
            "Show installed package metadata (rpm -qi)",
            &["-qi"],
            OutputFormat::KeyValue { sep: ':' },
        ),
        rpm_query(
            "rpm.query_requires",
            "List the capabilities an installed package requires (rpm -qR)",
            &["-qR"],
            OutputFormat::Lines,
        ),
        rpm_query(
            "rpm.list_files",
            "List files owned by an installed package (rpm -ql)",
            &["-ql"],
            OutputFormat::Lines,
        ),
        ToolSpec::command(
            "rpm.which_package",
            "Find the installed package that owns a file (rpm -qf)",
            CommandTemplate::new("rpm")
                .literals(&["-qf"])
                .arg(Segment::param("path")),
        )
        .param(ParamSpec::required("path", ParamType::String, "File path").with(Constraint::PathExists))
        .output(OutputFormat::Lines),
        ToolSpec::command(
            "dnf.repoquery_requires",
            "List the requirements of a repository package (dnf repoquery --requires)",
            CommandTemplate::new("dnf")
                .literals(&["repoquery", "--quiet", "--requires"])
                .arg(Segment::param("package")),
        )
        .param(package())
        .output(OutputFormat::Lines),
    ]
}
