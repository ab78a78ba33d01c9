//! EulerMaker build client (`ccb`). Structured configs travel as JSON
//! temp files passed with `--json`.

use std::time::Duration;

use serde_json::json;

use crate::adapter::{
    CommandTemplate, Condition, Constraint, JsonField, OutputFormat, ParamSpec, ParamType, Segment,
    ToolSpec,
};

fn name(param: &str, description: &str) -> ParamSpec {
    ParamSpec::optional(param, ParamType::String, description).with(Constraint::NoLeadingDash)
}

fn list(param: &str, description: &str) -> ParamSpec {
    ParamSpec::optional(param, ParamType::StringList, description)
}

fn fields() -> ParamSpec {
    list("fields", "Fields to return")
}

fn sort() -> ParamSpec {
    list("sort", "Sort keys, e.g. create_time:desc")
}

/// `--json <file>` with `{"build_targets": [...]}` when both target lists
/// are given; otherwise an explicit `json_config` file if present.
fn build_targets_or_config() -> Vec<Segment> {
    vec![
        Segment::when(
            Condition::All(vec![
                Condition::present("os_variant"),
                Condition::present("architecture"),
            ]),
            vec![Segment::json_file(
                "--json",
                vec![JsonField::zip(
                    "build_targets",
                    &[("os_variant", "os_variant"), ("architecture", "architecture")],
                )],
            )],
        ),
        Segment::when(
            Condition::All(vec![
                Condition::present("json_config"),
                Condition::any_present(&["os_variant", "architecture"]).negate(),
            ]),
            vec![Segment::opt("json_config", "--json")],
        ),
    ]
}

fn target_params(spec: ToolSpec) -> ToolSpec {
    spec.param(list("os_variant", "Build environment(s), e.g. openEuler:24.03-LTS"))
        .param(list("architecture", "Architecture(s), e.g. x86_64 or aarch64"))
        .param(
            ParamSpec::optional("json_config", ParamType::String, "Existing build_targets JSON file")
                .with(Constraint::PathExists),
        )
}

fn with_segments(template: CommandTemplate, segments: Vec<Segment>) -> CommandTemplate {
    segments.into_iter().fold(template, CommandTemplate::arg)
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command(
            "ccb.select_projects",
            "Query EulerMaker projects",
            CommandTemplate::new("ccb")
                .literals(&["select", "projects"])
                .arg(Segment::assign("os_project", "os_project"))
                .arg(Segment::assign("owner", "owner"))
                .arg(Segment::joined("fields", Some("--field"), ","))
                .arg(Segment::joined("sort", Some("--sort"), ",")),
        )
        .param(name("os_project", "Project name"))
        .param(name("owner", "Project owner"))
        .param(fields())
        .param(sort())
        .output(OutputFormat::Auto),
        ToolSpec::command(
            "ccb.select_snapshots",
            "Query project snapshots",
            CommandTemplate::new("ccb")
                .literals(&["select", "snapshots"])
                .arg(Segment::assign("os_project", "os_project"))
                .arg(Segment::assign("snapshot_id", "snapshot_id"))
                .arg(Segment::joined("fields", Some("--field"), ","))
                .arg(Segment::joined("sort", Some("--sort"), ",")),
        )
        .param(name("os_project", "Project name"))
        .param(name("snapshot_id", "Snapshot id"))
        .param(fields())
        .param(sort())
        .output(OutputFormat::Auto),
        ToolSpec::command(
            "ccb.select_builds",
            "Query builds",
            CommandTemplate::new("ccb")
                .literals(&["select", "builds"])
                .arg(Segment::assign("build_id", "build_id"))
                .arg(Segment::assign("os_project", "os_project"))
                .arg(Segment::joined("fields", Some("--field"), ",")),
        )
        .param(name("build_id", "Build id"))
        .param(name("os_project", "Project name"))
        .param(fields())
        .output(OutputFormat::Auto),
        ToolSpec::command(
            "ccb.create_project",
            "Create a project, optionally with packages and build targets",
            CommandTemplate::new("ccb")
                .literals(&["create", "projects"])
                .arg(Segment::param("project_name"))
                .arg(Segment::when(
                    Condition::present("json_config"),
                    vec![Segment::opt("json_config", "--json")],
                ))
                .arg(Segment::when(
                    Condition::All(vec![
                        Condition::absent("json_config"),
                        Condition::any_present(&["spec_name", "os_variant", "architecture"]),
                    ]),
                    vec![Segment::json_file(
                        "--json",
                        vec![
                            JsonField::param("os_project", "project_name"),
                            JsonField::param_or("description", "description", "project_name"),
                            JsonField::zip(
                                "my_specs",
                                &[
                                    ("spec_name", "spec_name"),
                                    ("spec_url", "spec_url"),
                                    ("spec_branch", "spec_branch"),
                                ],
                            ),
                            JsonField::zip(
                                "build_targets",
                                &[("os_variant", "os_variant"), ("architecture", "architecture")],
                            ),
                        ],
                    )],
                )),
        )
        .param(
            ParamSpec::required("project_name", ParamType::String, "Project name")
                .with(Constraint::Identifier),
        )
        .param(
            ParamSpec::optional("json_config", ParamType::String, "Complete project JSON file")
                .with(Constraint::PathExists),
        )
        .param(ParamSpec::optional("description", ParamType::String, "Defaults to the project name"))
        .param(list("spec_name", "Package name(s)"))
        .param(list("spec_url", "Package git URL(s)"))
        .param(list("spec_branch", "Package branch(es)").default(json!("master")))
        .param(list("os_variant", "Build environment(s)"))
        .param(list("architecture", "Architecture(s)"))
        .output(OutputFormat::Auto),
        ToolSpec::command(
            "ccb.update_project",
            "Add packages or change the user list of a project",
            CommandTemplate::new("ccb")
                .literals(&["update", "projects"])
                .arg(Segment::param("project_name"))
                .arg(Segment::when(
                    Condition::present("json_config"),
                    vec![Segment::opt("json_config", "--json")],
                ))
                .arg(Segment::when(
                    Condition::All(vec![
                        Condition::absent("json_config"),
                        Condition::any_present(&["spec_name", "users_to_add", "users_to_remove"]),
                    ]),
                    vec![Segment::json_file(
                        "--json",
                        vec![
                            JsonField::zip(
                                "my_specs+",
                                &[
                                    ("spec_name", "spec_name"),
                                    ("spec_url", "spec_url"),
                                    ("spec_branch", "spec_branch"),
                                ],
                            ),
                            JsonField::param("users+", "users_to_add"),
                            JsonField::param("users-", "users_to_remove"),
                        ],
                    )],
                )),
        )
        .param(
            ParamSpec::required("project_name", ParamType::String, "Project name")
                .with(Constraint::Identifier),
        )
        .param(
            ParamSpec::optional("json_config", ParamType::String, "Update JSON file")
                .with(Constraint::PathExists),
        )
        .param(list("spec_name", "Package name(s) to add"))
        .param(list("spec_url", "Package git URL(s)"))
        .param(list("spec_branch", "Package branch(es)").default(json!("master")))
        .param(list("users_to_add", "Users to grant access"))
        .param(list("users_to_remove", "Users to revoke"))
        .output(OutputFormat::Auto),
        ToolSpec::command(
            "ccb.set_package_lock",
            "Lock or unlock a package in a project",
            CommandTemplate::new("ccb")
                .literals(&["update", "projects"])
                .arg(Segment::param("project_name"))
                .arg(Segment::format("package_overrides.{package_name}.lock={lock}")),
        )
        .param(
            ParamSpec::required("project_name", ParamType::String, "Project name")
                .with(Constraint::Identifier),
        )
        .param(
            ParamSpec::required("package_name", ParamType::String, "Package name")
                .with(Constraint::Identifier),
        )
        .param(ParamSpec::required("lock", ParamType::Boolean, "true to lock, false to unlock"))
        .output(OutputFormat::Auto),
        target_params(
            ToolSpec::command(
                "ccb.build_single_package",
                "Build one package of a project",
                with_segments(
                    CommandTemplate::new("ccb")
                        .literals(&["build-single"])
                        .arg(Segment::assign("os_project", "os_project"))
                        .arg(Segment::assign("package_name", "packages")),
                    build_targets_or_config(),
                ),
            )
            .param(
                ParamSpec::required("os_project", ParamType::String, "Project name")
                    .with(Constraint::Identifier),
            )
            .param(
                ParamSpec::required("package_name", ParamType::String, "Package to build")
                    .with(Constraint::Identifier),
            ),
        )
        .output(OutputFormat::Auto),
        target_params(
            ToolSpec::command(
                "ccb.build",
                "Start a full or incremental project build",
                with_segments(
                    CommandTemplate::new("ccb")
                        .literals(&["build"])
                        .arg(Segment::assign("build_type", "build_type"))
                        .arg(Segment::assign("os_project", "os_project"))
                        .arg(Segment::assign("snapshot_id", "snapshot_id")),
                    build_targets_or_config(),
                ),
            )
            .param(
                ParamSpec::optional("build_type", ParamType::one_of(&["full", "incremental"]), "Build type")
                    .default(json!("full")),
            )
            .param(name("os_project", "Project name"))
            .param(name("snapshot_id", "Snapshot id for incremental builds")),
        )
        .output(OutputFormat::Auto),
        ToolSpec::command(
            "ccb.download_package",
            "Download built RPMs",
            CommandTemplate::new("ccb")
                .literals(&["download"])
                .arg(Segment::assign("os_project", "os_project"))
                .arg(Segment::assign("snapshot_id", "snapshot_id"))
                .arg(Segment::assign("packages", "packages"))
                .arg(Segment::assign("architecture", "architecture"))
                .arg(Segment::assign("dest", "dest"))
                .arg(Segment::flag("with_source", "-s"))
                .arg(Segment::flag("with_debuginfo", "-d"))
                .arg(Segment::opt("sub_packages", "-b")),
        )
        .param(name("os_project", "Project name"))
        .param(name("snapshot_id", "Snapshot id"))
        .param(
            ParamSpec::required("packages", ParamType::String, "Package name")
                .with(Constraint::Identifier),
        )
        .param(
            ParamSpec::required("architecture", ParamType::one_of(&["x86_64", "aarch64"]), "Architecture"),
        )
        .param(ParamSpec::optional("dest", ParamType::String, "Download directory").with(Constraint::PathExists))
        .param(ParamSpec::optional("with_source", ParamType::Boolean, "Include the source RPM"))
        .param(ParamSpec::optional("with_debuginfo", ParamType::Boolean, "Include debuginfo RPMs"))
        .param(list("sub_packages", "Sub-packages to fetch, or 'all'"))
        .timeout(Duration::from_secs(600)),
    ]
}
