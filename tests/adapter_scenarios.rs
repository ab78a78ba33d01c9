//! End-to-end tool calls against recording launchers: nothing here
//! spawns a process or opens a socket.

mod common;

use common::{process, toolbox_from, toolbox_with};
use mcp_toolbox_server::adapter::{
    build_command, validate, CommandTemplate, ParamSpec, ParamType, Segment, ToolSpec,
};
use mcp_toolbox_server::config::ServerConfig;
use mcp_toolbox_server::protocol::ErrorKind;
use mcp_toolbox_server::registry::ToolRegistry;
use serde_json::json;

fn device_info_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(
            ToolSpec::command(
                "disk.info",
                "Show one block device",
                CommandTemplate::new("lsblk")
                    .literals(&["--json"])
                    .arg(Segment::param("device")),
            )
            .param(ParamSpec::required("device", ParamType::String, "Block device")),
        )
        .unwrap();
    registry
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

#[test]
fn list_devices_plan_with_and_without_filter() {
    let registry = ToolRegistry::from_catalogs(Some(&["pci".to_string()][..])).unwrap();
    let spec = registry.get("pci.list_devices").unwrap();
    let vars = ServerConfig::default().vars;

    let params = validate(None, &spec).unwrap();
    let plan = build_command(&params, &spec.action, &vars).unwrap();
    assert_eq!(plan.argv(), vec![vec!["lspci"]]);

    let params = validate(Some(&json!({"filter": "VGA"})), &spec).unwrap();
    let plan = build_command(&params, &spec.action, &vars).unwrap();
    assert_eq!(plan.argv(), vec![vec!["lspci"], vec!["grep", "VGA"]]);
    assert_eq!(plan.describe(), "lspci | grep VGA");
}

#[tokio::test]
async fn filtered_device_list_feeds_stdout_into_next_stage() {
    let (toolbox, launcher) = toolbox_with(&["pci"], ServerConfig::default());
    let listing = "00:02.0 VGA compatible controller\n00:1f.0 ISA bridge\n";
    launcher.reply_process(0, listing, "");
    launcher.reply_process(0, "00:02.0 VGA compatible controller\n", "");

    let outcome = toolbox
        .call("pci.list_devices", Some(&json!({"filter": "VGA"})))
        .await;

    assert!(outcome.ok, "{outcome:?}");
    assert_eq!(outcome.data, Some(json!(["00:02.0 VGA compatible controller"])));

    let calls = launcher.process_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].command.program, "lspci");
    assert!(calls[0].stdin.is_none());
    assert_eq!(calls[1].command.args, vec!["VGA"]);
    assert_eq!(calls[1].stdin.as_deref(), Some(listing.as_bytes()));
}

#[tokio::test]
async fn no_match_from_grep_is_an_empty_success() {
    let (toolbox, launcher) = toolbox_with(&["pci"], ServerConfig::default());
    launcher.reply_process(0, "00:1f.0 ISA bridge\n", "");
    launcher.reply_process(1, "", "");

    let outcome = toolbox
        .call("pci.list_devices", Some(&json!({"filter": "Network"})))
        .await;
    assert!(outcome.ok);
    assert_eq!(outcome.data, Some(json!([])));
}

#[tokio::test]
async fn failing_first_stage_stops_the_pipeline() {
    let (toolbox, launcher) = toolbox_with(&["pci"], ServerConfig::default());
    launcher.reply_process(1, "", "lspci: cannot open /sys/bus/pci\n");

    let outcome = toolbox
        .call("pci.list_devices", Some(&json!({"filter": "VGA"})))
        .await;
    assert_eq!(outcome.kind(), Some(ErrorKind::ExecutionError));
    assert_eq!(launcher.process_calls().len(), 1);
}

// ---------------------------------------------------------------------------
// Failure mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nonzero_exit_reports_stderr_as_message() {
    let (toolbox, launcher) = toolbox_from(device_info_registry(), ServerConfig::default());
    launcher.reply_process(1, "", "device not found");

    let outcome = toolbox.call("disk.info", Some(&json!({"device": "sdz"}))).await;

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"ok": false, "error": {"kind": "ExecutionError", "message": "device not found"}})
    );
}

#[tokio::test]
async fn missing_required_parameter_never_launches() {
    let (toolbox, launcher) = toolbox_from(device_info_registry(), ServerConfig::default());

    let outcome = toolbox.call("disk.info", Some(&json!({}))).await;

    assert!(!outcome.ok);
    assert_eq!(outcome.kind(), Some(ErrorKind::ValidationError));
    assert!(outcome.error.unwrap().message.contains("device"));
    assert_eq!(launcher.launches(), 0, "validation failures must not launch anything");
}

#[tokio::test]
async fn unknown_tool_is_a_validation_error() {
    let (toolbox, launcher) = toolbox_with(&["pci"], ServerConfig::default());
    let outcome = toolbox.call("pci.nope", None).await;
    assert_eq!(outcome.kind(), Some(ErrorKind::ValidationError));
    assert_eq!(launcher.launches(), 0);
}

#[tokio::test]
async fn missing_path_is_not_found() {
    let (toolbox, launcher) = toolbox_with(&["git"], ServerConfig::default());
    let outcome = toolbox
        .call("git.status", Some(&json!({"repo_path": "/no/such/repo"})))
        .await;
    assert_eq!(outcome.kind(), Some(ErrorKind::NotFound));
    assert_eq!(launcher.launches(), 0);
}

#[tokio::test]
async fn unparseable_output_is_a_parse_error() {
    let (toolbox, launcher) = toolbox_with(&["docker"], ServerConfig::default());
    launcher.reply_process(0, "{\"ID\":\"abc\"}\nnot json\n", "");

    let outcome = toolbox.call("docker.list_images", None).await;
    assert_eq!(outcome.kind(), Some(ErrorKind::ParseError));
}

#[tokio::test]
async fn search_results_become_records() {
    let (toolbox, launcher) = toolbox_with(&["code_search"], ServerConfig::default());
    launcher.reply_process(0, "src/lib.rs\012:pub mod adapter;\nsrc/a:b.rs\03:use a::b;\n", "");

    let outcome = toolbox
        .call("code_search.search", Some(&json!({"search_term": "adapter"})))
        .await;
    assert_eq!(
        outcome.data,
        Some(json!([
            {"file": "src/lib.rs", "line": "12", "content": "pub mod adapter;"},
            {"file": "src/a:b.rs", "line": "3", "content": "use a::b;"}
        ]))
    );

    let call = launcher.process_calls().remove(0);
    assert_eq!(
        call.command.args,
        vec![
            "--no-heading",
            "--color=never",
            "--with-filename",
            "--line-number",
            "--null",
            "--regexp",
            "adapter",
            "--",
            "."
        ]
    );
}

// ---------------------------------------------------------------------------
// Configuration variables and HTTP plans
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_dependency_missing() {
    let (toolbox, launcher) = toolbox_with(&["gitee"], ServerConfig::default());
    let outcome = toolbox
        .call(
            "gitee.create_issue",
            Some(&json!({"owner": "openeuler", "repo": "kernel", "title": "crash"})),
        )
        .await;
    assert_eq!(outcome.kind(), Some(ErrorKind::DependencyMissing));
    assert_eq!(launcher.launches(), 0);
}

#[tokio::test]
async fn create_issue_builds_a_json_request() {
    let mut config = ServerConfig::default();
    config.vars.insert("gitee_token".into(), "t0ken".into());
    let (toolbox, launcher) = toolbox_with(&["gitee"], config);
    launcher.reply(Ok(mcp_toolbox_server::adapter::RawOutput::Http {
        status: 201,
        reason: "Created".into(),
        body: "{\"number\":\"I1\"}".into(),
        truncated: false,
    }));

    let outcome = toolbox
        .call(
            "gitee.create_issue",
            Some(&json!({"owner": "openeuler", "repo": "kernel", "title": "crash"})),
        )
        .await;
    assert!(outcome.ok, "{outcome:?}");
    assert_eq!(outcome.data, Some(json!({"status": 201, "body": {"number": "I1"}})));

    let request = launcher.http_calls().remove(0);
    assert_eq!(request.url, "https://gitee.com/api/v5/repos/openeuler/issues");
    assert_eq!(
        request.body,
        Some(json!({"access_token": "t0ken", "repo": "kernel", "title": "crash"}))
    );
}

#[tokio::test]
async fn dot_segments_cannot_redirect_a_gitee_request() {
    let mut config = ServerConfig::default();
    config.vars.insert("gitee_token".into(), "t0ken".into());
    let (toolbox, launcher) = toolbox_with(&["gitee"], config);

    for args in [
        json!({"owner": "..", "repo": ".."}),
        json!({"owner": "openeuler", "repo": "."}),
        json!({"owner": "a/b", "repo": "kernel"}),
    ] {
        let outcome = toolbox.call("gitee.list_issues", Some(&args)).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::ValidationError), "{args}");
    }
    assert_eq!(launcher.launches(), 0);
}

// ---------------------------------------------------------------------------
// Debug sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_lifecycle() {
    let (toolbox, launcher) = toolbox_with(&["debug"], ServerConfig::default());

    let started = toolbox
        .call("debug.start_session", Some(&json!({"session_id": "s1", "wait_for_client": true})))
        .await;
    assert!(started.ok);
    let record = started.data.unwrap();
    assert_eq!(record["state"], "waiting");
    assert_eq!(record["port"], 5678);

    let duplicate = toolbox
        .call("debug.start_session", Some(&json!({"session_id": "s1"})))
        .await;
    assert_eq!(duplicate.kind(), Some(ErrorKind::ValidationError));

    let attached = toolbox
        .call("debug.attach_session", Some(&json!({"session_id": "s1"})))
        .await;
    assert_eq!(attached.data.unwrap()["state"], "active");

    let listed = toolbox.call("debug.list_sessions", None).await;
    assert_eq!(listed.data.unwrap()["sessions"].as_array().unwrap().len(), 1);

    assert!(toolbox.call("debug.stop_session", Some(&json!({"session_id": "s1"}))).await.ok);
    let again = toolbox
        .call("debug.stop_session", Some(&json!({"session_id": "s1"})))
        .await;
    assert_eq!(again.kind(), Some(ErrorKind::NotFound));
    assert_eq!(launcher.launches(), 0);
}

#[tokio::test]
async fn session_capacity_is_enforced() {
    let config = ServerConfig {
        max_sessions: 1,
        ..ServerConfig::default()
    };
    let (toolbox, _launcher) = toolbox_with(&["debug"], config);

    assert!(toolbox.call("debug.start_session", Some(&json!({"session_id": "a"}))).await.ok);
    let outcome = toolbox
        .call("debug.start_session", Some(&json!({"session_id": "b"})))
        .await;
    assert_eq!(outcome.kind(), Some(ErrorKind::ExecutionError));
    assert!(outcome.error.unwrap().message.starts_with("Maximum sessions reached"));
}

#[tokio::test]
async fn health_is_always_available() {
    let (toolbox, _launcher) = toolbox_with(&[], ServerConfig::default());
    let outcome = toolbox.call("health", None).await;
    assert_eq!(outcome.data.unwrap()["status"], "ok");
}

#[test]
fn canned_process_helper_matches_launcher_shape() {
    assert!(matches!(
        process(2, "out", "err"),
        mcp_toolbox_server::adapter::RawOutput::Process { code: 2, .. }
    ));
}

// ---------------------------------------------------------------------------
// JSON temp files
// ---------------------------------------------------------------------------

async fn create_project(code: i32) -> common::ProcessCall {
    let (toolbox, launcher) = toolbox_with(&["ccb"], ServerConfig::default());
    launcher.reply_process(code, "{\"success\":true}", "");

    let outcome = toolbox
        .call(
            "ccb.create_project",
            Some(&json!({
                "project_name": "demo",
                "spec_name": "bash",
                "spec_url": "https://example.test/bash.git",
                "os_variant": "openEuler:24.03-LTS",
                "architecture": "x86_64"
            })),
        )
        .await;
    assert_eq!(outcome.ok, code == 0);
    launcher.process_calls().remove(0)
}

#[tokio::test]
async fn project_config_is_passed_as_a_json_file() {
    let call = create_project(0).await;

    assert_eq!(call.command.args[..4], ["create", "projects", "demo", "--json"]);
    let (path, payload) = &call.json_files[0];
    assert_eq!(path.to_string_lossy(), call.command.args[4]);
    assert_eq!(
        payload,
        &json!({
            "os_project": "demo",
            "description": "demo",
            "my_specs": [{
                "spec_name": "bash",
                "spec_url": "https://example.test/bash.git",
                "spec_branch": "master"
            }],
            "build_targets": [{"os_variant": "openEuler:24.03-LTS", "architecture": "x86_64"}]
        })
    );
    assert!(!path.exists(), "temp file must be removed after the call");
}

#[tokio::test]
async fn json_file_is_removed_when_the_command_fails() {
    let call = create_project(1).await;
    let (path, _) = &call.json_files[0];
    assert!(!path.exists());
}
