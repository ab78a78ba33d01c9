use serde_json::json;

use crate::adapter::{
    CommandTemplate, Condition, Constraint, OutputFormat, ParamSpec, ParamType, Segment, ToolSpec,
};

fn repo_path() -> ParamSpec {
    ParamSpec::required("repo_path", ParamType::String, "Repository path").with(Constraint::PathExists)
}

fn rev(name: &str, description: &str) -> ParamSpec {
    ParamSpec::required(name, ParamType::String, description)
        .with(Constraint::NonEmpty)
        .with(Constraint::NoLeadingDash)
}

/// `git -C <repo_path> <args...>`
fn git(args: &[&str]) -> CommandTemplate {
    CommandTemplate::new("git")
        .arg(Segment::opt("repo_path", "-C"))
        .literals(args)
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command("git.status", "Show the working tree status", git(&["status"]))
            .param(repo_path()),
        ToolSpec::command("git.diff_unstaged", "Show unstaged changes", git(&["diff"]))
            .param(repo_path()),
        ToolSpec::command(
            "git.diff_staged",
            "Show staged changes",
            git(&["diff", "--cached"]),
        )
        .param(repo_path()),
        ToolSpec::command(
            "git.diff",
            "Diff the working tree against a branch or commit",
            git(&["diff"]).arg(Segment::param("target")),
        )
        .param(repo_path())
        .param(rev("target", "Branch or commit to compare against")),
        ToolSpec::command("git.reset", "Unstage all staged changes", git(&["reset"]))
            .param(repo_path()),
        ToolSpec::command(
            "git.show",
            "Show a commit with its patch",
            git(&["show"]).arg(Segment::param("revision")),
        )
        .param(repo_path())
        .param(rev("revision", "Commit hash or branch name")),
        ToolSpec::command(
            "git.create_branch",
            "Create a branch and switch to it",
            git(&["checkout", "-b"]).arg(Segment::param("branch_name")),
        )
        .param(repo_path())
        .param(rev("branch_name", "New branch name")),
        ToolSpec::command(
            "git.list_branches",
            "List local and remote branches",
            git(&["branch", "--all", "--no-color"]),
        )
        .param(repo_path())
        .output(OutputFormat::Lines),
        // Exit 1 means no user.* keys are configured.
        ToolSpec::command(
            "git.get_config",
            "Show the configured user name and email",
            git(&["config", "--get-regexp", "^user\\."]),
        )
        .param(repo_path())
        .success_exit_codes([0, 1])
        .output(OutputFormat::KeyValue { sep: ' ' }),
        ToolSpec::command(
            "git.add",
            "Stage files, or every change when no files are given",
            git(&["add"])
                .arg(Segment::when(
                    Condition::absent("files"),
                    vec![Segment::literal("-A")],
                ))
                .arg(Segment::literal("--"))
                .arg(Segment::param("files")),
        )
        .param(repo_path())
        .param(ParamSpec::optional("files", ParamType::StringList, "Files to stage")),
        ToolSpec::command(
            "git.commit",
            "Commit staged changes",
            CommandTemplate::new("git")
                .arg(Segment::opt("repo_path", "-C"))
                .arg(Segment::when(
                    Condition::present("user_name"),
                    vec![Segment::literal("-c"), Segment::format("user.name={user_name}")],
                ))
                .arg(Segment::when(
                    Condition::present("user_email"),
                    vec![Segment::literal("-c"), Segment::format("user.email={user_email}")],
                ))
                .literals(&["commit"])
                .arg(Segment::opt("message", "-m")),
        )
        .param(repo_path())
        .param(
            ParamSpec::optional("message", ParamType::String, "Commit message")
                .default(json!("auto commit")),
        )
        .param(ParamSpec::optional("user_name", ParamType::String, "Author name override"))
        .param(ParamSpec::optional("user_email", ParamType::String, "Author email override")),
        ToolSpec::command("git.push", "Push the current branch", git(&["push"]))
            .param(repo_path()),
        ToolSpec::command(
            "git.init",
            "Initialise a repository, creating the directory if needed",
            CommandTemplate::new("git")
                .literals(&["init", "--"])
                .arg(Segment::param("repo_path")),
        )
        .param(
            ParamSpec::required("repo_path", ParamType::String, "Repository path")
                .with(Constraint::NonEmpty),
        ),
    ]
}
