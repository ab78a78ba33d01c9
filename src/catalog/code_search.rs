use serde_json::json;

use crate::adapter::{
    CommandTemplate, Constraint, OutputFormat, ParamSpec, ParamType, Segment, ToolSpec,
};

fn search_path() -> ParamSpec {
    ParamSpec::optional("path", ParamType::String, "Directory or file to search")
        .default(json!("."))
        .with(Constraint::PathExists)
}

fn file_type() -> ParamSpec {
    ParamSpec::optional("file_type", ParamType::String, "ripgrep file type, e.g. py or rust")
        .with(Constraint::Identifier)
}

// ripgrep exits 1 when nothing matches. `--null` ends the path with NUL
// so paths containing `:` still split correctly.
pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::command(
            "code_search.search",
            "Search file contents with ripgrep",
            CommandTemplate::new("rg")
                .literals(&["--no-heading", "--color=never", "--with-filename", "--line-number", "--null"])
                .arg(Segment::opt("file_type", "--type"))
                .arg(Segment::flag("ignore_case", "--ignore-case"))
                .arg(Segment::opt("search_term", "--regexp"))
                .arg(Segment::literal("--"))
                .arg(Segment::param("path")),
        )
        .param(
            ParamSpec::required("search_term", ParamType::String, "Pattern to search for")
                .with(Constraint::NonEmpty),
        )
        .param(search_path())
        .param(file_type())
        .param(ParamSpec::optional("ignore_case", ParamType::Boolean, "Case-insensitive match"))
        .success_exit_codes([0, 1])
        .output(OutputFormat::delimited(&['\0', ':'], &["file", "line", "content"])),
        ToolSpec::command(
            "code_search.list_files",
            "List files ripgrep would search",
            CommandTemplate::new("rg")
                .literals(&["--files"])
                .arg(Segment::opt("file_type", "--type"))
                .arg(Segment::literal("--"))
                .arg(Segment::param("path")),
        )
        .param(search_path())
        .param(file_type())
        .success_exit_codes([0, 1])
        .output(OutputFormat::Lines),
    ]
}
