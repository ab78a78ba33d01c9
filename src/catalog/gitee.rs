use crate::adapter::{
    BodyTemplate, Constraint, HttpMethod, HttpTemplate, JsonField, ParamSpec, ParamType, ToolSpec,
};

fn path_part(name: &str, description: &str) -> ParamSpec {
    ParamSpec::required(name, ParamType::String, description).with(Constraint::Identifier)
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        // Needs the `gitee_token` variable; without it the call reports
        // DependencyMissing before any request is sent.
        ToolSpec::http(
            "gitee.create_issue",
            "Open an issue in a Gitee repository",
            HttpTemplate::new(HttpMethod::Post, "{var:gitee_api_base}/repos/{owner}/issues")
                .header("Content-Type", "application/json;charset=UTF-8")
                .body(BodyTemplate::Fields(vec![
                    JsonField::var("access_token", "gitee_token"),
                    JsonField::param("repo", "repo"),
                    JsonField::param("title", "title"),
                    JsonField::param("body", "body"),
                    JsonField::param("labels", "labels"),
                ])),
        )
        .param(path_part("owner", "Repository owner (user or organisation)"))
        .param(path_part("repo", "Repository name"))
        .param(ParamSpec::required("title", ParamType::String, "Issue title").with(Constraint::NonEmpty))
        .param(ParamSpec::optional("body", ParamType::String, "Issue description (Markdown)"))
        .param(ParamSpec::optional("labels", ParamType::String, "Comma-separated labels"))
        .success_statuses([201]),
        ToolSpec::http(
            "gitee.list_issues",
            "List issues of a Gitee repository",
            HttpTemplate::new(HttpMethod::Get, "{var:gitee_api_base}/repos/{owner}/{repo}/issues")
                .query_from("query"),
        )
        .param(path_part("owner", "Repository owner"))
        .param(path_part("repo", "Repository name"))
        .param(ParamSpec::optional(
            "query",
            ParamType::Object,
            "Filters such as state, labels, page, per_page",
        )),
    ]
}
