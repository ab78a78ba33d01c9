use crate::adapter::{
    BodyTemplate, Constraint, HttpMethod, HttpTemplate, ParamSpec, ParamType, ToolSpec,
};

fn url() -> ParamSpec {
    ParamSpec::required("url", ParamType::String, "Absolute http(s) URL").with(Constraint::NonEmpty)
}

fn headers() -> ParamSpec {
    ParamSpec::optional("headers", ParamType::Object, "Extra request headers")
}

fn request(name: &str, description: &str, method: HttpMethod, with_body: bool) -> ToolSpec {
    let mut template = HttpTemplate::new(method, "{url}")
        .query_from("params")
        .headers_from("headers");
    if with_body {
        template = template.body(BodyTemplate::Param("json_data".into()));
    }
    let spec = ToolSpec::http(name, description, template)
        .param(url())
        .param(ParamSpec::optional("params", ParamType::Object, "Query parameters"))
        .param(headers());
    if with_body {
        spec.param(ParamSpec::optional("json_data", ParamType::Object, "JSON request body"))
    } else {
        spec
    }
}

pub(super) fn tools() -> Vec<ToolSpec> {
    vec![
        request("http.get", "Send a GET request", HttpMethod::Get, false),
        request("http.post", "Send a POST request with an optional JSON body", HttpMethod::Post, true),
        request("http.put", "Send a PUT request with an optional JSON body", HttpMethod::Put, true),
        request("http.patch", "Send a PATCH request with an optional JSON body", HttpMethod::Patch, true),
        request("http.delete", "Send a DELETE request", HttpMethod::Delete, false),
    ]
}
