use crate::parse::common::{
    call_arguments, compose_path, normalize_prefix, Endpoint, HttpMethod, DEFAULT_OWNER,
};
use crate::parse::python;
use crate::parse::{Framework, FrameworkParser};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static ROUTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bAPIRouter\b").unwrap());
static PREFIX_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bprefix\s*=\s*["']([^"']*)["']"#).unwrap());
static DECORATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*@\w+\.(?i:(get|post|put|delete|patch|head|options|trace))\b").unwrap()
});
static ANY_DECORATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*@\w+\.(?i:get|post|put|delete|patch|head|options|trace)\s*\(").unwrap()
});

/// FastAPI apps and routers: `@app.get(...)` / `@router.post(...)` decorators.
pub struct FastApiParser;

impl FrameworkParser for FastApiParser {
    fn framework(&self) -> Framework {
        Framework::FastApi
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["py"]
    }

    fn can_parse(&self, _path: &Path, content: &str) -> bool {
        (content.contains("from fastapi") || content.contains("import fastapi"))
            && ANY_DECORATOR.is_match(content)
    }

    fn parse_file(&self, path: &Path, content: &str) -> Vec<Endpoint> {
        let lines: Vec<&str> = content.lines().collect();
        let prefix = python::constructor_keyword(&lines, &ROUTER, &PREFIX_ARG)
            .map(|p| normalize_prefix(&p))
            .unwrap_or_default();

        let mut endpoints = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let Some(caps) = DECORATOR.captures(line) else {
                continue;
            };
            let (Some(whole), Some(verb)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(call) = call_arguments(&lines, i, whole.end()) else {
                continue;
            };
            let Some(route) = python::route_literal(&call.text) else {
                continue;
            };
            endpoints.push(Endpoint::new(
                compose_path(&[&prefix, route]),
                HttpMethod::from_token(verb.as_str()),
                path,
                i,
                python::nearest_class_before(&lines, i).unwrap_or(DEFAULT_OWNER),
                python::handler_after(&lines, call.end_line),
                Framework::FastApi,
            ));
        }
        endpoints
    }
}
