use crate::parse::common::{
    brace_counts, compose_path, is_comment_or_blank, normalize_prefix, Endpoint, HttpMethod,
    DEFAULT_OWNER,
};
use crate::parse::{Framework, FrameworkParser};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

static GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:(\w+)\s*:?=\s*)?(\w+)\.Group\(\s*["`]([^"`]*)["`]"#).unwrap()
});
static ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:(\w+)|\))\.(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS|CONNECT|TRACE|Any)\(\s*["`]([^"`]*)["`]\s*(?:,\s*([\w.]+))?"#,
    )
    .unwrap()
});
static STRUCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*type\s+(\w+)\s+struct\b").unwrap());

/// Echo routers: `e.VERB(...)` calls, optionally under `.Group(...)` prefixes.
pub struct EchoParser;

/// An unassigned group prefix, live until the block it appeared in closes.
#[derive(Debug)]
struct ScopedGroup {
    prefix: String,
    depth: i32,
}

#[derive(Debug, Default)]
struct GroupState {
    scoped: Vec<ScopedGroup>,
    /// Group variables by name: full prefix and the depth they were bound at
    named: HashMap<String, (String, i32)>,
    depth: i32,
}

impl GroupState {
    fn active_prefix(&self) -> String {
        self.scoped
            .last()
            .map(|g| g.prefix.clone())
            .unwrap_or_default()
    }

    fn prefix_for(&self, receiver: &str) -> String {
        self.named
            .get(receiver)
            .map(|(prefix, _)| prefix.clone())
            .unwrap_or_else(|| self.active_prefix())
    }

    fn advance(&mut self, line: &str) {
        let (opens, closes) = brace_counts(line);
        self.depth += opens - closes;
        while self.scoped.last().is_some_and(|g| self.depth < g.depth) {
            self.scoped.pop();
        }
        let depth = self.depth;
        self.named.retain(|_, (_, bound)| depth >= *bound);
    }
}

impl FrameworkParser for EchoParser {
    fn framework(&self) -> Framework {
        Framework::Echo
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["go"]
    }

    fn can_parse(&self, _path: &Path, content: &str) -> bool {
        content.contains("echo.New()")
            || content.contains("*echo.Echo")
            || content.contains("echo.Context")
            || content.contains("github.com/labstack/echo")
    }

    fn parse_file(&self, path: &Path, content: &str) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();
        let mut groups = GroupState::default();
        let mut owner = DEFAULT_OWNER.to_string();

        for (i, line) in content.lines().enumerate() {
            if is_comment_or_blank(line.trim()) {
                continue;
            }
            if let Some(name) = STRUCT.captures(line).and_then(|c| c.get(1)) {
                owner = name.as_str().to_string();
            }

            let routes: Vec<_> = ROUTE.captures_iter(line).collect();
            let chained = routes.iter().any(|r| r.get(1).is_none());

            let mut inline_prefix = None;
            for caps in GROUP.captures_iter(line) {
                let (Some(receiver), Some(literal)) = (caps.get(2), caps.get(3)) else {
                    continue;
                };
                let base = groups.prefix_for(receiver.as_str());
                let full = normalize_prefix(&compose_path(&[&base, literal.as_str()]));
                match caps.get(1) {
                    Some(var) => {
                        groups
                            .named
                            .insert(var.as_str().to_string(), (full.clone(), groups.depth));
                    }
                    None if !chained => groups.scoped.push(ScopedGroup {
                        prefix: full.clone(),
                        depth: groups.depth,
                    }),
                    None => {}
                }
                inline_prefix = Some(full);
            }

            for caps in routes {
                let (Some(verb), Some(literal)) = (caps.get(2), caps.get(3)) else {
                    continue;
                };
                let prefix = match caps.get(1) {
                    Some(receiver) => groups.prefix_for(receiver.as_str()),
                    None => inline_prefix
                        .clone()
                        .unwrap_or_else(|| groups.active_prefix()),
                };
                let handler = caps
                    .get(4)
                    .map(|h| h.as_str())
                    .filter(|h| *h != "func")
                    .unwrap_or_default();
                endpoints.push(Endpoint::new(
                    compose_path(&[&prefix, literal.as_str()]),
                    HttpMethod::from_token(verb.as_str()),
                    path,
                    i,
                    owner.as_str(),
                    handler,
                    Framework::Echo,
                ));
            }

            groups.advance(line);
        }

        endpoints
    }
}
