use crate::parse::common::{
    compose_path, declared_name, first_double_quoted, is_comment_or_blank, normalize_prefix,
    Endpoint, HttpMethod,
};
use crate::parse::java::{self, ClassScopes};
use crate::parse::{Framework, FrameworkParser};
use std::path::Path;

/// JAX-RS resources: `@Path` classes whose methods carry a verb annotation
/// and an optional method-level `@Path`.
pub struct JaxRsParser;

/// Annotations seen since the last member declaration.
#[derive(Debug, Default)]
struct PendingMember {
    verb: Option<(HttpMethod, usize)>,
    path: Option<(String, usize)>,
}

impl PendingMember {
    fn take(&mut self) -> PendingMember {
        std::mem::take(self)
    }
}

impl FrameworkParser for JaxRsParser {
    fn framework(&self) -> Framework {
        Framework::JaxRs
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["java"]
    }

    fn can_parse(&self, _path: &Path, content: &str) -> bool {
        content.contains("@Path")
    }

    fn parse_file(&self, path: &Path, content: &str) -> Vec<Endpoint> {
        let lines: Vec<&str> = content.lines().collect();
        let mut endpoints = Vec::new();
        let mut scopes: ClassScopes<String> = ClassScopes::new();
        let mut class_path = String::new();
        let mut member = PendingMember::default();

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if is_comment_or_blank(trimmed) {
                continue;
            }

            for ann in java::annotations_on_line(&lines, i) {
                match ann.name {
                    "Path" if java::annotates_type(&lines, i, ann.end_line) => {
                        class_path = normalize_prefix(first_double_quoted(&ann.args).unwrap_or(""));
                    }
                    "Path" => {
                        let route = first_double_quoted(&ann.args).unwrap_or("/");
                        member.path = Some((route.to_string(), i));
                    }
                    "GET" | "POST" | "PUT" | "DELETE" | "PATCH" | "HEAD" | "OPTIONS" => {
                        member.verb = Some((HttpMethod::from_token(ann.name), i));
                    }
                    _ => {}
                }
            }

            if let Some(name) = java::class_name(trimmed) {
                scopes.open(name, std::mem::take(&mut class_path));
                member.take();
            } else if let Some(decl) = java::after_visibility(trimmed).filter(|d| is_member_decl(d)) {
                let pending = member.take();
                if let Some(scope) = scopes.current() {
                    if let Some(endpoint) = member_endpoint(path, &scope.name, &scope.data, pending, decl) {
                        endpoints.push(endpoint);
                    }
                }
            }
            scopes.advance(line);
        }

        endpoints
    }
}

/// A method declaration: a call-like name before any `=`.
fn is_member_decl(decl: &str) -> bool {
    match (decl.find('('), decl.find('=')) {
        (Some(paren), Some(eq)) => paren < eq,
        (Some(_), None) => true,
        _ => false,
    }
}

fn member_endpoint(
    file: &Path,
    owner: &str,
    class_path: &str,
    pending: PendingMember,
    decl: &str,
) -> Option<Endpoint> {
    let (method, line) = match (&pending.verb, &pending.path) {
        (Some((verb, verb_line)), Some((_, path_line))) => (*verb, (*verb_line).min(*path_line)),
        (Some((verb, verb_line)), None) => (*verb, *verb_line),
        // A bare @Path is a sub-resource locator.
        (None, Some((_, path_line))) => (HttpMethod::Unknown, *path_line),
        (None, None) => return None,
    };
    let route = pending.path.as_ref().map(|(p, _)| p.as_str()).unwrap_or("/");
    Some(Endpoint::new(
        compose_path(&[class_path, route]),
        method,
        file,
        line,
        owner,
        declared_name(decl).unwrap_or_default(),
        Framework::JaxRs,
    ))
}
