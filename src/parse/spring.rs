use crate::parse::common::{
    compose_path, declared_name, first_double_quoted, is_comment_or_blank, normalize_prefix,
    Endpoint, HttpMethod,
};
use crate::parse::java::{self, Annotation, ClassScopes};
use crate::parse::{Framework, FrameworkParser};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static REQUEST_METHOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"RequestMethod\.(\w+)").unwrap());
static NAMED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\b(?:value|path)\s*=\s*\{?\s*"([^"]*)""#).unwrap());

const MAPPINGS: [&str; 6] = [
    "GetMapping",
    "PostMapping",
    "PutMapping",
    "DeleteMapping",
    "PatchMapping",
    "RequestMapping",
];

/// Spring MVC controllers: `@Controller`/`@RestController` classes with
/// `@*Mapping` methods.
pub struct SpringParser;

#[derive(Debug, Default)]
struct ControllerHeader {
    controller: bool,
    prefix: String,
}

impl FrameworkParser for SpringParser {
    fn framework(&self) -> Framework {
        Framework::Spring
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["java"]
    }

    fn can_parse(&self, _path: &Path, content: &str) -> bool {
        content.contains("@Controller")
            || content.contains("@RestController")
            || content.contains("@RequestMapping")
    }

    fn parse_file(&self, path: &Path, content: &str) -> Vec<Endpoint> {
        let lines: Vec<&str> = content.lines().collect();
        let mut endpoints = Vec::new();
        let mut scopes: ClassScopes<ControllerHeader> = ClassScopes::new();
        let mut pending = ControllerHeader::default();

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if is_comment_or_blank(trimmed) {
                continue;
            }

            for ann in java::annotations_on_line(&lines, i) {
                match ann.name {
                    "Controller" | "RestController" => pending.controller = true,
                    "RequestMapping" if java::annotates_type(&lines, i, ann.end_line) => {
                        pending.prefix = mapping_path(&ann.args)
                            .map(normalize_prefix)
                            .unwrap_or_default();
                    }
                    name => {
                        let Some(method) = mapping_method(name, &ann.args) else {
                            continue;
                        };
                        let Some(scope) = scopes.current().filter(|s| s.data.controller) else {
                            continue;
                        };
                        let route = mapping_path(&ann.args).unwrap_or("/");
                        endpoints.push(Endpoint::new(
                            compose_path(&[&scope.data.prefix, route]),
                            method,
                            path,
                            i,
                            scope.name.as_str(),
                            find_handler(&lines, &ann),
                            Framework::Spring,
                        ));
                    }
                }
            }

            if let Some(name) = java::class_name(trimmed) {
                scopes.open(name, std::mem::take(&mut pending));
            }
            scopes.advance(line);
        }

        endpoints
    }
}

/// HTTP method for a mapping annotation, `None` for anything else.
fn mapping_method(name: &str, args: &str) -> Option<HttpMethod> {
    let method = match name {
        "GetMapping" => HttpMethod::Get,
        "PostMapping" => HttpMethod::Post,
        "PutMapping" => HttpMethod::Put,
        "DeleteMapping" => HttpMethod::Delete,
        "PatchMapping" => HttpMethod::Patch,
        "RequestMapping" => REQUEST_METHOD
            .captures(args)
            .and_then(|c| c.get(1))
            .map(|m| HttpMethod::from_token(m.as_str()))
            .unwrap_or(HttpMethod::Get),
        _ => return None,
    };
    Some(method)
}

/// Route literal of a mapping: `value =`/`path =` if named, else a leading
/// positional literal.
fn mapping_path(args: &str) -> Option<&str> {
    if let Some(m) = NAMED_PATH.captures(args).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    let positional = args.trim_start().trim_start_matches('{').trim_start();
    if positional.starts_with('"') {
        first_double_quoted(positional)
    } else {
        None
    }
}

/// Name of the method a mapping annotation decorates: the next
/// visibility-qualified line, unless another mapping or class comes first.
fn find_handler(lines: &[&str], ann: &Annotation<'_>) -> String {
    let following = lines.iter().skip(ann.end_line + 1).copied();
    for text in std::iter::once(ann.rest).chain(following) {
        let trimmed = text.trim();
        if let Some(decl) = java::after_visibility(trimmed) {
            return declared_name(decl).unwrap_or_default().to_string();
        }
        if java::class_name(trimmed).is_some() || starts_with_mapping(trimmed) {
            break;
        }
    }
    String::new()
}

fn starts_with_mapping(trimmed: &str) -> bool {
    trimmed
        .strip_prefix('@')
        .map(|rest| {
            MAPPINGS.iter().any(|m| {
                rest.strip_prefix(m)
                    .is_some_and(|after| !after.starts_with(|c: char| c.is_alphanumeric()))
            })
        })
        .unwrap_or(false)
}
