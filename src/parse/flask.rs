use crate::parse::common::{
    call_arguments, compose_path, first_string_literal, indent_of, normalize_prefix, Endpoint,
    HttpMethod, DEFAULT_OWNER,
};
use crate::parse::python;
use crate::parse::{Framework, FrameworkParser};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

static BLUEPRINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bBlueprint\b").unwrap());
static URL_PREFIX_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\burl_prefix\s*=\s*["']([^"']*)["']"#).unwrap());
static VERB_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:async\s+)?def\s+(get|post|put|delete|patch)\s*\(").unwrap());
static ADD_RESOURCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.add_resource\b").unwrap());
static RESOURCE_ARGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*([\w.]+)\s*,\s*["']([^"']*)["']"#).unwrap());
static ROUTE_DECORATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*@[\w.]+\.route\b").unwrap());
static ADD_URL_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.add_url_rule\b").unwrap());
static METHODS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"methods\s*=\s*[\[(]([^\])]*)[\])]").unwrap());
static VIEW_FUNC: Lazy<Regex> = Lazy::new(|| Regex::new(r"view_func\s*=\s*([\w.]+)").unwrap());

/// Flask routes (`@app.route`, `add_url_rule`) and Flask-RESTful resources
/// (`api.add_resource`).
pub struct FlaskParser;

impl FrameworkParser for FlaskParser {
    fn framework(&self) -> Framework {
        Framework::Flask
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["py"]
    }

    fn can_parse(&self, _path: &Path, content: &str) -> bool {
        content.contains("from flask")
            || content.contains("import flask")
            || content.contains("@app.route")
            || content.contains(".add_resource(")
    }

    fn parse_file(&self, path: &Path, content: &str) -> Vec<Endpoint> {
        let lines: Vec<&str> = content.lines().collect();
        let resources = resource_methods(&lines);
        let prefix = python::constructor_keyword(&lines, &BLUEPRINT, &URL_PREFIX_ARG)
            .map(|p| normalize_prefix(&p))
            .unwrap_or_default();

        let mut endpoints = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if line.trim_start().starts_with('#') {
                continue;
            }

            if let Some(m) = ADD_RESOURCE.find(line) {
                let Some(call) = call_arguments(&lines, i, m.end()) else {
                    continue;
                };
                let Some(caps) = RESOURCE_ARGS.captures(&call.text) else {
                    continue;
                };
                let (Some(class), Some(route)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let class = simple_name(class.as_str());
                let methods = resources
                    .get(class)
                    .filter(|m| !m.is_empty())
                    .cloned()
                    .unwrap_or_else(|| vec![HttpMethod::Get]);
                for method in methods {
                    endpoints.push(Endpoint::new(
                        compose_path(&[&prefix, route.as_str()]),
                        method,
                        path,
                        i,
                        class,
                        method.as_str().to_lowercase(),
                        Framework::FlaskRestful,
                    ));
                }
            } else if let Some(m) = ROUTE_DECORATOR.find(line) {
                let Some(call) = call_arguments(&lines, i, m.end()) else {
                    continue;
                };
                let Some(route) = python::route_literal(&call.text) else {
                    continue;
                };
                let handler = python::handler_after(&lines, call.end_line);
                let owner = python::enclosing_class(&lines, i).unwrap_or(DEFAULT_OWNER);
                for method in declared_methods(&call.text) {
                    endpoints.push(Endpoint::new(
                        compose_path(&[&prefix, route]),
                        method,
                        path,
                        i,
                        owner,
                        handler.as_str(),
                        Framework::Flask,
                    ));
                }
            } else if let Some(m) = ADD_URL_RULE.find(line) {
                let Some(call) = call_arguments(&lines, i, m.end()) else {
                    continue;
                };
                let Some(route) = python::route_literal(&call.text) else {
                    continue;
                };
                let view = VIEW_FUNC
                    .captures(&call.text)
                    .and_then(|c| c.get(1))
                    .map(|v| v.as_str().trim_end_matches(".as_view"))
                    .unwrap_or_default();
                let owner = python::enclosing_class(&lines, i).unwrap_or(DEFAULT_OWNER);
                for method in declared_methods(&call.text) {
                    endpoints.push(Endpoint::new(
                        compose_path(&[&prefix, route]),
                        method,
                        path,
                        i,
                        owner,
                        view,
                        Framework::Flask,
                    ));
                }
            }
        }
        endpoints
    }
}

/// First pass: HTTP-verb methods defined by each class, in definition order.
fn resource_methods(lines: &[&str]) -> HashMap<String, Vec<HttpMethod>> {
    let mut resources = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(name) = python::class_name(line) else {
            continue;
        };
        let class_indent = indent_of(line);
        let mut methods: Vec<HttpMethod> = Vec::new();
        for body in &lines[i + 1..] {
            let trimmed = body.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if indent_of(body) <= class_indent {
                break;
            }
            if let Some(verb) = VERB_METHOD.captures(body).and_then(|c| c.get(1)) {
                let method = HttpMethod::from_token(verb.as_str());
                if !methods.contains(&method) {
                    methods.push(method);
                }
            }
        }
        resources.insert(name.to_string(), methods);
    }
    resources
}

/// Methods listed in a `methods=[...]` argument, GET when absent.
fn declared_methods(args: &str) -> Vec<HttpMethod> {
    let mut methods: Vec<HttpMethod> = Vec::new();
    if let Some(list) = METHODS.captures(args).and_then(|c| c.get(1)) {
        for item in list.as_str().split(',') {
            let token = first_string_literal(item).unwrap_or(item.trim());
            if token.is_empty() {
                continue;
            }
            let method = HttpMethod::from_token(token);
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
    }
    if methods.is_empty() {
        methods.push(HttpMethod::Get);
    }
    methods
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(content: &str) -> Vec<Endpoint> {
        FlaskParser.parse_file(Path::new("app.py"), content)
    }

    fn routes(endpoints: &[Endpoint]) -> Vec<(String, HttpMethod, String)> {
        endpoints
            .iter()
            .map(|e| (e.path.clone(), e.method, e.handler.clone()))
            .collect()
    }

    #[test]
    fn restful_resource_expands_per_method() {
        let src = r#"from flask import Flask
from flask_restful import Api, Resource

app = Flask(__name__)
api = Api(app)


class UserResource(Resource):
    def get(self):
        return {"users": []}

    def post(self):
        return {}, 201


api.add_resource(UserResource, "/users")
"#;
        let eps = parse(src);
        assert_eq!(
            routes(&eps),
            vec![
                ("/users".into(), HttpMethod::Get, "get".into()),
                ("/users".into(), HttpMethod::Post, "post".into()),
            ]
        );
        assert!(eps.iter().all(|e| e.owner == "UserResource"));
        assert!(eps
            .iter()
            .all(|e| e.framework == Some(Framework::FlaskRestful)));
        assert_eq!(eps[0].location.line, 15);
    }

    #[test]
    fn resource_without_verbs_defaults_to_get() {
        let src = r#"from flask_restful import Resource
class Health(Resource):
    def helper(self):
        pass

api.add_resource(Health, '/health')
api.add_resource(resources.Unknown, '/unknown')
"#;
        assert_eq!(
            routes(&parse(src)),
            vec![
                ("/health".into(), HttpMethod::Get, "get".into()),
                ("/unknown".into(), HttpMethod::Get, "get".into()),
            ]
        );
    }

    #[test]
    fn route_decorators_with_methods() {
        let src = r#"from flask import Flask
app = Flask(__name__)

@app.route("/")
def index():
    return "hi"

@app.route('/items', methods=['GET', 'POST'])
def items():
    return []

@app.route(
    "/items/<int:item_id>",
    methods=("DELETE",),
)
def delete_item(item_id):
    return ""
"#;
        let eps = parse(src);
        assert_eq!(
            routes(&eps),
            vec![
                ("/".into(), HttpMethod::Get, "index".into()),
                ("/items".into(), HttpMethod::Get, "items".into()),
                ("/items".into(), HttpMethod::Post, "items".into()),
                ("/items/<int:item_id>".into(), HttpMethod::Delete, "delete_item".into()),
            ]
        );
        assert!(eps.iter().all(|e| e.owner == "main"));
        assert!(eps.iter().all(|e| e.framework == Some(Framework::Flask)));
    }

    #[test]
    fn blueprint_prefix_applies_to_all_styles() {
        let src = r#"from flask import Blueprint
bp = Blueprint("admin", __name__, url_prefix="/admin")

@bp.route("/stats")
def stats():
    pass

class Report(MethodView):
    def get(self):
        pass

bp.add_url_rule("/reports", view_func=Report.as_view("reports"), methods=["GET", "PUT"])
api.add_resource(Report, "/report")
"#;
        let eps = parse(src);
        let got: Vec<_> = eps
            .iter()
            .map(|e| (e.path.as_str(), e.method, e.handler.as_str(), e.framework))
            .collect();
        assert_eq!(
            got,
            vec![
                ("/admin/stats", HttpMethod::Get, "stats", Some(Framework::Flask)),
                ("/admin/reports", HttpMethod::Get, "Report", Some(Framework::Flask)),
                ("/admin/reports", HttpMethod::Put, "Report", Some(Framework::Flask)),
                ("/admin/report", HttpMethod::Get, "get", Some(Framework::FlaskRestful)),
            ]
        );
    }

    #[test]
    fn blueprint_prefix_after_nested_call() {
        let src = r#"from flask import Blueprint
bp = Blueprint(
    name("admin"), __name__,
    url_prefix="/admin",
)

@bp.route("/users")
def users():
    pass
"#;
        assert_eq!(
            routes(&parse(src)),
            vec![("/admin/users".into(), HttpMethod::Get, "users".into())]
        );
    }

    #[test]
    fn decorated_method_owned_by_class() {
        let src = r#"from flask import Flask
class Views:
    @app.route("/inside")
    def inside(self):
        pass
"#;
        let eps = parse(src);
        assert_eq!(eps[0].owner, "Views");
        assert_eq!(eps[0].handler, "inside");
    }

    #[test]
    fn commented_routes_are_ignored() {
        let src = "from flask import Flask\n# @app.route('/old')\n@app.route('/new')\ndef new():\n    pass\n";
        assert_eq!(
            routes(&parse(src)),
            vec![("/new".into(), HttpMethod::Get, "new".into())]
        );
    }

    #[test]
    fn detection() {
        let p = Path::new("app.py");
        assert!(FlaskParser.can_parse(p, "from flask import Flask"));
        assert!(FlaskParser.can_parse(p, "api.add_resource(X, '/x')"));
        assert!(!FlaskParser.can_parse(p, "import os\nprint('hi')"));
    }
}
