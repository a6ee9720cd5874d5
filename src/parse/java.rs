//! Line scanning shared by the annotation-driven Java parsers.

use crate::parse::common::{brace_counts, call_arguments, is_comment_or_blank};
use once_cell::sync::Lazy;
use regex::Regex;

static CLASS_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^.\w])class\s+([A-Za-z_]\w*)").unwrap());
static ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z_][\w.]*)").unwrap());
static VISIBILITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:public|private|protected)\b").unwrap());

/// Name declared by a `class X` on this line, if any.
pub fn class_name(line: &str) -> Option<&str> {
    CLASS_DECL
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Text following the first visibility modifier, if the line has one.
pub fn after_visibility(line: &str) -> Option<&str> {
    VISIBILITY.find(line).map(|m| &line[m.end()..])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation<'a> {
    /// Simple name, package qualifier stripped
    pub name: &'a str,
    /// Argument text, empty for marker annotations
    pub args: String,
    pub end_line: usize,
    /// Code left on `end_line` after the annotation
    pub rest: &'a str,
}

/// Every annotation that starts on `lines[index]`, with its (possibly
/// multi-line) arguments.
pub fn annotations_on_line<'a>(lines: &[&'a str], index: usize) -> Vec<Annotation<'a>> {
    let line = lines[index];
    let mut found = Vec::new();
    let mut pos = 0;
    while pos < line.len() {
        let Some(caps) = ANNOTATION.captures(&line[pos..]) else {
            break;
        };
        let (Some(whole), Some(qualified)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let end = pos + whole.end();
        let qualified = &line[pos + qualified.start()..pos + qualified.end()];
        let name = qualified.rsplit('.').next().unwrap_or(qualified);
        match call_arguments(lines, index, end) {
            Some(call) => {
                let same_line = call.end_line == index;
                pos = call.end_col;
                found.push(Annotation {
                    name,
                    args: call.text,
                    end_line: call.end_line,
                    rest: &lines[call.end_line][call.end_col..],
                });
                if !same_line {
                    break;
                }
            }
            None => {
                pos = end;
                found.push(Annotation {
                    name,
                    args: String::new(),
                    end_line: index,
                    rest: &line[end..],
                });
            }
        }
    }
    found
}

/// True when the annotation ending on `end_line` (starting on `index`)
/// decorates a class declaration rather than a member.
pub fn annotates_type(lines: &[&str], index: usize, end_line: usize) -> bool {
    if class_name(lines[index]).is_some() || class_name(lines[end_line]).is_some() {
        return true;
    }
    let mut j = end_line + 1;
    while j < lines.len() {
        let trimmed = lines[j].trim();
        if is_comment_or_blank(trimmed) {
            j += 1;
            continue;
        }
        if trimmed.starts_with('@') {
            if class_name(trimmed).is_some() {
                return true;
            }
            let last_end = annotations_on_line(lines, j)
                .last()
                .map(|a| a.end_line)
                .unwrap_or(j);
            j = last_end + 1;
            continue;
        }
        return class_name(trimmed).is_some();
    }
    false
}

/// One class being walked, with parser-specific header data.
#[derive(Debug)]
pub struct ClassScope<T> {
    pub name: String,
    pub data: T,
    open_depth: i32,
    entered: bool,
}

/// Brace-depth tracker for nested class bodies.
#[derive(Debug)]
pub struct ClassScopes<T> {
    scopes: Vec<ClassScope<T>>,
    depth: i32,
}

impl<T> ClassScopes<T> {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            depth: 0,
        }
    }

    /// Start a class declared on the line about to be passed to `advance`.
    pub fn open(&mut self, name: &str, data: T) {
        self.scopes.push(ClassScope {
            name: name.to_string(),
            data,
            open_depth: self.depth,
            entered: false,
        });
    }

    /// Innermost class whose body is being walked.
    pub fn current(&self) -> Option<&ClassScope<T>> {
        self.scopes.iter().rev().find(|s| s.entered)
    }

    /// Account for one line's braces, closing finished class bodies.
    pub fn advance(&mut self, line: &str) {
        let (opens, closes) = brace_counts(line);
        if opens > 0 {
            if let Some(top) = self.scopes.last_mut() {
                top.entered = true;
            }
        }
        self.depth += opens - closes;
        while self
            .scopes
            .last()
            .is_some_and(|top| top.entered && self.depth <= top.open_depth)
        {
            self.scopes.pop();
        }
    }
}

impl<T> Default for ClassScopes<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names() {
        assert_eq!(class_name("public class UserController {"), Some("UserController"));
        assert_eq!(class_name("final class A"), Some("A"));
        assert_eq!(class_name("Foo.class.getName();"), None);
        assert_eq!(class_name("int classCount = 0;"), None);
    }

    #[test]
    fn annotations_with_args() {
        let lines = vec![r#"@GetMapping("/x") @ResponseBody public String x() {"#];
        let anns = annotations_on_line(&lines, 0);
        let names: Vec<_> = anns.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["GetMapping", "ResponseBody"]);
        assert_eq!(anns[0].args, r#""/x""#);
        assert_eq!(anns[1].rest, " public String x() {");
    }

    #[test]
    fn qualified_annotation_uses_simple_name() {
        let lines = vec!["@org.springframework.web.bind.annotation.RestController"];
        let anns = annotations_on_line(&lines, 0);
        assert_eq!(anns[0].name, "RestController");
    }

    #[test]
    fn multi_line_annotation_ends_late() {
        let lines = vec![
            "@RequestMapping(",
            "    value = \"/api\",",
            "    produces = \"application/json\")",
            "public class A {",
        ];
        let anns = annotations_on_line(&lines, 0);
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].end_line, 2);
        assert!(annotates_type(&lines, 0, anns[0].end_line));
    }

    #[test]
    fn member_annotation_is_not_type_level() {
        let lines = vec![
            "@RequestMapping(\"/x\")",
            "// comment",
            "@ResponseBody",
            "public String x() {",
        ];
        assert!(!annotates_type(&lines, 0, 0));

        let typed = vec!["@RequestMapping(\"/x\")", "@Validated", "public class A {"];
        assert!(annotates_type(&typed, 0, 0));
    }

    #[test]
    fn scopes_follow_nesting() {
        let mut scopes: ClassScopes<()> = ClassScopes::new();
        scopes.open("Outer", ());
        scopes.advance("public class Outer {");
        scopes.advance("  void a() {");
        scopes.advance("  }");
        assert_eq!(scopes.current().unwrap().name, "Outer");
        scopes.open("Inner", ());
        scopes.advance("  static class Inner");
        assert_eq!(scopes.current().map(|s| s.name.as_str()), Some("Outer"));
        scopes.advance("  {");
        assert_eq!(scopes.current().unwrap().name, "Inner");
        scopes.advance("  }");
        assert_eq!(scopes.current().unwrap().name, "Outer");
        scopes.advance("}");
        assert!(scopes.current().is_none());
    }

    #[test]
    fn single_line_class_closes_immediately() {
        let mut scopes: ClassScopes<()> = ClassScopes::new();
        scopes.open("Empty", ());
        scopes.advance("class Empty {}");
        assert!(scopes.current().is_none());
    }
}
