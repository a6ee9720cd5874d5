use crate::parse::Framework;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// HTTP method of an endpoint. Anything outside the common verbs is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Unknown,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Unknown,
    ];

    /// Map a verb token (any case) onto the closed method set.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            _ => HttpMethod::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an endpoint was declared.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    /// Line of the route annotation or decorator (0-indexed)
    pub line: usize,
}

/// One extracted route declaration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub location: SourceLocation,
    /// Enclosing class or struct, `"main"` when there is none
    pub owner: String,
    /// Function serving the route, empty when unresolved
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<Framework>,
}

/// Owner name used when no enclosing type is found.
pub const DEFAULT_OWNER: &str = "main";

impl Endpoint {
    pub fn new(
        path: String,
        method: HttpMethod,
        file: &Path,
        line: usize,
        owner: impl Into<String>,
        handler: impl Into<String>,
        framework: Framework,
    ) -> Self {
        Self {
            path,
            method,
            location: SourceLocation {
                file: file.to_path_buf(),
                line,
            },
            owner: owner.into(),
            handler: handler.into(),
            framework: Some(framework),
        }
    }
}

/// Join route fragments into one path: a single leading `/`, no empty
/// segments, no trailing `/` unless the result is the root.
pub fn compose_path(parts: &[&str]) -> String {
    let segments: Vec<&str> = parts
        .iter()
        .flat_map(|p| p.split('/'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Normalize a prefix (class mapping, group, blueprint) so it can be
/// concatenated: leading `/`, no trailing `/`, and the root becomes empty.
pub fn normalize_prefix(prefix: &str) -> String {
    let composed = compose_path(&[prefix]);
    if composed == "/" {
        String::new()
    } else {
        composed
    }
}

/// First double-quoted literal on a line (Java and Go string syntax).
pub fn first_double_quoted(line: &str) -> Option<&str> {
    let start = line.find('"')?;
    let rest = &line[start + 1..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// First single- or double-quoted literal (Python string syntax).
pub fn first_string_literal(text: &str) -> Option<&str> {
    let (start, quote) = text.char_indices().find(|(_, c)| *c == '"' || *c == '\'')?;
    let rest = &text[start + 1..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

static CALL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\s*\(").unwrap());

/// Name of the first `<name>(` call-like token on a declaration line.
pub fn declared_name(line: &str) -> Option<&str> {
    CALL_NAME
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Count of leading whitespace characters.
pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Opening and closing braces on one line, ignoring braces inside string
/// and char literals and after a `//` comment.
pub fn brace_counts(line: &str) -> (i32, i32) {
    let mut opens = 0;
    let mut closes = 0;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut prev = '\0';
    for c in line.chars() {
        if let Some(q) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            '/' if prev == '/' => break,
            '{' => opens += 1,
            '}' => closes += 1,
            _ => {}
        }
        prev = c;
    }
    (opens, closes)
}

/// Calls spanning more lines than this are treated as unterminated.
const MAX_CALL_LINES: usize = 20;

/// Arguments of a call whose opening parenthesis is the first non-blank
/// character at or after `col` on `lines[start]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgs {
    /// Text between the outer parentheses, continuation lines joined by `\n`
    pub text: String,
    /// Line holding the closing parenthesis
    pub end_line: usize,
    /// Byte offset just past the closing parenthesis on `end_line`
    pub end_col: usize,
}

/// Collect the balanced argument text of a call that may span several lines.
/// Returns `None` when no call opens at `col` or it never closes.
pub fn call_arguments(lines: &[&str], start: usize, col: usize) -> Option<CallArgs> {
    let rest = lines.get(start)?.get(col..)?;
    let open = col + rest.find(|c: char| !c.is_whitespace())?;
    if !lines[start][open..].starts_with('(') {
        return None;
    }

    let mut text = String::new();
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (li, line) in lines
        .iter()
        .enumerate()
        .skip(start)
        .take(MAX_CALL_LINES)
    {
        let offset = if li == start { open } else { 0 };
        for (ci, c) in line[offset..].char_indices() {
            if let Some(q) = in_string {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    in_string = None;
                }
                text.push(c);
                continue;
            }
            match c {
                '"' | '\'' => in_string = Some(c),
                '(' => {
                    depth += 1;
                    if depth == 1 {
                        continue;
                    }
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(CallArgs {
                            text,
                            end_line: li,
                            end_col: offset + ci + 1,
                        });
                    }
                }
                _ => {}
            }
            text.push(c);
        }
        text.push('\n');
    }
    None
}

/// True for lines that carry no code: blanks and comments.
pub fn is_comment_or_blank(trimmed: &str) -> bool {
    trimmed.is_empty()
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with('#')
}
