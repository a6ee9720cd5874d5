//! Line scanning shared by the decorator-driven Python parsers.

use crate::parse::common::{call_arguments, first_string_literal, indent_of};
use once_cell::sync::Lazy;
use regex::Regex;

static CLASS_DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*class\s+(\w+)").unwrap());
static DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:async\s+)?def\s+(\w+)").unwrap());
static DECORATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*@[\w.]+").unwrap());
static NAMED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\b(?:path|rule)\s*=\s*["']([^"']*)["']"#).unwrap());

/// String value of `keyword` inside the first balanced `ctor(...)` call
/// that passes it. `keyword` captures the value in group 1.
pub fn constructor_keyword(lines: &[&str], ctor: &Regex, keyword: &Regex) -> Option<String> {
    lines.iter().enumerate().find_map(|(i, line)| {
        let call = ctor
            .find_iter(line)
            .find_map(|m| call_arguments(lines, i, m.end()))?;
        keyword
            .captures(&call.text)
            .and_then(|c| c.get(1))
            .map(|v| v.as_str().to_string())
    })
}

pub fn class_name(line: &str) -> Option<&str> {
    CLASS_DEF
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn def_name(line: &str) -> Option<&str> {
    DEF.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn is_blank_or_comment(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Route literal of a decorator or registration call: `path=`/`rule=` if
/// named, else a leading positional string.
pub fn route_literal(args: &str) -> Option<&str> {
    if let Some(m) = NAMED_PATH.captures(args).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    let positional = args.trim_start();
    if positional.starts_with('"') || positional.starts_with('\'') {
        first_string_literal(positional)
    } else {
        None
    }
}

/// Function decorated by the decorator that ends on `end_line`: the next
/// `def`, skipping further decorators. Empty when something else comes first.
pub fn handler_after(lines: &[&str], end_line: usize) -> String {
    let mut j = end_line + 1;
    while j < lines.len() {
        let line = lines[j];
        if is_blank_or_comment(line.trim()) {
            j += 1;
            continue;
        }
        if let Some(m) = DECORATOR.find(line) {
            j = call_arguments(lines, j, m.end())
                .map(|call| call.end_line)
                .unwrap_or(j)
                + 1;
            continue;
        }
        return def_name(line).unwrap_or_default().to_string();
    }
    String::new()
}

/// Closest `class X` above `index`, regardless of nesting.
pub fn nearest_class_before<'a>(lines: &[&'a str], index: usize) -> Option<&'a str> {
    lines[..index].iter().rev().find_map(|l| class_name(l))
}

/// Class whose body contains `lines[index]`, judged by indentation.
pub fn enclosing_class<'a>(lines: &[&'a str], index: usize) -> Option<&'a str> {
    let mut indent = indent_of(lines[index]);
    for line in lines[..index].iter().rev() {
        if indent == 0 {
            break;
        }
        if is_blank_or_comment(line.trim()) {
            continue;
        }
        let outer = indent_of(line);
        if outer < indent {
            if let Some(name) = class_name(line) {
                return Some(name);
            }
            indent = outer;
        }
    }
    None
}
