use crate::errors::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Directory names that hold third-party or generated code, never routes of
/// the project under scan.
pub const DEPENDENCY_DIRS: [&str; 8] = [
    "node_modules",
    "vendor",
    "target",
    "venv",
    "__pycache__",
    "site-packages",
    "build",
    "dist",
];

/// Test sources skipped unless `include_tests` is set.
pub const DEFAULT_TEST_EXCLUDES: [&str; 4] = ["*_test.go", "test_*.py", "*_test.py", "**/src/test/**"];

/// Include/exclude rules applied to every candidate file.
#[derive(Debug, Clone)]
pub struct PathFilter {
    exclude: GlobSet,
    include: Option<GlobSet>,
}

impl PathFilter {
    /// Compile include/exclude globs, adding the default test excludes
    /// unless `include_tests`.
    pub fn new(
        include_patterns: &[String],
        exclude_patterns: &[String],
        include_tests: bool,
    ) -> Result<Self> {
        let mut excludes: Vec<&str> = exclude_patterns.iter().map(String::as_str).collect();
        if !include_tests {
            excludes.extend(DEFAULT_TEST_EXCLUDES);
        }
        let include = if include_patterns.is_empty() {
            None
        } else {
            let patterns: Vec<&str> = include_patterns.iter().map(String::as_str).collect();
            Some(build_globset(&patterns)?)
        };
        Ok(Self {
            exclude: build_globset(&excludes)?,
            include,
        })
    }

    /// Glob check for a file under `root`.
    pub fn allows(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);

        if self.exclude.is_match(relative) || self.exclude.is_match(path) {
            return false;
        }
        // Bare file-name patterns like *_test.go
        if let Some(fname) = path.file_name() {
            if self.exclude.is_match(Path::new(fname)) {
                return false;
            }
        }

        match self.include {
            Some(ref include) => include.is_match(relative) || include.is_match(path),
            None => true,
        }
    }

    /// Full check for a path reported outside a walk (e.g. by a watcher):
    /// under `root`, not inside a hidden or dependency directory, and
    /// allowed by the globs.
    pub fn accepts(&self, root: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        let mut dirs = relative.components().rev().skip(1);
        let skipped = dirs.any(|c| {
            let name = c.as_os_str();
            is_dependency_dir(name) || name.to_str().is_some_and(|n| n.starts_with('.'))
        });
        !skipped && self.allows(root, path)
    }
}

/// Discover candidate source files under `root`.
///
/// - Respects `.gitignore`
/// - Skips hidden and dependency directories
/// - Applies include/exclude glob patterns
/// - Excludes test files unless `include_tests`
/// - Returns sorted paths for deterministic output
pub fn discover_files(
    root: &Path,
    extensions: &BTreeSet<&str>,
    include_patterns: &[String],
    exclude_patterns: &[String],
    include_tests: bool,
) -> Result<Vec<PathBuf>> {
    let filter = PathFilter::new(include_patterns, exclude_patterns, include_tests)?;
    Ok(walk_files(root, extensions, &filter))
}

/// Walk `root` with a compiled filter.
pub fn walk_files(root: &Path, extensions: &BTreeSet<&str>, filter: &PathFilter) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && entry.depth() > 0 && is_dependency_dir(entry.file_name()))
        })
        .build();

    let mut files = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let ext_match = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.contains(ext));
        if !ext_match || !filter.allows(root, path) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    files
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn is_dependency_dir(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| DEPENDENCY_DIRS.contains(&n))
}
