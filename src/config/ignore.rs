use std::path::Path;

pub const IGNORE_FILE_NAME: &str = ".routescanignore";

/// Load `.routescanignore` from the nearest directory at or above `start`.
/// Lines are gitignore-style globs; blanks and `#` comments are skipped.
pub fn load_ignore_file(start: &Path) -> Vec<String> {
    for dir in start.ancestors() {
        let ignore_path = dir.join(IGNORE_FILE_NAME);
        if !ignore_path.is_file() {
            continue;
        }
        match std::fs::read_to_string(&ignore_path) {
            Ok(content) => return parse_ignore_patterns(&content),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", ignore_path.display(), e);
                return Vec::new();
            }
        }
    }
    Vec::new()
}

/// A trailing `/` marks a directory; it becomes a `/**` glob so globset
/// can match the files beneath it.
fn parse_ignore_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| match l.strip_suffix('/') {
            Some(dir) => format!("{dir}/**"),
            None => l.to_string(),
        })
        .collect()
}
