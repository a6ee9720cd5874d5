use crate::config::ResolvedConfig;
use std::io::Write;

/// Render `config show` output.
pub fn render_show<W: Write>(w: &mut W, config: &ResolvedConfig) -> std::io::Result<()> {
    if config.loaded_files.is_empty() {
        writeln!(w, "Loaded config files: (none)")?;
    } else {
        writeln!(w, "Loaded config files:")?;
        for (i, path) in config.loaded_files.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, path.display())?;
        }
    }
    writeln!(w)?;

    writeln!(w, "Resolved settings:")?;
    for (key, source) in config.provenance.sorted_entries() {
        writeln!(w, "  {}: {} <- {}", key, value_for_key(config, key), source)?;
    }

    if !config.ignore_patterns.is_empty() {
        writeln!(w)?;
        writeln!(w, "Ignore file patterns:")?;
        for pattern in &config.ignore_patterns {
            writeln!(w, "  {pattern}")?;
        }
    }

    Ok(())
}

fn value_for_key(config: &ResolvedConfig, key: &str) -> String {
    match key {
        "defaults.format" => config.format.to_string(),
        "defaults.quiet" => config.quiet.to_string(),
        "defaults.include_tests" => config.include_tests.to_string(),
        "targeting.include" => format!("{:?}", config.include),
        "targeting.exclude" => format!("{:?}", config.exclude),
        "frameworks.enabled" => {
            let names: Vec<&str> = config.frameworks.iter().map(|f| f.tag()).collect();
            format!("{names:?}")
        }
        "watch.debounce_ms" => config.debounce_ms.to_string(),
        _ => "(unknown)".to_string(),
    }
}
