pub mod ignore;
pub mod provenance;
pub mod resolve;
pub mod schema;
pub mod show;

use crate::output::OutputFormat;
use crate::parse::Framework;
use provenance::ProvenanceMap;
use std::path::PathBuf;

/// Debounce window for coalescing watch events when nothing overrides it.
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Fully resolved configuration. Every layer has been applied.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub format: OutputFormat,
    pub quiet: bool,
    pub include_tests: bool,

    // Targeting
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub ignore_patterns: Vec<String>,

    /// Parsers to run, in registry priority order
    pub frameworks: Vec<Framework>,
    pub debounce_ms: u64,

    pub provenance: ProvenanceMap,
    pub loaded_files: Vec<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            quiet: false,
            include_tests: false,
            include: Vec::new(),
            exclude: Vec::new(),
            ignore_patterns: Vec::new(),
            frameworks: Framework::PARSED.to_vec(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            provenance: ProvenanceMap::new(),
            loaded_files: Vec::new(),
        }
    }
}

impl ResolvedConfig {
    /// Configured excludes plus `.routescanignore` patterns.
    pub fn exclude_patterns(&self) -> Vec<String> {
        self.exclude
            .iter()
            .chain(self.ignore_patterns.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_every_parser() {
        let config = ResolvedConfig::default();
        assert_eq!(config.frameworks, Framework::PARSED.to_vec());
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    fn excludes_include_ignore_file_patterns() {
        let config = ResolvedConfig {
            exclude: vec!["legacy/**".into()],
            ignore_patterns: vec!["generated/**".into()],
            ..Default::default()
        };
        assert_eq!(config.exclude_patterns(), vec!["legacy/**", "generated/**"]);
    }
}
