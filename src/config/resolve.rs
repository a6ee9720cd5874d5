use crate::config::ignore::load_ignore_file;
use crate::config::provenance::{ProvenanceMap, Source};
use crate::config::schema::FileConfig;
use crate::config::ResolvedConfig;
use crate::errors::{Result, RouteScanError};
use crate::output::OutputFormat;
use crate::parse::Framework;
use clap::ValueEnum;
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG_NAME: &str = ".routescan.toml";

/// Every key `config show` reports.
const KEYS: [&str; 7] = [
    "defaults.format",
    "defaults.quiet",
    "defaults.include_tests",
    "targeting.include",
    "targeting.exclude",
    "frameworks.enabled",
    "watch.debounce_ms",
];

/// CLI overrides extracted from command arguments.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub format: Option<OutputFormat>,
    pub quiet: bool,
    pub include_tests: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub frameworks: Vec<Framework>,
    pub debounce_ms: Option<u64>,
}

/// Resolve configuration by applying layers bottom-up:
/// 1. Built-in defaults
/// 2. User config (~/.config/routescan/config.toml)
/// 3. Project config (nearest .routescan.toml walking up from working_dir)
/// 4. Environment variables
/// 5. CLI overrides
pub fn resolve_config(working_dir: &Path, cli: &CliOverrides) -> Result<ResolvedConfig> {
    resolve_with_env(working_dir, cli, |key| std::env::var(key).ok())
}

/// `resolve_config` with an explicit environment lookup.
pub fn resolve_with_env(
    working_dir: &Path,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let mut config = ResolvedConfig::default();
    let mut prov = ProvenanceMap::with_defaults(&KEYS);
    let mut loaded_files = Vec::new();

    if let Some(path) = find_user_config().filter(|p| p.is_file()) {
        let file = load_file_config(&path, "user")?;
        apply_file_config(&mut config, &file, Source::UserConfig(path.clone()), &mut prov)?;
        loaded_files.push(path);
    }

    if let Some(path) = find_project_config(working_dir) {
        let file = load_file_config(&path, "project")?;
        apply_file_config(&mut config, &file, Source::ProjectConfig(path.clone()), &mut prov)?;
        loaded_files.push(path);
    }

    apply_env_vars(&mut config, &mut prov, env)?;
    apply_cli_overrides(&mut config, cli, &mut prov);

    if config.debounce_ms == 0 {
        let origin = prov
            .get("watch.debounce_ms")
            .map(ToString::to_string)
            .unwrap_or_default();
        return Err(RouteScanError::Config(format!(
            "Invalid debounce 0 in {origin}: expected at least 1 millisecond"
        )));
    }

    config.ignore_patterns = load_ignore_file(working_dir);
    config.provenance = prov;
    config.loaded_files = loaded_files;

    Ok(config)
}

fn find_user_config() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("routescan").join("config.toml"))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_NAME))
        .find(|p| p.is_file())
}

fn load_file_config(path: &Path, layer: &str) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|_| {
        RouteScanError::Config(format!("Could not read {layer} config: {}", path.display()))
    })?;
    FileConfig::from_toml(&content)
        .map_err(|e| RouteScanError::Config(format!("Invalid {layer} config: {e}")))
}

fn apply_file_config(
    config: &mut ResolvedConfig,
    file: &FileConfig,
    source: Source,
    prov: &mut ProvenanceMap,
) -> Result<()> {
    if let Some(ref format) = file.defaults.format {
        config.format = parse_format(format, &source)?;
        prov.set("defaults.format", source.clone());
    }
    if let Some(quiet) = file.defaults.quiet {
        config.quiet = quiet;
        prov.set("defaults.quiet", source.clone());
    }
    if let Some(include_tests) = file.defaults.include_tests {
        config.include_tests = include_tests;
        prov.set("defaults.include_tests", source.clone());
    }

    if !file.targeting.include.is_empty() {
        config.include = file.targeting.include.clone();
        prov.set("targeting.include", source.clone());
    }
    if !file.targeting.exclude.is_empty() {
        config.exclude = file.targeting.exclude.clone();
        prov.set("targeting.exclude", source.clone());
    }

    if let Some(ref enabled) = file.frameworks.enabled {
        config.frameworks = parse_frameworks(enabled, &source)?;
        prov.set("frameworks.enabled", source.clone());
    }

    if let Some(debounce_ms) = file.watch.debounce_ms {
        config.debounce_ms = debounce_ms;
        prov.set("watch.debounce_ms", source);
    }
    Ok(())
}

fn apply_env_vars(
    config: &mut ResolvedConfig,
    prov: &mut ProvenanceMap,
    env: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(val) = env("ROUTESCAN_FORMAT") {
        let source = Source::EnvVar("ROUTESCAN_FORMAT".into());
        config.format = parse_format(&val, &source)?;
        prov.set("defaults.format", source);
    }
    if let Some(val) = env("ROUTESCAN_QUIET") {
        config.quiet = parse_bool(&val);
        prov.set("defaults.quiet", Source::EnvVar("ROUTESCAN_QUIET".into()));
    }
    if let Some(val) = env("ROUTESCAN_INCLUDE_TESTS") {
        config.include_tests = parse_bool(&val);
        prov.set(
            "defaults.include_tests",
            Source::EnvVar("ROUTESCAN_INCLUDE_TESTS".into()),
        );
    }
    if let Some(val) = env("ROUTESCAN_INCLUDE") {
        config.include = split_list(&val);
        prov.set("targeting.include", Source::EnvVar("ROUTESCAN_INCLUDE".into()));
    }
    if let Some(val) = env("ROUTESCAN_EXCLUDE") {
        config.exclude = split_list(&val);
        prov.set("targeting.exclude", Source::EnvVar("ROUTESCAN_EXCLUDE".into()));
    }
    if let Some(val) = env("ROUTESCAN_FRAMEWORKS") {
        let source = Source::EnvVar("ROUTESCAN_FRAMEWORKS".into());
        config.frameworks = parse_frameworks(&split_list(&val), &source)?;
        prov.set("frameworks.enabled", source);
    }
    if let Some(val) = env("ROUTESCAN_DEBOUNCE_MS") {
        config.debounce_ms = val.trim().parse().map_err(|_| {
            RouteScanError::Config(format!(
                "Invalid debounce '{val}' in env var (ROUTESCAN_DEBOUNCE_MS): expected milliseconds"
            ))
        })?;
        prov.set(
            "watch.debounce_ms",
            Source::EnvVar("ROUTESCAN_DEBOUNCE_MS".into()),
        );
    }
    Ok(())
}

fn apply_cli_overrides(config: &mut ResolvedConfig, cli: &CliOverrides, prov: &mut ProvenanceMap) {
    if let Some(format) = cli.format {
        config.format = format;
        prov.set("defaults.format", Source::CliFlag("--format".into()));
    }
    if cli.quiet {
        config.quiet = true;
        prov.set("defaults.quiet", Source::CliFlag("--quiet".into()));
    }
    if cli.include_tests {
        config.include_tests = true;
        prov.set(
            "defaults.include_tests",
            Source::CliFlag("--include-tests".into()),
        );
    }
    if !cli.include.is_empty() {
        config.include = cli.include.clone();
        prov.set("targeting.include", Source::CliFlag("--include".into()));
    }
    if !cli.exclude.is_empty() {
        config.exclude = cli.exclude.clone();
        prov.set("targeting.exclude", Source::CliFlag("--exclude".into()));
    }
    if !cli.frameworks.is_empty() {
        config.frameworks = in_priority_order(&cli.frameworks);
        prov.set("frameworks.enabled", Source::CliFlag("--framework".into()));
    }
    if let Some(debounce_ms) = cli.debounce_ms {
        config.debounce_ms = debounce_ms;
        prov.set("watch.debounce_ms", Source::CliFlag("--debounce-ms".into()));
    }
}

fn parse_format(value: &str, source: &Source) -> Result<OutputFormat> {
    OutputFormat::from_str(value.trim(), true).map_err(|_| {
        RouteScanError::Config(format!(
            "Invalid format '{value}' in {source}: expected json or text"
        ))
    })
}

fn parse_frameworks(names: &[String], source: &Source) -> Result<Vec<Framework>> {
    let parsed = names
        .iter()
        .map(|n| {
            n.parse::<Framework>()
                .map_err(|e| RouteScanError::Config(format!("{e} in {source}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(in_priority_order(&parsed))
}

/// Parser frameworks named by `selected`, deduplicated, in registry order.
fn in_priority_order(selected: &[Framework]) -> Vec<Framework> {
    Framework::PARSED
        .iter()
        .filter(|fw| selected.iter().any(|s| s.parser_framework() == **fw))
        .copied()
        .collect()
}

fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
