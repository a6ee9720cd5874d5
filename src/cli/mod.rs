pub mod config;
pub mod scan;
pub mod watch;

use crate::config::resolve::CliOverrides;
use crate::errors::Result;
use crate::output::OutputFormat;
use crate::parse::Framework;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "routescan",
    version,
    about = "Index HTTP endpoints declared in Spring, JAX-RS, Gin, Echo, FastAPI and Flask code"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every endpoint under a directory
    Scan(scan::ScanArgs),
    /// List endpoints matching a query
    Search(scan::SearchArgs),
    /// Keep the endpoint list current while files change
    Watch(watch::WatchArgs),
    /// Inspect configuration
    Config(config::ConfigArgs),
}

/// Flags shared by every command that scans.
#[derive(Debug, Args)]
pub struct ScanOptions {
    /// Output format
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Only run these framework parsers (repeatable)
    #[arg(long = "framework", value_parser = parse_framework)]
    pub frameworks: Vec<Framework>,

    /// Include glob patterns
    #[arg(long)]
    pub include: Vec<String>,

    /// Exclude glob patterns
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Include test sources (*_test.go, test_*.py, src/test/**)
    #[arg(long)]
    pub include_tests: bool,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,
}

impl ScanOptions {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            format: self.format,
            quiet: self.quiet,
            include_tests: self.include_tests,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            frameworks: self.frameworks.clone(),
            debounce_ms: None,
        }
    }
}

fn parse_framework(s: &str) -> std::result::Result<Framework, String> {
    s.parse()
}

/// Dispatch to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan(args) => scan::run_scan(&args),
        Commands::Search(args) => scan::run_search(&args),
        Commands::Watch(args) => watch::run(&args),
        Commands::Config(args) => config::run(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shared_flags() {
        let cli = Cli::try_parse_from([
            "routescan",
            "scan",
            "src",
            "--format",
            "json",
            "--framework",
            "spring",
            "--framework",
            "jax-rs",
            "--exclude",
            "legacy/**",
            "--quiet",
        ])
        .unwrap();
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        let overrides = args.options.overrides();
        assert_eq!(overrides.format, Some(OutputFormat::Json));
        assert_eq!(overrides.frameworks, vec![Framework::Spring, Framework::JaxRs]);
        assert_eq!(overrides.exclude, vec!["legacy/**".to_string()]);
        assert!(overrides.quiet);
    }

    #[test]
    fn rejects_unknown_framework() {
        let result = Cli::try_parse_from(["routescan", "scan", ".", "--framework", "django"]);
        assert!(result.is_err());
    }

    #[test]
    fn search_takes_query_then_path() {
        let cli = Cli::try_parse_from(["routescan", "search", "users", "svc"]).unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query, "users");
        assert_eq!(args.path, std::path::PathBuf::from("svc"));
    }
}
