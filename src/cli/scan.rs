use crate::cli::ScanOptions;
use crate::config::resolve::{resolve_config, CliOverrides};
use crate::config::ResolvedConfig;
use crate::errors::{Result, RouteScanError};
use crate::index::{DiskSource, EndpointIndex, ScanReport};
use crate::output::json::Metadata;
use crate::output::OutputFormat;
use crate::parse::{Endpoint, ParserRegistry};
use clap::Args;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    pub path: PathBuf,

    #[command(flatten)]
    pub options: ScanOptions,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive text matched against path, method, owner, handler and framework
    pub query: String,

    /// Directory to scan
    pub path: PathBuf,

    #[command(flatten)]
    pub options: ScanOptions,
}

/// Resolved configuration, disk source and index for one root directory.
pub struct Session {
    pub root: PathBuf,
    pub config: ResolvedConfig,
    pub source: DiskSource,
    pub index: EndpointIndex,
}

impl Session {
    pub fn open(path: &Path, overrides: &CliOverrides) -> Result<Self> {
        let root = path
            .canonicalize()
            .map_err(|_| RouteScanError::NoFiles {
                path: path.to_path_buf(),
            })?;
        let config = resolve_config(&root, overrides)?;
        let source = DiskSource::new(
            &root,
            &config.include,
            &config.exclude_patterns(),
            config.include_tests,
        )?;
        let registry = Arc::new(ParserRegistry::with_frameworks(&config.frameworks));
        tracing::debug!("Enabled parsers: {:?}", registry.frameworks());
        Ok(Self {
            root,
            config,
            source,
            index: EndpointIndex::new(registry),
        })
    }

    /// Full scan behind a spinner (unless quiet).
    pub fn scan(&self) -> ScanReport {
        let progress = if !self.config.quiet {
            let pb = indicatif::ProgressBar::new_spinner();
            if let Ok(style) = indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.green} Scanning {msg} ({elapsed})")
            {
                pb.set_style(style);
            }
            pb.set_message(self.root.display().to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            Some(pb)
        } else {
            None
        };

        let report = self.index.full_scan(&self.source);

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        report
    }

    /// Print endpoints in the configured format.
    pub fn print<W: Write>(
        &self,
        writer: &mut W,
        report: &ScanReport,
        endpoints: &[Endpoint],
        query: Option<&str>,
        elapsed: Duration,
    ) -> Result<()> {
        match self.config.format {
            OutputFormat::Json => {
                let mut metadata =
                    Metadata::from_report(&self.root, report, elapsed.as_millis() as u64);
                metadata.query = query.map(str::to_string);
                crate::output::json::write_scan_json(writer, metadata, endpoints)?;
            }
            OutputFormat::Text => {
                crate::output::text::write_endpoints_text(writer, &self.root, endpoints)?;
            }
        }
        Ok(())
    }
}

pub fn run_scan(args: &ScanArgs) -> Result<()> {
    scan_and_print(&args.path, &args.options, None)
}

pub fn run_search(args: &SearchArgs) -> Result<()> {
    scan_and_print(&args.path, &args.options, Some(&args.query))
}

fn scan_and_print(path: &Path, options: &ScanOptions, query: Option<&str>) -> Result<()> {
    let start = Instant::now();
    let session = Session::open(path, &options.overrides())?;
    let report = session.scan();

    if report.files_scanned == 0 {
        return Err(RouteScanError::NoFiles { path: session.root });
    }

    let endpoints = match query {
        Some(q) => session.index.filter(q),
        None => session.index.all_endpoints(),
    };

    let elapsed = start.elapsed();
    let mut stdout = std::io::stdout();
    session.print(&mut stdout, &report, &endpoints, query, elapsed)?;

    if !session.config.quiet {
        let matched = match query {
            Some(q) => format!(" ({} matching '{}')", endpoints.len(), q),
            None => String::new(),
        };
        eprintln!(
            "Found {} endpoints{} in {} of {} files in {:.2}s",
            report.endpoint_count,
            matched,
            report.files_matched,
            report.files_scanned,
            elapsed.as_secs_f64()
        );
    }

    Ok(())
}
