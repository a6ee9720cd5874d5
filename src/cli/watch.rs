use crate::cli::scan::Session;
use crate::cli::ScanOptions;
use crate::errors::Result;
use crate::index::{EndpointIndex, Revalidation, ScanReport, SourceProvider};
use clap::Args;
use notify::event::ModifyKind;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Directory to watch
    pub path: PathBuf,

    /// Only print endpoints matching this query
    #[arg(long)]
    pub query: Option<String>,

    /// Quiet period before the endpoint list is re-printed
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    #[command(flatten)]
    pub options: ScanOptions,
}

/// A filesystem event reduced to what the index cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

/// Map a raw watcher event onto index operations. Renames report the new
/// name as changed and the old name as removed.
pub fn classify_event(event: &Event) -> Vec<FileEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.iter().cloned().map(FileEvent::Changed).collect(),
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                if p.exists() {
                    FileEvent::Changed(p.clone())
                } else {
                    FileEvent::Removed(p.clone())
                }
            })
            .collect(),
        EventKind::Modify(_) => event.paths.iter().cloned().map(FileEvent::Changed).collect(),
        EventKind::Remove(_) => event.paths.iter().cloned().map(FileEvent::Removed).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Forward one event to the index. Returns the outcome when the index was
/// consulted.
pub fn apply_event(
    index: &EndpointIndex,
    source: &dyn SourceProvider,
    extensions: &BTreeSet<&'static str>,
    event: &FileEvent,
) -> Option<Revalidation> {
    let path = match event {
        FileEvent::Changed(p) | FileEvent::Removed(p) => p,
    };
    let relevant = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(ext));
    if !relevant {
        return None;
    }

    let outcome = match event {
        FileEvent::Removed(path) => index.on_file_deleted(path),
        FileEvent::Changed(path) => match index.on_file_changed(path, source) {
            Ok(outcome) => outcome,
            // Deleted between the event and the stat
            Err(e) if e.is_not_found() => index.on_file_deleted(path),
            Err(e) => {
                tracing::warn!("{}", e);
                return None;
            }
        },
    };
    tracing::info!("{} -> {:?}", path.display(), outcome);
    Some(outcome)
}

pub fn run(args: &WatchArgs) -> Result<()> {
    let mut overrides = args.options.overrides();
    overrides.debounce_ms = args.debounce_ms;
    let session = Session::open(&args.path, &overrides)?;
    let debounce = Duration::from_millis(session.config.debounce_ms);
    let extensions = session.index.registry().supported_extensions();
    let changes = session.index.subscribe();

    let start = Instant::now();
    let report = session.scan();
    print_current(&session, &report, args.query.as_deref(), start)?;
    // Initial scan already printed
    while changes.try_recv().is_ok() {}

    let (watch_tx, watch_rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(watch_tx, NotifyConfig::default())?;
    watcher.watch(&session.root, RecursiveMode::Recursive)?;
    if !session.config.quiet {
        eprintln!(
            "Watching {} ({} endpoints in {} files)",
            session.root.display(),
            report.endpoint_count,
            report.files_matched
        );
    }

    loop {
        match watch_rx.recv_timeout(debounce) {
            Ok(Ok(event)) => {
                for file_event in classify_event(&event) {
                    let path = match &file_event {
                        FileEvent::Changed(p) | FileEvent::Removed(p) => p,
                    };
                    if path.is_dir() {
                        continue;
                    }
                    apply_event(&session.index, &session.source, &extensions, &file_event);
                }
            }
            Ok(Err(err)) => tracing::warn!("Watcher error: {}", err),
            Err(RecvTimeoutError::Timeout) => {
                if changes.try_recv().is_ok() {
                    print_current(&session, &report, args.query.as_deref(), Instant::now())?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}

/// Print the current snapshot. File counts other than the matched count
/// come from the initial scan.
fn print_current(
    session: &Session,
    initial: &ScanReport,
    query: Option<&str>,
    start: Instant,
) -> Result<()> {
    let snapshot = session.index.snapshot();
    let endpoints = match query {
        Some(q) => crate::query::filter(snapshot.endpoints(), q),
        None => snapshot.endpoints().to_vec(),
    };
    let report = ScanReport {
        files_matched: snapshot.entries().len(),
        endpoint_count: snapshot.endpoints().len(),
        per_framework: snapshot.framework_counts(),
        ..initial.clone()
    };
    let mut stdout = std::io::stdout();
    session.print(&mut stdout, &report, &endpoints, query, start.elapsed())
}
