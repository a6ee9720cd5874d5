//! Incremental endpoint index.
//!
//! One cache entry per parsed file, plus the flattened endpoint list in entry
//! order. Readers clone the current [`IndexSnapshot`] and never see a
//! half-applied update; all writes serialize on one writer lock.

pub mod source;

pub use source::{DiskSource, MemorySource, SourceProvider};

use crate::errors::{Result, RouteScanError};
use crate::parse::{Endpoint, Framework, ParserRegistry};
use crate::query;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::SystemTime;

/// Endpoints extracted from one file at a given modification time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub endpoints: Vec<Endpoint>,
}

/// Immutable, fully-applied view of the cache.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    entries: Vec<Arc<CacheEntry>>,
    endpoints: Vec<Endpoint>,
}

impl IndexSnapshot {
    fn from_entries(entries: Vec<Arc<CacheEntry>>) -> Self {
        let endpoints = entries
            .iter()
            .flat_map(|e| e.endpoints.iter().cloned())
            .collect();
        Self { entries, endpoints }
    }

    pub fn entries(&self) -> &[Arc<CacheEntry>] {
        &self.entries
    }

    /// Every endpoint, in entry order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn entry(&self, path: &Path) -> Option<&Arc<CacheEntry>> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Endpoint counts per framework tag.
    pub fn framework_counts(&self) -> BTreeMap<Framework, usize> {
        let mut counts = BTreeMap::new();
        for framework in self.endpoints.iter().filter_map(|e| e.framework) {
            *counts.entry(framework).or_insert(0) += 1;
        }
        counts
    }

    /// Copy with `path`'s entry replaced by `entry` (appended last) or
    /// dropped when `entry` is `None`.
    fn with_entry(&self, path: &Path, entry: Option<CacheEntry>) -> Self {
        let mut entries: Vec<Arc<CacheEntry>> = self
            .entries
            .iter()
            .filter(|e| e.path != path)
            .cloned()
            .collect();
        entries.extend(entry.map(Arc::new));
        Self::from_entries(entries)
    }
}

/// Outcome of revalidating one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revalidation {
    /// Cached modification time still current
    Unchanged,
    /// Re-parsed and (re)inserted
    Updated,
    /// Entry dropped
    Removed,
    /// No parser claims the file and nothing was cached
    Skipped,
}

/// Counters for one full scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Candidate files listed by the source
    pub files_scanned: usize,
    /// Files a parser claimed
    pub files_matched: usize,
    /// Files that could not be stat'ed or read
    pub files_skipped: usize,
    pub endpoint_count: usize,
    pub per_framework: BTreeMap<Framework, usize>,
    /// A newer scan started before this one finished; its results were dropped
    pub superseded: bool,
}

#[derive(Debug, Default)]
struct WriterState {
    scans_in_flight: usize,
    /// Paths changed while a scan was running, replayed once it publishes
    touched: BTreeSet<PathBuf>,
}

enum FileOutcome {
    Parsed(CacheEntry),
    Unclaimed,
    Failed,
}

pub struct EndpointIndex {
    registry: Arc<ParserRegistry>,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    writer: Mutex<WriterState>,
    generation: AtomicU64,
    subscribers: Mutex<Vec<Sender<()>>>,
}

impl EndpointIndex {
    pub fn new(registry: Arc<ParserRegistry>) -> Self {
        Self {
            registry,
            snapshot: RwLock::new(Arc::new(IndexSnapshot::default())),
            writer: Mutex::new(WriterState::default()),
            generation: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Current fully-applied view.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn all_endpoints(&self) -> Vec<Endpoint> {
        self.snapshot().endpoints().to_vec()
    }

    pub fn entries(&self) -> Vec<Arc<CacheEntry>> {
        self.snapshot().entries().to_vec()
    }

    /// Case-insensitive substring search over the current endpoints.
    pub fn filter(&self, query: &str) -> Vec<Endpoint> {
        query::filter(self.snapshot().endpoints(), query)
    }

    /// Change signal, fired after every published change. Signals coalesce:
    /// a receiver that has not drained holds at most one pending signal.
    pub fn subscribe(&self) -> Receiver<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.lock_subscribers().push(tx);
        rx
    }

    /// Rebuild the cache from scratch. Files are parsed in parallel; the
    /// result replaces the whole cache unless a newer scan has started.
    pub fn full_scan(&self, source: &dyn SourceProvider) -> ScanReport {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock_writer().scans_in_flight += 1;

        let files = source.list_files(&self.registry.supported_extensions());
        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|path| self.scan_file(path, source))
            .collect();

        let mut report = ScanReport {
            files_scanned: files.len(),
            ..Default::default()
        };
        let mut entries = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Parsed(entry) => {
                    report.files_matched += 1;
                    entries.push(Arc::new(entry));
                }
                FileOutcome::Unclaimed => {}
                FileOutcome::Failed => report.files_skipped += 1,
            }
        }

        let mut writer = self.lock_writer();
        writer.scans_in_flight -= 1;
        if generation != self.generation.load(Ordering::SeqCst) {
            tracing::debug!("Discarding scan {} superseded by a newer scan", generation);
            if writer.scans_in_flight == 0 {
                writer.touched.clear();
            }
            report.superseded = true;
            return report;
        }

        self.publish(IndexSnapshot::from_entries(entries));
        let touched = std::mem::take(&mut writer.touched);
        for path in touched {
            if !source.accepts(&path) {
                self.remove(&path);
                continue;
            }
            match self.revalidate(&path, source) {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    self.remove(&path);
                }
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        drop(writer);

        let snapshot = self.snapshot();
        report.endpoint_count = snapshot.endpoints().len();
        report.per_framework = snapshot.framework_counts();
        report
    }

    /// Revalidate one file: re-parse it if its modification time changed.
    /// Stat and read failures leave the cache untouched.
    pub fn on_file_changed(
        &self,
        path: &Path,
        source: &dyn SourceProvider,
    ) -> Result<Revalidation> {
        let mut writer = self.lock_writer();
        if writer.scans_in_flight > 0 {
            writer.touched.insert(path.to_path_buf());
        }
        if !source.accepts(path) {
            return Ok(self.remove(path));
        }
        self.revalidate(path, source)
    }

    pub fn on_file_created(
        &self,
        path: &Path,
        source: &dyn SourceProvider,
    ) -> Result<Revalidation> {
        self.on_file_changed(path, source)
    }

    /// Drop a deleted file's entry.
    pub fn on_file_deleted(&self, path: &Path) -> Revalidation {
        let mut writer = self.lock_writer();
        if writer.scans_in_flight > 0 {
            writer.touched.insert(path.to_path_buf());
        }
        self.remove(path)
    }

    fn scan_file(&self, path: &Path, source: &dyn SourceProvider) -> FileOutcome {
        let loaded = source
            .modified(path)
            .and_then(|modified| Ok((modified, source.read(path)?)));
        let (modified, content) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                return FileOutcome::Failed;
            }
        };
        match self.parse(path, &content) {
            Some(endpoints) => FileOutcome::Parsed(CacheEntry {
                path: path.to_path_buf(),
                modified,
                endpoints,
            }),
            None => FileOutcome::Unclaimed,
        }
    }

    fn parse(&self, path: &Path, content: &str) -> Option<Vec<Endpoint>> {
        let parser = self.registry.select(path, content)?;
        tracing::debug!("{} -> {}", path.display(), parser.framework());
        Some(parser.parse_file(path, content))
    }

    /// Caller holds the writer lock.
    fn revalidate(&self, path: &Path, source: &dyn SourceProvider) -> Result<Revalidation> {
        let current = self.snapshot();
        let modified = source
            .modified(path)
            .map_err(|e| RouteScanError::file_access(path, e))?;
        let cached = current.entry(path);
        if cached.is_some_and(|e| e.modified == modified) {
            return Ok(Revalidation::Unchanged);
        }

        let content = source
            .read(path)
            .map_err(|e| RouteScanError::file_access(path, e))?;
        match self.parse(path, &content) {
            Some(endpoints) => {
                let entry = CacheEntry {
                    path: path.to_path_buf(),
                    modified,
                    endpoints,
                };
                self.publish(current.with_entry(path, Some(entry)));
                Ok(Revalidation::Updated)
            }
            None if cached.is_some() => {
                self.publish(current.with_entry(path, None));
                Ok(Revalidation::Removed)
            }
            None => Ok(Revalidation::Skipped),
        }
    }

    /// Caller holds the writer lock.
    fn remove(&self, path: &Path) -> Revalidation {
        let current = self.snapshot();
        if current.entry(path).is_none() {
            return Revalidation::Skipped;
        }
        self.publish(current.with_entry(path, None));
        Revalidation::Removed
    }

    fn publish(&self, snapshot: IndexSnapshot) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        self.lock_subscribers()
            .retain(|tx| !matches!(tx.try_send(()), Err(TrySendError::Disconnected(_))));
    }

    fn lock_writer(&self) -> MutexGuard<'_, WriterState> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<Sender<()>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
