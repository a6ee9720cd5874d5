use crate::errors::Result;
use crate::walk::{self, PathFilter};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

/// Where the index gets file listings, modification times and contents.
pub trait SourceProvider: Send + Sync {
    /// Every candidate file whose extension is in `extensions`.
    fn list_files(&self, extensions: &BTreeSet<&'static str>) -> Vec<PathBuf>;

    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    fn read(&self, path: &Path) -> io::Result<String>;

    /// Whether a path reported by a change event belongs to the scanned set.
    fn accepts(&self, _path: &Path) -> bool {
        true
    }
}

/// Files on disk under one root directory.
#[derive(Debug, Clone)]
pub struct DiskSource {
    root: PathBuf,
    filter: PathFilter,
}

impl DiskSource {
    pub fn new(
        root: impl Into<PathBuf>,
        include: &[String],
        exclude: &[String],
        include_tests: bool,
    ) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            filter: PathFilter::new(include, exclude, include_tests)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceProvider for DiskSource {
    fn list_files(&self, extensions: &BTreeSet<&'static str>) -> Vec<PathBuf> {
        walk::walk_files(&self.root, extensions, &self.filter)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn accepts(&self, path: &Path) -> bool {
        self.filter.accepts(&self.root, path)
    }
}

/// In-memory file set, for editor buffers and tests. Every write bumps the
/// file's modification time.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: Mutex<BTreeMap<PathBuf, (SystemTime, String)>>,
    clock: Mutex<u64>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let tick = {
            let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
            *clock += 1;
            *clock
        };
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(tick);
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), (modified, content.into()));
    }

    pub fn remove(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .is_some()
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
    }
}

impl SourceProvider for MemorySource {
    fn list_files(&self, extensions: &BTreeSet<&'static str>) -> Vec<PathBuf> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| extensions.contains(ext))
            })
            .cloned()
            .collect()
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .map(|(modified, _)| *modified)
            .ok_or_else(|| Self::not_found(path))
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| Self::not_found(path))
    }
}
