use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum RouteScanError {
    #[error("No scannable files found in {path}")]
    #[diagnostic(code(routescan::no_files))]
    NoFiles { path: PathBuf },

    #[error("Could not access {path}: {source}")]
    #[diagnostic(code(routescan::file_access))]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(routescan::config))]
    Config(String),

    #[error("Watch error: {0}")]
    #[diagnostic(code(routescan::watch))]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    #[diagnostic(code(routescan::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(routescan::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(routescan::glob))]
    Glob(#[from] globset::Error),
}

impl RouteScanError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RouteScanError::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            RouteScanError::FileAccess { source, .. } | RouteScanError::Io(source) => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RouteScanError>;
