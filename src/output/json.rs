use crate::errors::Result;
use crate::index::ScanReport;
use crate::output::display_path;
use crate::parse::{Endpoint, Framework, HttpMethod};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub metadata: Metadata,
    pub endpoints: Vec<EndpointRecord>,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub root: PathBuf,
    pub files_scanned: usize,
    pub files_matched: usize,
    pub files_skipped: usize,
    pub endpoint_count: usize,
    pub frameworks: BTreeMap<Framework, usize>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl Metadata {
    pub fn from_report(root: &Path, report: &ScanReport, elapsed_ms: u64) -> Self {
        Self {
            root: root.to_path_buf(),
            files_scanned: report.files_scanned,
            files_matched: report.files_matched,
            files_skipped: report.files_skipped,
            endpoint_count: report.endpoint_count,
            frameworks: report.per_framework.clone(),
            elapsed_ms,
            query: None,
        }
    }
}

/// Endpoint as printed: root-relative file and 1-based line.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EndpointRecord {
    pub method: HttpMethod,
    pub path: String,
    pub owner: String,
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<Framework>,
    pub file: String,
    pub line: usize,
}

impl EndpointRecord {
    pub fn new(root: &Path, endpoint: &Endpoint) -> Self {
        Self {
            method: endpoint.method,
            path: endpoint.path.clone(),
            owner: endpoint.owner.clone(),
            handler: endpoint.handler.clone(),
            framework: endpoint.framework,
            file: display_path(root, &endpoint.location.file),
            line: endpoint.location.line + 1,
        }
    }
}

/// Write scan or search output as JSON.
pub fn write_scan_json<W: Write>(
    writer: &mut W,
    metadata: Metadata,
    endpoints: &[Endpoint],
) -> Result<()> {
    let output = ScanOutput {
        endpoints: endpoints
            .iter()
            .map(|e| EndpointRecord::new(&metadata.root, e))
            .collect(),
        metadata,
    };
    serde_json::to_writer_pretty(&mut *writer, &output)?;
    writeln!(writer)?;
    Ok(())
}
