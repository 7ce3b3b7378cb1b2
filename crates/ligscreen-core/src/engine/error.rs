use thiserror::Error;

use super::config::ConfigError;
use super::report::ReportError;
use crate::core::io::manifest::ManifestError;
use std::path::PathBuf;

/// Errors that abort a screening run.
///
/// Problems confined to one structure or one conformer group never surface
/// here; they are recorded in the [`ScanSummary`](super::scanner::ScanSummary)
/// and the batch continues.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Failed to list structure files under '{}': {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report unavailable while processing '{id}': {source}")]
    Report {
        id: String,
        #[source]
        source: ReportError,
    },

    #[error("Report unavailable: {0}")]
    ReportOutput(#[from] ReportError),
}
