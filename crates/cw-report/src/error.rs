//! Error types for report rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while rendering or indexing reports.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Data file missing or not JSON.
    #[error("Failed to load or parse data: {reason}")]
    DataLoad { path: PathBuf, reason: String },

    /// Template file unreadable.
    #[error("Failed to load template: {reason}")]
    TemplateLoad { path: PathBuf, reason: String },

    /// Template has nowhere to put the data.
    #[error("template has no /* DATA_PLACEHOLDER */ marker")]
    MissingPlaceholder,

    /// Filesystem step of the pipeline failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The browser process could not be started.
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    /// Navigation or printing failed after launch.
    #[error("Failed to generate PDF: {0}")]
    Browser(String),

    /// Printing produced no bytes.
    #[error("Failed to generate PDF: output {0} is empty")]
    EmptyOutput(PathBuf),

    /// Report index could not be parsed.
    #[error("report index {path} is corrupt: {source}")]
    IndexCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ReportError::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the browser itself was unavailable, as opposed to a page or
    /// filesystem failure.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, ReportError::BrowserLaunch(_))
    }
}
