//! Structured event vocabulary.
//!
//! Every event carries the invocation's `run_id`, the pipeline `stage` and a
//! dotted event name, so JSONL logs can be filtered without parsing the
//! message text.

use serde::{Deserialize, Serialize};

/// Pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Backend requests.
    Fetch,
    /// Template substitution and PDF printing.
    Render,
    /// Assistant chat.
    Chat,
    /// Scheduled report management.
    Schedule,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Fetch => "fetch",
            Stage::Render => "render",
            Stage::Chat => "chat",
            Stage::Schedule => "schedule",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    // Fetch stage
    pub const FETCH_TIER_STARTED: &str = "fetch.tier_started";
    pub const FETCH_TIER_FAILED: &str = "fetch.tier_failed";
    pub const FETCH_DASHBOARD_READY: &str = "fetch.dashboard_ready";
    pub const FETCH_FAILED: &str = "fetch.failed";

    // Render stage
    pub const RENDER_STARTED: &str = "render.started";
    pub const RENDER_PDF_WRITTEN: &str = "render.pdf_written";
    pub const RENDER_HTML_WRITTEN: &str = "render.html_written";
    pub const RENDER_FALLBACK: &str = "render.fallback";
    pub const RENDER_FAILED: &str = "render.failed";
    pub const RENDER_BROWSER_VERIFIED: &str = "render.browser_verified";

    // Chat stage
    pub const CHAT_SENT: &str = "chat.sent";
    pub const CHAT_RESET: &str = "chat.reset";

    // Schedule stage
    pub const SCHEDULE_CREATED: &str = "schedule.created";
    pub const SCHEDULE_CANCELLED: &str = "schedule.cancelled";
}

/// Correlation data shared by every event of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    /// Context with a fresh run id.
    pub fn generate() -> Self {
        Self::new(super::generate_run_id())
    }
}
