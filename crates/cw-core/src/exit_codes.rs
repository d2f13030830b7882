//! Exit codes for the cardwatch CLI.
//!
//! The process status is binary so the render commands stay drop-in
//! compatible with shell scripts: 0 on success, 1 on any failure. The
//! failure kind is carried separately as a stable `code_name` in JSON
//! error output.

/// Outcome of a cardwatch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed.
    Success,

    /// Invalid or missing arguments.
    ArgsError,

    /// Patient/date/schedule input rejected before any request.
    ValidationError,

    /// Config file missing, unreadable, or invalid.
    ConfigError,

    /// Backend request failed or returned an unexpected payload.
    ApiError,

    /// Template substitution, browser, or PDF writing failed.
    RenderError,

    /// Local file I/O failed.
    IoError,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            _ => 1,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Success => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ValidationError => "ERR_VALIDATION",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::ApiError => "ERR_API",
            ExitCode::RenderError => "ERR_RENDER",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
