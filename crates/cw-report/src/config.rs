//! Renderer configuration types.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Browser executables tried when nothing is configured.
pub const CHROME_CANDIDATES: [&str; 5] = [
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/chrome",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
];

/// Environment variables naming a browser executable, in lookup order.
pub const CHROME_ENV_VARS: [&str; 2] = ["PUPPETEER_EXECUTABLE_PATH", "CHROME_PATH"];

/// Headless browser and timing settings for the PDF pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Explicit browser executable.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    /// How long to wait for `window.chartsRendered`.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,
    /// Pause after navigation before polling for charts.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Pause after charts report done, before printing.
    #[serde(default = "default_post_render_ms")]
    pub post_render_ms: u64,
    /// Capture a full-page screenshot once charts are done.
    #[serde(default = "default_true")]
    pub debug_screenshot: bool,
    /// Browser window size in CSS pixels.
    #[serde(default = "default_viewport")]
    pub viewport: (u32, u32),
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_render_timeout_ms() -> u64 {
    20_000
}

fn default_settle_ms() -> u64 {
    500
}

fn default_post_render_ms() -> u64 {
    2_000
}

fn default_true() -> bool {
    true
}

/// Tabloid at 96 DPI.
fn default_viewport() -> (u32, u32) {
    (1056, 1632)
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            navigation_timeout_ms: default_navigation_timeout_ms(),
            render_timeout_ms: default_render_timeout_ms(),
            settle_ms: default_settle_ms(),
            post_render_ms: default_post_render_ms(),
            debug_screenshot: true,
            viewport: default_viewport(),
        }
    }
}

impl RenderConfig {
    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_debug_screenshot(mut self, enabled: bool) -> Self {
        self.debug_screenshot = enabled;
        self
    }

    /// Zero every wait; for tests with a fake backend.
    pub fn without_waits(mut self) -> Self {
        self.settle_ms = 0;
        self.post_render_ms = 0;
        self
    }

    /// Browser executable to launch, or `None` to let the browser library
    /// run its own discovery.
    pub fn resolve_chrome_path(&self) -> Option<PathBuf> {
        resolve_executable(
            self.chrome_path.as_deref(),
            |var| std::env::var(var).ok(),
            |path| path.exists(),
        )
    }
}

/// Configured path, then environment, then the first existing candidate.
pub fn resolve_executable(
    configured: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }
    for var in CHROME_ENV_VARS {
        if let Some(value) = env(var).filter(|v| !v.trim().is_empty()) {
            return Some(PathBuf::from(value));
        }
    }
    CHROME_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| exists(p))
        .map(Path::to_path_buf)
}

/// CSS media type the page is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Print,
    Screen,
}

/// Page setup for printing, in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfOptions {
    /// `None` leaves the browser default paper.
    pub paper_width: Option<f64>,
    pub paper_height: Option<f64>,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub print_background: bool,
    pub scale: f64,
    pub prefer_css_page_size: bool,
    pub media: MediaType,
}

impl PdfOptions {
    /// 11 x 17 in with 0.75 in margins, used for generated reports.
    pub fn tabloid() -> Self {
        Self {
            paper_width: Some(11.0),
            paper_height: Some(17.0),
            margin_top: 0.75,
            margin_right: 0.75,
            margin_bottom: 0.75,
            margin_left: 0.75,
            print_background: true,
            scale: 1.0,
            prefer_css_page_size: true,
            media: MediaType::Print,
        }
    }

    /// Setup for converting an existing HTML page as it looks on screen.
    pub fn screen_capture() -> Self {
        Self {
            paper_width: None,
            paper_height: None,
            margin_top: 0.25,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            print_background: true,
            scale: 1.0,
            prefer_css_page_size: true,
            media: MediaType::Screen,
        }
    }
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self::tabloid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.navigation_timeout_ms, 30_000);
        assert_eq!(config.render_timeout_ms, 20_000);
        assert_eq!(config.settle_ms, 500);
        assert_eq!(config.post_render_ms, 2_000);
        assert_eq!(config.viewport, (1056, 1632));
        assert!(config.debug_screenshot);
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{"settle_ms": 0}"#).unwrap();
        assert_eq!(config.settle_ms, 0);
        assert_eq!(config.render_timeout_ms, 20_000);
    }

    #[test]
    fn test_configured_path_wins() {
        let path = resolve_executable(
            Some(Path::new("/opt/chrome")),
            |_| Some("/env/chrome".into()),
            |_| true,
        );
        assert_eq!(path, Some(PathBuf::from("/opt/chrome")));
    }

    #[test]
    fn test_env_before_candidates() {
        let path = resolve_executable(
            None,
            |var| (var == "CHROME_PATH").then(|| "/env/chrome".to_string()),
            |_| true,
        );
        assert_eq!(path, Some(PathBuf::from("/env/chrome")));
    }

    #[test]
    fn test_first_existing_candidate() {
        let path = resolve_executable(None, |_| None, |p| p.ends_with("google-chrome"));
        assert_eq!(path, Some(PathBuf::from("/usr/bin/google-chrome")));
        assert_eq!(resolve_executable(None, |_| None, |_| false), None);
    }

    #[test]
    fn test_tabloid_page() {
        let opts = PdfOptions::tabloid();
        assert_eq!((opts.paper_width, opts.paper_height), (Some(11.0), Some(17.0)));
        assert_eq!(opts.margin_left, 0.75);
        assert!(opts.prefer_css_page_size);
        assert_eq!(PdfOptions::screen_capture().media, MediaType::Screen);
    }
}
