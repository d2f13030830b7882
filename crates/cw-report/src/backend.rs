//! Browser backends that turn an HTML file into PDF bytes.

use crate::config::{MediaType, PdfOptions, RenderConfig};
use crate::error::{ReportError, Result};
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Expression that turns true once the page's client-side rendering is done.
pub const CHARTS_RENDERED_JS: &str = "window.chartsRendered === true";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One page to print.
#[derive(Debug, Clone)]
pub struct PrintJob<'a> {
    /// Absolute path of the HTML file.
    pub html: &'a Path,
    /// Poll for [`CHARTS_RENDERED_JS`] before printing.
    pub wait_for_charts: bool,
    /// Where to write a screenshot once charts are done.
    pub screenshot: Option<&'a Path>,
    pub options: &'a PdfOptions,
}

/// Result of a print.
#[derive(Debug, Clone, Default)]
pub struct PrintOutput {
    pub pdf: Vec<u8>,
    /// `None` when the job did not wait for charts.
    pub charts_rendered: Option<bool>,
    pub screenshot_written: bool,
}

/// Something that can load an HTML file and print it.
///
/// Implementations must release the browser before returning.
pub trait PdfBackend {
    /// Renderer label recorded with generated reports.
    fn name(&self) -> &str;

    fn print(&self, job: &PrintJob<'_>) -> Result<PrintOutput>;
}

/// A browser that launched and opened a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserCheck {
    /// `None` when the browser library found the executable itself.
    pub executable: Option<PathBuf>,
    /// Product string reported by the browser, e.g. `HeadlessChrome/120.0`.
    pub product: String,
}

/// Headless Chrome/Chromium via the DevTools protocol.
#[derive(Debug, Clone, Default)]
pub struct ChromeBackend {
    config: RenderConfig,
}

fn browser_error(err: impl std::fmt::Display) -> ReportError {
    ReportError::Browser(err.to_string())
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

impl ChromeBackend {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn launch(&self) -> Result<Browser> {
        let path = self.config.resolve_chrome_path();
        match &path {
            Some(p) => info!(path = %p.display(), "launching browser"),
            None => info!("launching browser from default location"),
        }

        let args: Vec<&OsStr> = vec![
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-setuid-sandbox"),
            OsStr::new("--no-first-run"),
        ];
        // The browser exits when idle longer than this, so it must cover
        // every wait in the pipeline.
        let idle = Duration::from_millis(
            self.config
                .navigation_timeout_ms
                .saturating_add(self.config.settle_ms)
                .saturating_add(self.config.render_timeout_ms)
                .saturating_add(self.config.post_render_ms),
        )
        .saturating_add(Duration::from_secs(30));

        let options = LaunchOptionsBuilder::default()
            .headless(true)
            .sandbox(false)
            .window_size(Some(self.config.viewport))
            .path(path)
            .args(args)
            .idle_browser_timeout(idle)
            .build()
            .map_err(|e| ReportError::BrowserLaunch(e.to_string()))?;

        Browser::new(options).map_err(|e| ReportError::BrowserLaunch(e.to_string()))
    }

    /// Launch the browser and open a blank page, as a rendering pre-flight.
    pub fn verify(&self) -> Result<BrowserCheck> {
        let executable = self.config.resolve_chrome_path();
        let browser = self.launch()?;
        let version = browser
            .get_version()
            .map_err(|e| ReportError::BrowserLaunch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| ReportError::BrowserLaunch(e.to_string()))?;
        tab.navigate_to("about:blank")
            .and_then(|t| t.wait_until_navigated())
            .map_err(browser_error)?;
        info!(product = %version.product, "browser launched");
        Ok(BrowserCheck {
            executable,
            product: version.product,
        })
    }

    /// Poll until the page reports its charts done or the timeout elapses.
    fn wait_for_charts(&self, tab: &Tab) -> bool {
        // An unrepresentable deadline means no deadline.
        let deadline =
            Instant::now().checked_add(Duration::from_millis(self.config.render_timeout_ms));
        loop {
            let done = tab
                .evaluate(CHARTS_RENDERED_JS, false)
                .ok()
                .and_then(|r| r.value)
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if done {
                return true;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn capture_screenshot(&self, tab: &Tab, path: &Path) -> Result<()> {
        let clip = tab
            .find_element("body")
            .and_then(|body| body.get_box_model())
            .map(|model| model.margin_viewport())
            .ok();
        let png = tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, clip, true)
            .map_err(browser_error)?;
        std::fs::write(path, png)
            .map_err(|e| ReportError::io(format!("Failed to write {}", path.display()), e))
    }
}

fn print_options(opts: &PdfOptions) -> PrintToPdfOptions {
    PrintToPdfOptions {
        paper_width: opts.paper_width,
        paper_height: opts.paper_height,
        margin_top: Some(opts.margin_top),
        margin_right: Some(opts.margin_right),
        margin_bottom: Some(opts.margin_bottom),
        margin_left: Some(opts.margin_left),
        print_background: Some(opts.print_background),
        scale: Some(opts.scale),
        prefer_css_page_size: Some(opts.prefer_css_page_size),
        ..Default::default()
    }
}

impl PdfBackend for ChromeBackend {
    fn name(&self) -> &str {
        "chrome"
    }

    fn print(&self, job: &PrintJob<'_>) -> Result<PrintOutput> {
        let browser = self.launch()?;
        let tab = browser
            .new_tab()
            .map_err(|e| ReportError::BrowserLaunch(e.to_string()))?;
        tab.set_default_timeout(Duration::from_millis(self.config.navigation_timeout_ms));

        let url = file_url(job.html);
        debug!(url = %url, "navigating");
        tab.navigate_to(&url).map_err(browser_error)?;
        tab.wait_until_navigated().map_err(browser_error)?;

        if job.options.media == MediaType::Screen {
            tab.call_method(Emulation::SetEmulatedMedia {
                media: Some("screen".to_string()),
                features: None,
            })
            .map_err(browser_error)?;
        }

        let mut output = PrintOutput::default();
        if job.wait_for_charts {
            std::thread::sleep(Duration::from_millis(self.config.settle_ms));
            let rendered = self.wait_for_charts(&tab);
            if rendered {
                info!("charts rendered");
                std::thread::sleep(Duration::from_millis(self.config.post_render_ms));
                if let Some(path) = job.screenshot {
                    match self.capture_screenshot(&tab, path) {
                        Ok(()) => output.screenshot_written = true,
                        Err(e) => warn!(error = %e, "debug screenshot failed"),
                    }
                }
            } else {
                warn!(
                    timeout_ms = self.config.render_timeout_ms,
                    "timed out waiting for charts to render; continuing with PDF generation"
                );
            }
            output.charts_rendered = Some(rendered);
        }

        output.pdf = tab
            .print_to_pdf(Some(print_options(job.options)))
            .map_err(browser_error)?;
        debug!(bytes = output.pdf.len(), "printed");

        drop(tab);
        drop(browser);
        Ok(output)
    }
}
