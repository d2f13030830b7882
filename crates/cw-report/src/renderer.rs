//! Report rendering pipeline.
//!
//! `render_pdf` is linear: load data, load template, substitute, write a
//! temporary HTML file next to the output, print it through a
//! [`PdfBackend`], then remove the temporary files. There is no partial
//! recovery; the only fallback is [`ReportRenderer::render_with_fallback`],
//! which keeps the substituted HTML when no browser can be started.

use crate::backend::{ChromeBackend, PdfBackend, PrintJob};
use crate::config::{PdfOptions, RenderConfig};
use crate::error::{ReportError, Result};
use crate::template::substitute;
use cw_common::ReportFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Renderer label for HTML written without a browser.
pub const HTML_RENDERER: &str = "html";
/// Renderer label for HTML written because the browser was unavailable.
pub const HTML_FALLBACK_RENDERER: &str = "html-fallback";

/// A file produced by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedReport {
    pub path: PathBuf,
    pub format: ReportFormat,
    pub renderer: String,
    pub bytes: u64,
    /// Whether the page signalled `chartsRendered` before printing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charts_rendered: Option<bool>,
}

/// Removes temporary files when dropped, warning on failure.
#[derive(Debug, Default)]
struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed temporary file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not remove temporary file")
                }
            }
        }
    }
}

/// `<output>.html`
pub fn temp_html_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".html");
    PathBuf::from(name)
}

/// `<output>.html.debug.png`
pub fn debug_screenshot_path(output: &Path) -> PathBuf {
    let mut name = temp_html_path(output).into_os_string();
    name.push(".debug.png");
    PathBuf::from(name)
}

fn load_data(path: &Path) -> Result<serde_json::Value> {
    let text = fs::read_to_string(path).map_err(|e| ReportError::DataLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let data = serde_json::from_str(&text).map_err(|e| ReportError::DataLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    info!(path = %path.display(), "data loaded");
    Ok(data)
}

fn load_template(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path).map_err(|e| ReportError::TemplateLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    info!(path = %path.display(), "template loaded");
    Ok(text)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).map_err(|e| {
            ReportError::io(
                format!("Failed to create output directory {}", dir.display()),
                e,
            )
        }),
        _ => Ok(()),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| ReportError::io("Failed to resolve working directory", e))?;
    Ok(cwd.join(path))
}

/// Steps 1-3: data, template, substitution.
fn build_html(template: &Path, data: &Path) -> Result<String> {
    let data = load_data(data)?;
    let template = load_template(template)?;
    substitute(&template, &data)
}

fn write_html(path: &Path, html: &str) -> Result<u64> {
    ensure_parent(path)?;
    fs::write(path, html).map_err(|e| {
        ReportError::io(
            format!("Failed to create HTML file {}", path.display()),
            e,
        )
    })?;
    Ok(html.len() as u64)
}

/// Drives template rendering and PDF printing through a backend.
#[derive(Debug, Clone)]
pub struct ReportRenderer<B> {
    backend: B,
    config: RenderConfig,
    pdf_options: PdfOptions,
}

impl ReportRenderer<ChromeBackend> {
    /// Renderer backed by headless Chrome.
    pub fn chrome(config: RenderConfig) -> Self {
        Self::new(ChromeBackend::new(config.clone()), config)
    }
}

impl<B: PdfBackend> ReportRenderer<B> {
    pub fn new(backend: B, config: RenderConfig) -> Self {
        Self {
            backend,
            config,
            pdf_options: PdfOptions::tabloid(),
        }
    }

    pub fn with_pdf_options(mut self, options: PdfOptions) -> Self {
        self.pdf_options = options;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Substitute `data` into `template` and print it to `output`.
    pub fn render_pdf(&self, template: &Path, data: &Path, output: &Path) -> Result<RenderedReport> {
        info!(
            template = %template.display(),
            data = %data.display(),
            output = %output.display(),
            "generating PDF"
        );
        let html = build_html(template, data)?;
        ensure_parent(output)?;

        let temp_html = temp_html_path(output);
        let screenshot = debug_screenshot_path(output);
        let mut temp = TempFiles::default();
        temp.track(temp_html.clone());
        temp.track(screenshot.clone());

        write_html(&temp_html, &html)?;
        debug!(path = %temp_html.display(), "temporary HTML written");

        let html_abs = absolute(&temp_html)?;
        let job = PrintJob {
            html: &html_abs,
            wait_for_charts: true,
            screenshot: self.config.debug_screenshot.then_some(screenshot.as_path()),
            options: &self.pdf_options,
        };
        let printed = self.backend.print(&job)?;

        let bytes = self.write_pdf(output, &printed.pdf)?;
        info!(path = %output.display(), bytes, "PDF generated");
        Ok(RenderedReport {
            path: output.to_path_buf(),
            format: ReportFormat::Pdf,
            renderer: self.backend.name().to_string(),
            bytes,
            charts_rendered: printed.charts_rendered,
        })
    }

    /// Substitute `data` into `template` and write the HTML to `output`.
    pub fn render_html(&self, template: &Path, data: &Path, output: &Path) -> Result<RenderedReport> {
        info!(
            template = %template.display(),
            data = %data.display(),
            output = %output.display(),
            "generating HTML"
        );
        let html = build_html(template, data)?;
        let bytes = write_html(output, &html)?;
        info!(path = %output.display(), bytes, "HTML generated");
        Ok(RenderedReport {
            path: output.to_path_buf(),
            format: ReportFormat::Html,
            renderer: HTML_RENDERER.to_string(),
            bytes,
            charts_rendered: None,
        })
    }

    /// Print an existing HTML file to `<dir>/<stem>.pdf` as it looks on
    /// screen.
    pub fn convert_html(&self, html: &Path) -> Result<RenderedReport> {
        let html_abs = absolute(html)?;
        if !html_abs.is_file() {
            return Err(ReportError::io(
                format!("Failed to read {}", html.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ));
        }
        let stem = html_abs
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "report".into());
        let mut pdf_name = stem;
        pdf_name.push(".pdf");
        let output = html_abs.with_file_name(pdf_name);

        info!(html = %html_abs.display(), output = %output.display(), "converting HTML to PDF");
        let options = PdfOptions::screen_capture();
        let job = PrintJob {
            html: &html_abs,
            wait_for_charts: false,
            screenshot: None,
            options: &options,
        };
        let printed = self.backend.print(&job)?;
        let bytes = self.write_pdf(&output, &printed.pdf)?;
        info!(path = %output.display(), bytes, "PDF generated");
        Ok(RenderedReport {
            path: output,
            format: ReportFormat::Pdf,
            renderer: self.backend.name().to_string(),
            bytes,
            charts_rendered: None,
        })
    }

    /// [`render_pdf`](Self::render_pdf), or the substituted HTML at
    /// `output` with an `.html` extension when no browser can be launched.
    pub fn render_with_fallback(
        &self,
        template: &Path,
        data: &Path,
        output: &Path,
    ) -> Result<RenderedReport> {
        match self.render_pdf(template, data, output) {
            Err(e) if e.is_launch_failure() => {
                warn!(error = %e, "browser unavailable; writing HTML report instead");
                let html_output = output.with_extension("html");
                let mut report = self.render_html(template, data, &html_output)?;
                report.renderer = HTML_FALLBACK_RENDERER.to_string();
                Ok(report)
            }
            other => other,
        }
    }

    fn write_pdf(&self, output: &Path, pdf: &[u8]) -> Result<u64> {
        if pdf.is_empty() {
            return Err(ReportError::EmptyOutput(output.to_path_buf()));
        }
        fs::write(output, pdf)
            .map_err(|e| ReportError::io(format!("Failed to write {}", output.display()), e))?;
        Ok(pdf.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_paths() {
        let out = Path::new("reports/1_nutrition.pdf");
        assert_eq!(temp_html_path(out), PathBuf::from("reports/1_nutrition.pdf.html"));
        assert_eq!(
            debug_screenshot_path(out),
            PathBuf::from("reports/1_nutrition.pdf.html.debug.png")
        );
    }

    #[test]
    fn test_temp_files_ignore_missing() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.html");
        fs::write(&present, "x").unwrap();
        {
            let mut temp = TempFiles::default();
            temp.track(present.clone());
            temp.track(dir.path().join("never-created.png"));
        }
        assert!(!present.exists());
    }
}
