//! Render pipeline against scripted backends.

use cw_common::ReportFormat;
use cw_report::{
    MediaType, PdfBackend, PrintJob, PrintOutput, RenderConfig, ReportError, ReportRenderer,
    Result, DATA_PLACEHOLDER, DEFAULT_TEMPLATE, HTML_FALLBACK_RENDERER,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// What the fake saw for one print call.
#[derive(Debug, Clone)]
struct SeenJob {
    html: PathBuf,
    html_existed: bool,
    html_content: String,
    wait_for_charts: bool,
    screenshot: Option<PathBuf>,
    media: MediaType,
    paper: (Option<f64>, Option<f64>),
}

enum Behavior {
    Pdf(&'static [u8]),
    LaunchFails,
    PageFails,
}

struct FakeBackend {
    behavior: Behavior,
    seen: RefCell<Vec<SeenJob>>,
}

impl FakeBackend {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl PdfBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn print(&self, job: &PrintJob<'_>) -> Result<PrintOutput> {
        self.seen.borrow_mut().push(SeenJob {
            html: job.html.to_path_buf(),
            html_existed: job.html.exists(),
            html_content: fs::read_to_string(job.html).unwrap_or_default(),
            wait_for_charts: job.wait_for_charts,
            screenshot: job.screenshot.map(Path::to_path_buf),
            media: job.options.media,
            paper: (job.options.paper_width, job.options.paper_height),
        });
        match self.behavior {
            Behavior::Pdf(bytes) => {
                if let Some(shot) = job.screenshot {
                    fs::write(shot, b"png").unwrap();
                }
                Ok(PrintOutput {
                    pdf: bytes.to_vec(),
                    charts_rendered: job.wait_for_charts.then_some(true),
                    screenshot_written: job.screenshot.is_some(),
                })
            }
            Behavior::LaunchFails => Err(ReportError::BrowserLaunch("no chrome".into())),
            Behavior::PageFails => Err(ReportError::Browser("navigation timed out".into())),
        }
    }
}

struct Fixture {
    dir: TempDir,
    template: PathBuf,
    data: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.html");
        let data = dir.path().join("data.json");
        fs::write(&template, DEFAULT_TEMPLATE).unwrap();
        fs::write(
            &data,
            r#"{"patient_info": {"name": "Ada"}, "nutrients": {"calories": {"target": 2000, "actual": 1800}}}"#,
        )
        .unwrap();
        Self {
            dir,
            template,
            data,
        }
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out").join("nested").join("report.pdf")
    }
}

fn renderer(behavior: Behavior) -> ReportRenderer<FakeBackend> {
    ReportRenderer::new(FakeBackend::new(behavior), RenderConfig::default().without_waits())
}

mod render_pdf {
    use super::*;

    #[test]
    fn writes_non_empty_pdf_and_creates_directory() {
        let fx = Fixture::new();
        let r = renderer(Behavior::Pdf(b"%PDF-1.7 fake"));
        let output = fx.output();

        let report = r.render_pdf(&fx.template, &fx.data, &output).unwrap();

        assert_eq!(report.path, output);
        assert_eq!(report.format, ReportFormat::Pdf);
        assert_eq!(report.renderer, "fake");
        assert_eq!(report.charts_rendered, Some(true));
        assert_eq!(fs::read(&output).unwrap(), b"%PDF-1.7 fake");
        assert!(report.bytes > 0);
    }

    #[test]
    fn backend_sees_substituted_temp_html() {
        let fx = Fixture::new();
        let r = renderer(Behavior::Pdf(b"%PDF"));
        let output = fx.output();
        r.render_pdf(&fx.template, &fx.data, &output).unwrap();

        let seen = r.backend().seen.borrow();
        assert_eq!(seen.len(), 1);
        let job = &seen[0];
        assert!(job.html.is_absolute());
        assert!(job.html.to_string_lossy().ends_with("report.pdf.html"));
        assert!(job.html_existed);
        assert!(job.html_content.contains("const reportData = {"));
        assert!(!job.html_content.contains(DATA_PLACEHOLDER));
        assert!(job.wait_for_charts);
        assert_eq!(job.media, MediaType::Print);
        assert_eq!(job.paper, (Some(11.0), Some(17.0)));
        assert!(job
            .screenshot
            .as_ref()
            .unwrap()
            .to_string_lossy()
            .ends_with("report.pdf.html.debug.png"));
    }

    #[test]
    fn temp_files_removed_on_success() {
        let fx = Fixture::new();
        let r = renderer(Behavior::Pdf(b"%PDF"));
        let output = fx.output();
        r.render_pdf(&fx.template, &fx.data, &output).unwrap();

        let dir = output.parent().unwrap();
        let names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["report.pdf".to_string()]);
    }

    #[test]
    fn temp_files_removed_on_failure() {
        let fx = Fixture::new();
        let r = renderer(Behavior::PageFails);
        let output = fx.output();

        let err = r.render_pdf(&fx.template, &fx.data, &output).unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate PDF: navigation timed out");
        assert!(!output.exists());
        assert!(!output.with_extension("pdf.html").exists());
    }

    #[test]
    fn screenshot_skipped_when_disabled() {
        let fx = Fixture::new();
        let r = ReportRenderer::new(
            FakeBackend::new(Behavior::Pdf(b"%PDF")),
            RenderConfig::default().without_waits().with_debug_screenshot(false),
        );
        r.render_pdf(&fx.template, &fx.data, &fx.output()).unwrap();
        assert!(r.backend().seen.borrow()[0].screenshot.is_none());
    }

    #[test]
    fn empty_pdf_is_an_error() {
        let fx = Fixture::new();
        let r = renderer(Behavior::Pdf(b""));
        let err = r.render_pdf(&fx.template, &fx.data, &fx.output()).unwrap_err();
        assert!(matches!(err, ReportError::EmptyOutput(_)));
    }

    #[test]
    fn bad_data_fails_before_browser() {
        let fx = Fixture::new();
        fs::write(&fx.data, "{not json").unwrap();
        let r = renderer(Behavior::Pdf(b"%PDF"));

        let err = r.render_pdf(&fx.template, &fx.data, &fx.output()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load or parse data"));
        assert!(r.backend().seen.borrow().is_empty());
    }

    #[test]
    fn missing_template_fails() {
        let fx = Fixture::new();
        let r = renderer(Behavior::Pdf(b"%PDF"));
        let missing = fx.dir.path().join("nope.html");

        let err = r.render_pdf(&missing, &fx.data, &fx.output()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load template"));
    }

    #[test]
    fn template_without_placeholder_fails() {
        let fx = Fixture::new();
        fs::write(&fx.template, "<html><body></body></html>").unwrap();
        let r = renderer(Behavior::Pdf(b"%PDF"));

        let err = r.render_pdf(&fx.template, &fx.data, &fx.output()).unwrap_err();
        assert!(matches!(err, ReportError::MissingPlaceholder));
    }
}

mod render_html {
    use super::*;

    #[test]
    fn writes_substituted_html_without_browser() {
        let fx = Fixture::new();
        let r = renderer(Behavior::LaunchFails);
        let output = fx.dir.path().join("html").join("report.html");

        let report = r.render_html(&fx.template, &fx.data, &output).unwrap();
        assert_eq!(report.format, ReportFormat::Html);
        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains(r#""name":"Ada""#));
        assert!(r.backend().seen.borrow().is_empty());
    }
}

mod fallback {
    use super::*;

    #[test]
    fn launch_failure_writes_html() {
        let fx = Fixture::new();
        let r = renderer(Behavior::LaunchFails);
        let output = fx.output();

        let report = r.render_with_fallback(&fx.template, &fx.data, &output).unwrap();
        assert_eq!(report.format, ReportFormat::Html);
        assert_eq!(report.renderer, HTML_FALLBACK_RENDERER);
        assert_eq!(report.path, output.with_extension("html"));
        assert!(report.path.exists());
        assert!(!output.exists());
    }

    #[test]
    fn page_failure_is_not_masked() {
        let fx = Fixture::new();
        let r = renderer(Behavior::PageFails);
        let err = r
            .render_with_fallback(&fx.template, &fx.data, &fx.output())
            .unwrap_err();
        assert!(matches!(err, ReportError::Browser(_)));
    }

    #[test]
    fn success_needs_no_fallback() {
        let fx = Fixture::new();
        let r = renderer(Behavior::Pdf(b"%PDF"));
        let report = r
            .render_with_fallback(&fx.template, &fx.data, &fx.output())
            .unwrap();
        assert_eq!(report.format, ReportFormat::Pdf);
    }
}

mod convert {
    use super::*;

    #[test]
    fn pdf_lands_next_to_html() {
        let fx = Fixture::new();
        let html = fx.dir.path().join("page.html");
        fs::write(&html, "<html><body>hi</body></html>").unwrap();
        let r = renderer(Behavior::Pdf(b"%PDF"));

        let report = r.convert_html(&html).unwrap();
        assert_eq!(report.path, fx.dir.path().join("page.pdf"));
        assert!(report.path.exists());

        let seen = r.backend().seen.borrow();
        assert_eq!(seen[0].media, MediaType::Screen);
        assert!(!seen[0].wait_for_charts);
        assert_eq!(seen[0].paper, (None, None));
        // The source HTML is not a temporary file.
        assert!(html.exists());
    }

    #[test]
    fn missing_html_is_an_error() {
        let fx = Fixture::new();
        let r = renderer(Behavior::Pdf(b"%PDF"));
        assert!(r.convert_html(&fx.dir.path().join("missing.html")).is_err());
        assert!(r.backend().seen.borrow().is_empty());
    }
}
