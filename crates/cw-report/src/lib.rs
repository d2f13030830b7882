//! Report renderer for CardWatch.
//!
//! Turns a JSON data file and an HTML template into a finished report:
//!
//! - **Template substitution**: the data replaces `/* DATA_PLACEHOLDER */`
//!   as a `const reportData = ...;` declaration
//! - **PDF printing**: a headless browser loads the page, waits for
//!   `window.chartsRendered`, and prints tabloid pages
//! - **HTML fallback**: when no browser can be launched the substituted HTML
//!   is kept instead
//! - **Report index**: `report_index.json` records every generated file
//!
//! # Example
//!
//! ```no_run
//! use cw_report::{RenderConfig, ReportRenderer};
//! use std::path::Path;
//!
//! let renderer = ReportRenderer::chrome(RenderConfig::default());
//! let report = renderer
//!     .render_pdf(
//!         Path::new("templates/report-template.html"),
//!         Path::new("data.json"),
//!         Path::new("reports/out.pdf"),
//!     )
//!     .unwrap();
//! println!("{} bytes", report.bytes);
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod renderer;
pub mod store;
pub mod template;

pub use backend::{BrowserCheck, ChromeBackend, PdfBackend, PrintJob, PrintOutput};
pub use config::{MediaType, PdfOptions, RenderConfig};
pub use error::{ReportError, Result};
pub use renderer::{RenderedReport, ReportRenderer, HTML_FALLBACK_RENDERER};
pub use store::{report_filename, NewReport, ReportIndex, ReportStore};
pub use template::{substitute, DATA_PLACEHOLDER, DEFAULT_TEMPLATE};
