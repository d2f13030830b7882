//! End-to-end print through a real browser.
//!
//! Needs Chrome or Chromium on the machine; run with
//! `cargo test -p cw-report -- --ignored`.

use cw_report::{RenderConfig, ReportRenderer, DEFAULT_TEMPLATE};
use std::fs;

#[test]
#[ignore]
fn prints_default_template() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.html");
    let data = dir.path().join("data.json");
    let output = dir.path().join("report.pdf");
    fs::write(&template, DEFAULT_TEMPLATE).unwrap();
    fs::write(
        &data,
        r#"{"patient_info": {"name": "Live Test"}, "nutrients": {"calories": {"target": 2000, "actual": 1500}}}"#,
    )
    .unwrap();

    let renderer = ReportRenderer::chrome(RenderConfig::default());
    let report = renderer.render_pdf(&template, &data, &output).unwrap();

    assert_eq!(report.charts_rendered, Some(true));
    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(!dir.path().join("report.pdf.html").exists());
    assert!(!dir.path().join("report.pdf.html.debug.png").exists());
}
