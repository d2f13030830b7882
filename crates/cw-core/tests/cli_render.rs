//! End-to-end rendering through the cardwatch binary.
//!
//! PDF output needs a browser, so these tests cover HTML rendering, the
//! HTML fallback with an unlaunchable browser, and the local report index.

mod common;

use common::{cardwatch, TEMPLATE};
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const DATA: &str = r#"{
  "patient_info": {"name": "Grace </script> Hopper", "age": 52},
  "nutrients": {"calories": {"target": 2000, "actual": 1800}},
  "food_items": [{"name": "Lentils", "quantity": 1, "date": "2024-03-02"}]
}"#;

fn fixture(dir: &Path) {
    fs::write(dir.join("template.html"), TEMPLATE).unwrap();
    fs::write(dir.join("data.json"), DATA).unwrap();
}

mod render_html {
    use super::*;

    #[test]
    fn writes_substituted_html() {
        let home = tempfile::tempdir().unwrap();
        fixture(home.path());

        cardwatch(home.path())
            .args(["render-html", "template.html", "data.json", "out/report.html"])
            .assert()
            .success()
            .stdout(predicate::str::contains("HTML report generated"));

        let html = fs::read_to_string(home.path().join("out/report.html")).unwrap();
        assert!(html.contains("const reportData = "));
        assert!(html.contains("Lentils"));
        assert!(!html.contains("/* DATA_PLACEHOLDER */"));
        assert!(html.contains(r"Grace \u003c/script> Hopper"));
    }

    #[test]
    fn json_output_and_index() {
        let home = tempfile::tempdir().unwrap();
        fixture(home.path());

        cardwatch(home.path())
            .args([
                "--format",
                "json",
                "render-html",
                "template.html",
                "data.json",
                "--patient",
                "7",
                "--start",
                "2024-03-01",
                "--end",
                "2024-03-31",
                "--reports-dir",
                "reports",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"ok\""))
            .stdout(predicate::str::contains("\"renderer\": \"html\""));

        let written: Vec<_> = fs::read_dir(home.path().join("reports"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".html"))
            .collect();
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with("7_nutrition_"));

        cardwatch(home.path())
            .args(["report", "index", "--patient", "7", "--reports-dir", "reports"])
            .assert()
            .success()
            .stdout(predicate::str::contains(written[0].as_str()))
            .stdout(predicate::str::contains("2024-03-01 to 2024-03-31"));

        cardwatch(home.path())
            .args(["report", "index", "--patient", "8", "--reports-dir", "reports"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No reports found."));
    }
}

mod recording {
    use super::*;

    #[test]
    fn patient_id_must_be_a_plain_name() {
        let home = tempfile::tempdir().unwrap();
        fixture(home.path());

        cardwatch(home.path())
            .args([
                "render-html",
                "template.html",
                "data.json",
                "--patient",
                "../escape",
                "--reports-dir",
                "reports",
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("cannot be used in a file name"));
        assert!(!home.path().join("reports").exists());
    }

    #[test]
    fn output_outside_reports_dir_is_refused() {
        let home = tempfile::tempdir().unwrap();
        fixture(home.path());

        cardwatch(home.path())
            .args([
                "render-html",
                "template.html",
                "data.json",
                "out/report.html",
                "--patient",
                "7",
                "--reports-dir",
                "reports",
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("only records reports inside"));
        assert!(!home.path().join("out/report.html").exists());
    }

    #[test]
    fn output_in_reports_subdir_is_indexed_by_relative_path() {
        let home = tempfile::tempdir().unwrap();
        fixture(home.path());

        cardwatch(home.path())
            .args([
                "render-html",
                "template.html",
                "data.json",
                "reports/march/7.html",
                "--patient",
                "7",
                "--reports-dir",
                "reports",
            ])
            .assert()
            .success();

        cardwatch(home.path())
            .args(["report", "index", "--patient", "7", "--reports-dir", "reports"])
            .assert()
            .success()
            .stdout(predicate::str::contains("march/7.html"));
    }
}

mod fallback {
    use super::*;

    fn broken_browser_config(home: &Path) {
        let dir = home.join("cardwatch");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.toml"),
            "[render]\nchrome_path = \"/nonexistent/cardwatch-test-chrome\"\n",
        )
        .unwrap();
    }

    #[test]
    fn verify_browser_reports_launch_error() {
        let home = tempfile::tempdir().unwrap();
        broken_browser_config(home.path());

        cardwatch(home.path())
            .arg("verify-browser")
            .assert()
            .code(1)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("Failed to launch browser"));
    }

    #[test]
    fn pdf_without_browser_fails() {
        let home = tempfile::tempdir().unwrap();
        fixture(home.path());
        broken_browser_config(home.path());

        cardwatch(home.path())
            .args(["render-pdf", "template.html", "data.json", "report.pdf"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Failed to launch browser"));
        assert!(!home.path().join("report.pdf").exists());
        assert!(!home.path().join("report.pdf.html").exists());
    }

    #[test]
    fn html_fallback_keeps_html() {
        let home = tempfile::tempdir().unwrap();
        fixture(home.path());
        broken_browser_config(home.path());

        cardwatch(home.path())
            .args([
                "render-pdf",
                "template.html",
                "data.json",
                "report.pdf",
                "--html-fallback",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("HTML report generated"));

        assert!(!home.path().join("report.pdf").exists());
        let html = fs::read_to_string(home.path().join("report.html")).unwrap();
        assert!(html.contains("const reportData = "));
    }
}
