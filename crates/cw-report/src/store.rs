//! Local index of generated report files.
//!
//! The index is a single `report_index.json` in the reports directory:
//!
//! ```json
//! {"reports": [{"patient_id": "4", "filename": "4_nutrition_20240101_120000.pdf", ...}]}
//! ```

use crate::error::{ReportError, Result};
use chrono::{Local, NaiveDateTime};
use cw_common::model::ReportRange;
use cw_common::{PatientId, Report, ReportFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::info;

pub const INDEX_FILE: &str = "report_index.json";

/// Default report type.
pub const NUTRITION: &str = "nutrition";

/// `<patient>_<type>_<YYYYmmdd_HHMMSS>.<format>`
pub fn report_filename(
    patient: &PatientId,
    report_type: &str,
    format: ReportFormat,
    now: NaiveDateTime,
) -> String {
    format!(
        "{}_{}_{}.{}",
        patient,
        report_type,
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportIndex {
    #[serde(default)]
    pub reports: Vec<Report>,
}

/// Metadata for a report about to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub patient_id: PatientId,
    pub filename: String,
    pub report_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Inferred from `filename` when absent.
    pub format: Option<ReportFormat>,
    pub renderer: Option<String>,
}

impl NewReport {
    pub fn new(patient_id: PatientId, filename: impl Into<String>) -> Self {
        Self {
            patient_id,
            filename: filename.into(),
            report_type: NUTRITION.to_string(),
            start_date: None,
            end_date: None,
            format: None,
            renderer: None,
        }
    }

    pub fn with_dates(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.renderer = Some(renderer.into());
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Reports directory plus its index file.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Path a report file with `filename` lives at.
    pub fn report_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Index name for `path`, relative to the reports directory.
    ///
    /// `None` when `path` is not inside the directory. The comparison is
    /// lexical; relative paths are taken from the current directory.
    pub fn relative_name(&self, path: &Path) -> Option<String> {
        let cwd = std::env::current_dir().ok()?;
        let rel = cwd.join(path);
        let rel = rel.strip_prefix(cwd.join(&self.dir)).ok()?;
        let parts = rel
            .components()
            .map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    /// Current index; empty when the file does not exist yet.
    pub fn load(&self) -> Result<ReportIndex> {
        let path = self.index_path();
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ReportIndex::default())
            }
            Err(e) => {
                return Err(ReportError::io(
                    format!("Failed to read {}", path.display()),
                    e,
                ))
            }
        };
        serde_json::from_str(&text).map_err(|source| ReportError::IndexCorrupt { path, source })
    }

    fn save(&self, index: &ReportIndex) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ReportError::io(
                format!("Failed to create reports directory {}", self.dir.display()),
                e,
            )
        })?;
        let path = self.index_path();
        let json = serde_json::to_string_pretty(index)?;
        fs::write(&path, json)
            .map_err(|e| ReportError::io(format!("Failed to write {}", path.display()), e))
    }

    /// Append a record stamped with the current local time.
    pub fn store(&self, entry: NewReport) -> Result<Report> {
        self.store_at(entry, Local::now().naive_local())
    }

    pub fn store_at(&self, entry: NewReport, now: NaiveDateTime) -> Result<Report> {
        let format = entry
            .format
            .unwrap_or_else(|| ReportFormat::from_filename(&entry.filename));
        let report = Report {
            patient_id: entry.patient_id,
            filename: entry.filename,
            report_type: entry.report_type,
            format,
            renderer: entry.renderer,
            generated_at: now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            date_range: ReportRange {
                start: entry.start_date,
                end: entry.end_date,
            },
        };

        let mut index = self.load()?;
        index.reports.push(report.clone());
        self.save(&index)?;
        info!(
            patient_id = %report.patient_id,
            filename = %report.filename,
            format = %report.format,
            "report recorded"
        );
        Ok(report)
    }

    /// Reports for `patient`, newest first.
    pub fn reports_for_patient(&self, patient: &PatientId) -> Result<Vec<Report>> {
        let mut reports: Vec<Report> = self
            .load()?
            .reports
            .into_iter()
            .filter(|r| r.patient_id.as_str() == patient.as_str())
            .collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(reports)
    }
}
