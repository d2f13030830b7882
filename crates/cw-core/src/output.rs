//! Command output: JSON envelopes, Markdown views, and the error boundary.
//!
//! Payloads go to stdout. Errors go to stderr as a flat message, or as a
//! `{"status": "error", "error": {...}}` object for `--format json`.

use crate::chat::ChatError;
use crate::config::ConfigError;
use crate::dashboard::{Dashboard, DashboardError, DashboardOutcome, DataSource};
use crate::exit_codes::ExitCode;
use crate::schedule::ScheduleError;
use cw_client::ApiError;
use cw_common::dashboard::DashboardView;
use cw_common::{
    Client, GenerateReportResult, OutputFormat, Report, ScheduledReport, ValidationError,
    SCHEMA_VERSION,
};
use cw_report::{BrowserCheck, RenderedReport, ReportError};
use serde_json::{json, Value};
use std::fmt::Write as _;

/// A failed command, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub exit: ExitCode,
    pub message: String,
}

impl CommandError {
    pub fn new(exit: ExitCode, message: impl Into<String>) -> Self {
        Self {
            exit,
            message: message.into(),
        }
    }

    pub fn args(message: impl Into<String>) -> Self {
        Self::new(ExitCode::ArgsError, message)
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ValidationError> for CommandError {
    fn from(e: ValidationError) -> Self {
        Self::new(ExitCode::ValidationError, e.to_string())
    }
}

impl From<ApiError> for CommandError {
    fn from(e: ApiError) -> Self {
        Self::new(ExitCode::ApiError, e.to_string())
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        Self::new(ExitCode::ConfigError, e.to_string())
    }
}

impl From<ReportError> for CommandError {
    fn from(e: ReportError) -> Self {
        let exit = match &e {
            ReportError::Io { .. } | ReportError::IndexCorrupt { .. } => ExitCode::IoError,
            _ => ExitCode::RenderError,
        };
        Self::new(exit, e.to_string())
    }
}

impl From<DashboardError> for CommandError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::Validation(v) => v.into(),
            other => Self::new(ExitCode::ApiError, other.to_string()),
        }
    }
}

impl From<ChatError> for CommandError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::NoPatient => Self::new(ExitCode::ValidationError, e.to_string()),
            ChatError::Api(api) => api.into(),
        }
    }
}

impl From<ScheduleError> for CommandError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::Validation(v) => v.into(),
            ScheduleError::Api(api) => api.into(),
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ExitCode::IoError, format!("JSON serialization error: {e}"))
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ExitCode::IoError, e.to_string())
    }
}

/// Standard JSON envelope around a command payload.
pub fn envelope(command: &str, run_id: &str, payload: Value) -> Value {
    json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "command": command,
        "status": "ok",
        "data": payload,
    })
}

pub fn error_envelope(command: &str, run_id: &str, error: &CommandError) -> Value {
    json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "command": command,
        "status": "error",
        "error": {
            "code": error.exit.code_name(),
            "message": error.message,
        }
    })
}

pub fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Print a command error in the selected format.
pub fn print_error(format: OutputFormat, command: &str, run_id: &str, error: &CommandError) {
    match format {
        OutputFormat::Json => eprintln!("{}", to_pretty(&error_envelope(command, run_id, error))),
        OutputFormat::Summary => eprintln!("[{}] {}: {}", run_id, command, error),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => eprintln!("Error: {}", error),
    }
}

/// Print a successful result: the envelope for JSON, `md` for Markdown,
/// `summary` for the one-line format.
pub fn print_success(
    format: OutputFormat,
    command: &str,
    run_id: &str,
    payload: Value,
    md: impl FnOnce() -> String,
    summary: impl FnOnce() -> String,
) {
    match format {
        OutputFormat::Json => println!("{}", to_pretty(&envelope(command, run_id, payload))),
        OutputFormat::Summary => println!("[{}] {}: {}", run_id, command, summary()),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => print!("{}", md()),
    }
}

fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.1}", n)
    }
}

pub fn clients_markdown(clients: &[Client]) -> String {
    let mut out = String::from("# Patients\n\n");
    if clients.is_empty() {
        out.push_str("No patients found.\n");
        return out;
    }
    out.push_str("| ID | Name | Age | Allergies |\n|----|------|-----|-----------|\n");
    for c in clients {
        let age = c.age.as_ref().map(|a| a.to_string()).unwrap_or_default();
        let allergies = if c.allergies.is_empty() {
            "None recorded".to_string()
        } else {
            c.allergies.join(", ")
        };
        let _ = writeln!(out, "| {} | {} | {} | {} |", c.id, c.display_name(), age, allergies);
    }
    out
}

pub fn view_markdown(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Patient Information\n");
    let _ = writeln!(out, "- Name: {}", view.patient.name);
    let _ = writeln!(out, "- Age: {}", view.patient.age);
    let _ = writeln!(out, "- Allergies: {}\n", view.patient.allergies);

    out.push_str("## Nutrient Intake\n\n");
    out.push_str("| Nutrient | Target | Actual | Progress |\n|----------|--------|--------|----------|\n");
    for card in &view.nutrients {
        let unit = card.unit.as_deref().unwrap_or("");
        let _ = writeln!(
            out,
            "| {} | {}{unit} | {}{unit} | {}% |",
            card.label,
            fmt_number(card.target),
            fmt_number(card.actual),
            card.percent
        );
    }

    let _ = writeln!(
        out,
        "\nTotal items consumed: {}  \nTotal calories: {}\n",
        fmt_number(view.total_items),
        fmt_number(view.total_calories)
    );

    out.push_str("## Food Consumed\n\n");
    if view.food.is_empty() {
        out.push_str("No food items recorded.\n");
    } else {
        out.push_str("| Item | Quantity | Date |\n|------|----------|------|\n");
        for row in &view.food {
            let _ = writeln!(out, "| {} | {} | {} |", row.item, row.quantity, row.date);
        }
    }

    if !view.analysis.is_empty() {
        out.push_str("\n## AI Nutritional Analysis\n");
        for section in &view.analysis {
            let _ = write!(out, "\n### {}\n\n{}\n", section.title, section.text);
        }
    }
    out
}

pub fn dashboard_markdown(dashboard: &Dashboard) -> String {
    let mut out = format!(
        "# Nutrition Dashboard: patient {}\n\n{}\n\n",
        dashboard.patient_id, dashboard.range
    );
    match &dashboard.outcome {
        DashboardOutcome::Embedded { url } => {
            let _ = writeln!(out, "Embedded report: {url}");
        }
        DashboardOutcome::Data { source, view } => {
            if *source == DataSource::Legacy {
                out.push_str("_Showing legacy dashboard data._\n\n");
            }
            out.push_str(&view_markdown(view));
        }
    }
    out
}

pub fn generate_result_markdown(result: &GenerateReportResult) -> String {
    let mut out = format!("# {}\n\n", result.title());
    if let Some(message) = result.message.as_deref().filter(|m| !m.is_empty()) {
        let _ = writeln!(out, "{message}\n");
    }
    if let Some(file) = &result.file {
        let _ = writeln!(out, "- File: {file}");
    }
    if let Some(path) = &result.path {
        let _ = writeln!(out, "- Path: {path}");
    }
    let _ = writeln!(out, "- Format: {}", result.format_or_default());
    let _ = writeln!(out, "- Renderer: {}", result.renderer_or_default());
    if let Some(sections) = result.sections_included.as_ref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "- Sections: {}", sections.join(", "));
    }
    out
}

pub fn reports_markdown(patient: &str, reports: &[Report]) -> String {
    let mut out = format!("# Reports for patient {patient}\n\n");
    if reports.is_empty() {
        out.push_str("No reports found.\n");
        return out;
    }
    out.push_str("| File | Format | Generated | Period |\n|------|--------|-----------|--------|\n");
    for r in reports {
        let period = match (&r.date_range.start, &r.date_range.end) {
            (Some(s), Some(e)) => format!("{s} to {e}"),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            r.filename, r.format, r.generated_at, period
        );
    }
    out
}

pub fn schedules_markdown(reports: &[ScheduledReport]) -> String {
    let mut out = String::from("# Scheduled Reports\n\n");
    if reports.is_empty() {
        out.push_str("No scheduled reports.\n");
        return out;
    }
    out.push_str("| Patient | Frequency | Time | Include AI |\n|---------|-----------|------|------------|\n");
    for r in reports {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            r.patient_id,
            r.frequency_text(),
            r.time_text(),
            r.include_ai_text()
        );
    }
    out
}

pub fn rendered_markdown(report: &RenderedReport) -> String {
    match report.format {
        cw_common::ReportFormat::Pdf => {
            format!("PDF generated successfully: {}\n", report.path.display())
        }
        cw_common::ReportFormat::Html => {
            format!("HTML report generated: {}\n", report.path.display())
        }
    }
}

pub fn browser_check_markdown(check: &BrowserCheck) -> String {
    let executable = check
        .executable
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "located automatically".to_string());
    format!(
        "Browser launched successfully: {}\nExecutable: {}\n",
        check.product, executable
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::TierAttempt;
    use cw_common::{DashboardView, PatientId, UnifiedReportData};

    #[test]
    fn test_error_exit_mapping() {
        let e: CommandError = ValidationError::MissingPatient.into();
        assert_eq!(e.exit, ExitCode::ValidationError);
        assert_eq!(e.message, "Please select a patient");

        let e: CommandError = DashboardError::AllTiersFailed { attempts: vec![] }.into();
        assert_eq!(e.exit, ExitCode::ApiError);
        assert_eq!(e.message, "Failed to generate dashboard. Please try again.");

        let e: CommandError = ReportError::BrowserLaunch("no chrome".into()).into();
        assert_eq!(e.exit, ExitCode::RenderError);

        let e: CommandError = ChatError::NoPatient.into();
        assert_eq!(e.exit, ExitCode::ValidationError);
    }

    #[test]
    fn test_error_envelope() {
        let err = CommandError::new(ExitCode::ApiError, "Failed to fetch clients");
        let v = error_envelope("clients", "run-x", &err);
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"]["code"], "ERR_API");
        assert_eq!(v["error"]["message"], "Failed to fetch clients");
        assert_eq!(v["schema_version"], SCHEMA_VERSION);
    }

    #[test]
    fn test_envelope_wraps_payload() {
        let v = envelope("prompt", "run-x", json!({"a": 1}));
        assert_eq!(v["status"], "ok");
        assert_eq!(v["data"]["a"], 1);
        assert!(v["generated_at"].is_string());
    }

    #[test]
    fn test_browser_check_markdown() {
        let check = BrowserCheck {
            executable: None,
            product: "HeadlessChrome/120.0".to_string(),
        };
        let md = browser_check_markdown(&check);
        assert!(md.starts_with("Browser launched successfully: HeadlessChrome/120.0\n"));
        assert!(md.contains("Executable: located automatically"));
    }

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(1500.0), "1500");
        assert_eq!(fmt_number(12.34), "12.3");
    }

    #[test]
    fn test_dashboard_markdown() {
        let data: UnifiedReportData = serde_json::from_value(json!({
            "patient_info": {"name": "Ada", "age": 41},
            "nutrients": {"calories": {"target": 2000, "actual": 1500}},
            "food_items": [{"name": "Oats", "quantity": 2, "date": "2024-03-01"}],
            "ai_analysis": {"SUMMARY": "Balanced."}
        }))
        .unwrap();
        let dashboard = Dashboard {
            patient_id: PatientId::from("7"),
            range: cw_common::validate_inputs(Some("7"), Some("2024-03-01"), Some("2024-03-31"))
                .unwrap()
                .1,
            outcome: DashboardOutcome::Data {
                source: DataSource::Unified,
                view: DashboardView::from_unified(&data),
            },
            attempts: vec![TierAttempt {
                tier: crate::dashboard::Tier::Unified,
                error: None,
            }],
        };
        let md = dashboard_markdown(&dashboard);
        assert!(md.contains("2024-03-01 to 2024-03-31"));
        assert!(md.contains("| Calories | 2000 | 1500 | 75% |"));
        assert!(md.contains("| Oats | 2 | 2024-03-01 |"));
        assert!(md.contains("### Summary\n\nBalanced."));
    }

    #[test]
    fn test_schedules_markdown() {
        let r: ScheduledReport = serde_json::from_value(json!({
            "patient_id": 5, "frequency": "weekly", "weekday": 0, "include_ai": false
        }))
        .unwrap();
        let md = schedules_markdown(&[r]);
        assert!(md.contains("| 5 | Weekly (Monday) | 02:00 | No |"));
    }
}
