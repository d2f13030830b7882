//! URL construction for every backend endpoint.
//!
//! These are pure functions of the base URL and the call parameters so the
//! exact query strings can be checked without a server.

use cw_common::{PatientId, ReportSection};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5174";

// Unreserved characters per RFC 3986 stay literal.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Ordered query string builder.
#[derive(Debug, Default)]
struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    fn push(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    fn push_opt(&mut self, key: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            self.pairs.push((key, v.to_string()));
        }
        self
    }

    fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, QUERY_ENCODE_SET)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Backend URL factory bound to one base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str, query: Option<&Query>) -> String {
        match query {
            Some(q) if !q.pairs.is_empty() => format!("{}{}?{}", self.base, path, q.encode()),
            _ => format!("{}{}", self.base, path),
        }
    }

    pub fn clients(&self) -> String {
        self.url("/clients", None)
    }

    pub fn dashboard_data(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_analysis: bool,
    ) -> String {
        let mut q = Query::default();
        q.push("patient_id", patient)
            .push("include_analysis", include_analysis)
            .push_opt("start_date", start)
            .push_opt("end_date", end);
        self.url("/dashboard-data", Some(&q))
    }

    fn report_query(
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_ai: bool,
    ) -> Query {
        let mut q = Query::default();
        q.push("patient_id", patient)
            .push_opt("start_date", start)
            .push_opt("end_date", end)
            .push("include_ai", include_ai);
        q
    }

    pub fn unified_report_data(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_ai: bool,
    ) -> String {
        let q = Self::report_query(patient, start, end, include_ai);
        self.url("/unified-report-data", Some(&q))
    }

    /// Address of the backend-rendered HTML report.
    pub fn embedded_report(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_ai: bool,
    ) -> String {
        let q = Self::report_query(patient, start, end, include_ai);
        self.url("/embedded-report", Some(&q))
    }

    pub fn generate_report(
        &self,
        patient: Option<&PatientId>,
        start: Option<&str>,
        end: Option<&str>,
        sections: &[ReportSection],
        include_ai: bool,
    ) -> String {
        let mut q = Query::default();
        q.push_opt("patient_id", patient.map(PatientId::as_str))
            .push_opt("start_date", start)
            .push_opt("end_date", end);
        if !sections.is_empty() {
            let joined = sections
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(",");
            q.push("sections", joined);
        }
        q.push("include_ai", include_ai);
        self.url("/generate-report", Some(&q))
    }

    pub fn patient_reports(&self, patient: &PatientId) -> String {
        let mut q = Query::default();
        q.push("patient_id", patient);
        self.url("/get-patient-reports", Some(&q))
    }

    pub fn chat(&self) -> String {
        self.url("/chat", None)
    }

    pub fn health_data(&self, patient: &PatientId) -> String {
        let mut q = Query::default();
        q.push("patient_id", patient);
        self.url("/health-data", Some(&q))
    }

    pub fn prompt(&self) -> String {
        self.url("/prompt", None)
    }

    pub fn schedule_report(&self) -> String {
        self.url("/schedule-report", None)
    }

    pub fn scheduled_reports(&self, patient: Option<&PatientId>) -> String {
        let mut q = Query::default();
        q.push_opt("patient_id", patient.map(PatientId::as_str));
        self.url("/scheduled-reports", Some(&q))
    }

    pub fn cancel_scheduled_report(&self) -> String {
        self.url("/cancel-scheduled-report", None)
    }
}
