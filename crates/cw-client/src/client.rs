//! Blocking client for the reporting backend.

use crate::endpoints::Endpoints;
use crate::error::{ApiError, Result};
use cw_common::model::{ApiMessage, ChatRequest, ScheduledReportList};
use cw_common::{
    ChatMessage, ChatResponse, Client, Frequency, GenerateReportResult, LegacyDashboardData,
    PatientId, PatientReports, ReportSection, ScheduledReport, UnifiedReportData,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Operations the CLI controllers need from the backend.
///
/// [`ApiClient`] is the HTTP implementation; tests substitute in-memory
/// fakes.
pub trait ReportingApi {
    fn fetch_clients(&self) -> Result<Vec<Client>>;

    fn fetch_dashboard_data(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_analysis: bool,
    ) -> Result<LegacyDashboardData>;

    fn fetch_unified_report_data(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_ai: bool,
    ) -> Result<UnifiedReportData>;

    /// URL of the backend-rendered report. Pure; does not touch the network.
    fn embedded_report_url(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_ai: bool,
    ) -> String;

    /// Check that `url` loads (2xx).
    fn check_url(&self, url: &str) -> Result<()>;

    fn generate_report(
        &self,
        patient: Option<&PatientId>,
        start: Option<&str>,
        end: Option<&str>,
        sections: &[ReportSection],
        include_ai: bool,
    ) -> Result<GenerateReportResult>;

    fn get_patient_reports(&self, patient: &PatientId) -> Result<PatientReports>;

    fn send_chat_message(
        &self,
        patient: &PatientId,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatResponse>;

    fn fetch_health_data(&self, patient: &PatientId) -> Result<serde_json::Value>;

    fn fetch_prompt_response(&self) -> Result<serde_json::Value>;

    fn schedule_report(&self, request: &ScheduledReport) -> Result<ApiMessage>;

    fn get_scheduled_reports(&self, patient: Option<&PatientId>) -> Result<Vec<ScheduledReport>>;

    fn cancel_scheduled_report(
        &self,
        patient: &PatientId,
        frequency: Frequency,
    ) -> Result<ApiMessage>;
}

/// A backend operation and the message reported when it fails.
#[derive(Debug, Clone, Copy)]
struct Operation {
    name: &'static str,
    failure: &'static str,
    /// Prefer the `error` field of a failed response body over `failure`.
    body_error: bool,
}

impl Operation {
    const fn new(name: &'static str, failure: &'static str) -> Self {
        Self {
            name,
            failure,
            body_error: false,
        }
    }
}

const FETCH_CLIENTS: Operation = Operation::new("fetch_clients", "Failed to fetch clients");
const FETCH_DASHBOARD: Operation =
    Operation::new("fetch_dashboard_data", "Failed to fetch dashboard data");
const FETCH_UNIFIED: Operation = Operation::new(
    "fetch_unified_report_data",
    "Failed to fetch unified report data",
);
const CHECK_URL: Operation = Operation::new("check_url", "Failed to load embedded report");
const GENERATE_REPORT: Operation =
    Operation::new("generate_report", "Failed to generate PDF report");
const PATIENT_REPORTS: Operation =
    Operation::new("get_patient_reports", "Failed to fetch patient reports");
const SEND_CHAT: Operation = Operation {
    name: "send_chat_message",
    failure: "Failed to send chat message",
    body_error: true,
};
const HEALTH_DATA: Operation = Operation::new("fetch_health_data", "Failed to fetch health data");
const PROMPT: Operation = Operation::new("fetch_prompt_response", "Failed to fetch prompt response");
const SCHEDULE: Operation = Operation::new("schedule_report", "Failed to schedule report");
const LIST_SCHEDULED: Operation =
    Operation::new("get_scheduled_reports", "Failed to fetch scheduled reports");
const CANCEL_SCHEDULED: Operation =
    Operation::new("cancel_scheduled_report", "Failed to cancel scheduled report");

/// HTTP implementation of [`ReportingApi`].
///
/// One request per call: no retries, caching, or cancellation.
#[derive(Clone)]
pub struct ApiClient {
    endpoints: Endpoints,
    agent: ureq::Agent,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.endpoints.base())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(crate::endpoints::DEFAULT_BASE_URL)
    }
}

impl ApiClient {
    /// Client with no request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Self {
            endpoints: Endpoints::new(base_url),
            agent: builder.build(),
            timeout,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn base_url(&self) -> &str {
        self.endpoints.base()
    }

    fn get<T: DeserializeOwned>(&self, op: Operation, url: &str) -> Result<T> {
        debug!(operation = op.name, url = %url, "GET");
        let result = self.agent.get(url).call();
        self.finish(op, url, result)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        op: Operation,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(operation = op.name, url = %url, "POST");
        let result = self.agent.post(url).send_json(body);
        self.finish(op, url, result)
    }

    fn finish<T: DeserializeOwned>(
        &self,
        op: Operation,
        url: &str,
        result: std::result::Result<ureq::Response, ureq::Error>,
    ) -> Result<T> {
        let response = result.map_err(|e| call_error(op, url, e))?;
        let body = response.into_string().map_err(|e| {
            let err = ApiError::Transport {
                message: op.failure.to_string(),
                detail: e.to_string(),
            };
            error!(operation = op.name, url = %url, error = %err, "failed to read response body");
            err
        })?;
        serde_json::from_str(&body).map_err(|e| {
            let err = ApiError::InvalidResponse {
                message: op.failure.to_string(),
                detail: e.to_string(),
            };
            error!(operation = op.name, url = %url, error = %err, "response was not the expected JSON");
            err
        })
    }
}

/// Convert a ureq failure into an [`ApiError`], logging it.
fn call_error(op: Operation, url: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = if op.body_error {
                body_error_message(response).unwrap_or_else(|| op.failure.to_string())
            } else {
                op.failure.to_string()
            };
            error!(operation = op.name, url = %url, status, "{}", message);
            ApiError::Status { status, message }
        }
        ureq::Error::Transport(transport) => {
            let detail = transport.to_string();
            error!(operation = op.name, url = %url, error = %detail, "{}", op.failure);
            ApiError::Transport {
                message: op.failure.to_string(),
                detail,
            }
        }
    }
}

/// The `error` string of a JSON error body, if any.
fn body_error_message(response: ureq::Response) -> Option<String> {
    let body: serde_json::Value = response.into_json().ok()?;
    body.get("error")
        .and_then(|e| e.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ReportingApi for ApiClient {
    fn fetch_clients(&self) -> Result<Vec<Client>> {
        self.get(FETCH_CLIENTS, &self.endpoints.clients())
    }

    fn fetch_dashboard_data(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_analysis: bool,
    ) -> Result<LegacyDashboardData> {
        let url = self
            .endpoints
            .dashboard_data(patient, start, end, include_analysis);
        self.get(FETCH_DASHBOARD, &url)
    }

    fn fetch_unified_report_data(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_ai: bool,
    ) -> Result<UnifiedReportData> {
        let url = self
            .endpoints
            .unified_report_data(patient, start, end, include_ai);
        self.get(FETCH_UNIFIED, &url)
    }

    fn embedded_report_url(
        &self,
        patient: &PatientId,
        start: Option<&str>,
        end: Option<&str>,
        include_ai: bool,
    ) -> String {
        self.endpoints.embedded_report(patient, start, end, include_ai)
    }

    fn check_url(&self, url: &str) -> Result<()> {
        debug!(operation = CHECK_URL.name, url = %url, "GET");
        self.agent
            .get(url)
            .call()
            .map(|_| ())
            .map_err(|e| call_error(CHECK_URL, url, e))
    }

    fn generate_report(
        &self,
        patient: Option<&PatientId>,
        start: Option<&str>,
        end: Option<&str>,
        sections: &[ReportSection],
        include_ai: bool,
    ) -> Result<GenerateReportResult> {
        let url = self
            .endpoints
            .generate_report(patient, start, end, sections, include_ai);
        self.get(GENERATE_REPORT, &url)
    }

    fn get_patient_reports(&self, patient: &PatientId) -> Result<PatientReports> {
        self.get(PATIENT_REPORTS, &self.endpoints.patient_reports(patient))
    }

    fn send_chat_message(
        &self,
        patient: &PatientId,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatResponse> {
        let body = ChatRequest {
            patient_id: patient.clone(),
            message: message.to_string(),
            chat_history: history.to_vec(),
        };
        self.post(SEND_CHAT, &self.endpoints.chat(), &body)
    }

    fn fetch_health_data(&self, patient: &PatientId) -> Result<serde_json::Value> {
        self.get(HEALTH_DATA, &self.endpoints.health_data(patient))
    }

    fn fetch_prompt_response(&self) -> Result<serde_json::Value> {
        self.get(PROMPT, &self.endpoints.prompt())
    }

    fn schedule_report(&self, request: &ScheduledReport) -> Result<ApiMessage> {
        self.post(SCHEDULE, &self.endpoints.schedule_report(), request)
    }

    fn get_scheduled_reports(&self, patient: Option<&PatientId>) -> Result<Vec<ScheduledReport>> {
        let list: ScheduledReportList =
            self.get(LIST_SCHEDULED, &self.endpoints.scheduled_reports(patient))?;
        Ok(list.scheduled_reports)
    }

    fn cancel_scheduled_report(
        &self,
        patient: &PatientId,
        frequency: Frequency,
    ) -> Result<ApiMessage> {
        let body = serde_json::json!({
            "patient_id": patient,
            "frequency": frequency,
        });
        self.post(CANCEL_SCHEDULED, &self.endpoints.cancel_scheduled_report(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_shows_base_url() {
        let client = ApiClient::with_timeout("http://h:1/", Some(Duration::from_secs(5)));
        let debug = format!("{:?}", client);
        assert!(debug.contains("http://h:1"));
        assert!(debug.contains("5s"));
    }

    #[test]
    fn test_embedded_url_is_pure() {
        let client = ApiClient::new("http://h:1");
        let url = client.embedded_report_url(&PatientId::from("2"), None, None, true);
        assert_eq!(url, "http://h:1/embedded-report?patient_id=2&include_ai=true");
    }

    #[test]
    fn test_transport_error_on_closed_port() {
        // Port 9 (discard) is not listening on test hosts.
        let client = ApiClient::with_timeout("http://127.0.0.1:9", Some(Duration::from_secs(2)));
        let err = client.fetch_clients().unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert!(err.to_string().starts_with("Failed to fetch clients"));
    }
}
