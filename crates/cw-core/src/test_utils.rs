//! In-memory [`ReportingApi`] for controller tests.

use cw_client::{ApiError, ReportingApi, Result};
use cw_common::model::ApiMessage;
use cw_common::{
    ChatMessage, ChatResponse, Client, Frequency, GenerateReportResult, LegacyDashboardData,
    PatientId, PatientReports, ReportSection, ScheduledReport, UnifiedReportData,
};
use serde_json::{json, Value};
use std::cell::RefCell;

fn failed(message: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        message: message.to_string(),
    }
}

/// Scripted backend. `None` payloads answer with a 500.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub embedded_ok: bool,
    pub unified: Option<Value>,
    pub legacy: Option<Value>,
    pub chat_reply: Option<ChatResponse>,
    /// Operation names in call order.
    pub calls: RefCell<Vec<&'static str>>,
    /// `(message, history)` of every chat request.
    pub chat_requests: RefCell<Vec<(String, Vec<ChatMessage>)>>,
    pub scheduled: RefCell<Vec<ScheduledReport>>,
}

impl FakeApi {
    pub fn record(&self, name: &'static str) {
        self.calls.borrow_mut().push(name);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn unified_payload() -> Value {
        json!({
            "patient_info": {"name": "Ada", "age": 41, "allergies": ["peanuts"]},
            "nutrients": {
                "calories": {"target": 2000, "actual": 1500},
                "macronutrients": {"protein": {"target": 100, "actual": 120}}
            },
            "food_items": [{"name": "Oats", "quantity": 2, "date": "2024-03-01"}]
        })
    }

    pub fn legacy_payload() -> Value {
        json!({
            "patient": {"name": "Ada"},
            "nutrients": {"sodium": {"target": 2300, "actual": 1150}},
            "summary": {"total_items_consumed": 3, "total_calories": 900}
        })
    }
}

impl ReportingApi for FakeApi {
    fn fetch_clients(&self) -> Result<Vec<Client>> {
        self.record("fetch_clients");
        Err(failed("Failed to fetch clients"))
    }

    fn fetch_dashboard_data(
        &self,
        _patient: &PatientId,
        _start: Option<&str>,
        _end: Option<&str>,
        _include_analysis: bool,
    ) -> Result<LegacyDashboardData> {
        self.record("fetch_dashboard_data");
        let value = self
            .legacy
            .clone()
            .ok_or_else(|| failed("Failed to fetch dashboard data"))?;
        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse {
            message: "Failed to fetch dashboard data".into(),
            detail: e.to_string(),
        })
    }

    fn fetch_unified_report_data(
        &self,
        _patient: &PatientId,
        _start: Option<&str>,
        _end: Option<&str>,
        _include_ai: bool,
    ) -> Result<UnifiedReportData> {
        self.record("fetch_unified_report_data");
        let value = self
            .unified
            .clone()
            .ok_or_else(|| failed("Failed to fetch unified report data"))?;
        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse {
            message: "Failed to fetch unified report data".into(),
            detail: e.to_string(),
        })
    }

    fn embedded_report_url(
        &self,
        patient: &PatientId,
        _start: Option<&str>,
        _end: Option<&str>,
        _include_ai: bool,
    ) -> String {
        format!("http://fake/embedded-report?patient_id={patient}")
    }

    fn check_url(&self, _url: &str) -> Result<()> {
        self.record("check_url");
        if self.embedded_ok {
            Ok(())
        } else {
            Err(failed("Failed to load embedded report"))
        }
    }

    fn generate_report(
        &self,
        _patient: Option<&PatientId>,
        _start: Option<&str>,
        _end: Option<&str>,
        _sections: &[ReportSection],
        _include_ai: bool,
    ) -> Result<GenerateReportResult> {
        self.record("generate_report");
        Err(failed("Failed to generate PDF report"))
    }

    fn get_patient_reports(&self, _patient: &PatientId) -> Result<PatientReports> {
        self.record("get_patient_reports");
        Err(failed("Failed to fetch patient reports"))
    }

    fn send_chat_message(
        &self,
        _patient: &PatientId,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatResponse> {
        self.record("send_chat_message");
        self.chat_requests
            .borrow_mut()
            .push((message.to_string(), history.to_vec()));
        self.chat_reply
            .clone()
            .ok_or_else(|| failed("AI service unavailable"))
    }

    fn fetch_health_data(&self, _patient: &PatientId) -> Result<Value> {
        self.record("fetch_health_data");
        Err(failed("Failed to fetch health data"))
    }

    fn fetch_prompt_response(&self) -> Result<Value> {
        self.record("fetch_prompt_response");
        Err(failed("Failed to fetch prompt response"))
    }

    fn schedule_report(&self, request: &ScheduledReport) -> Result<ApiMessage> {
        self.record("schedule_report");
        self.scheduled.borrow_mut().push(request.clone());
        Ok(ApiMessage {
            status: Some("success".into()),
            message: Some("Report scheduled".into()),
        })
    }

    fn get_scheduled_reports(&self, patient: Option<&PatientId>) -> Result<Vec<ScheduledReport>> {
        self.record("get_scheduled_reports");
        Ok(self
            .scheduled
            .borrow()
            .iter()
            .filter(|r| patient.map_or(true, |p| &r.patient_id == p))
            .cloned()
            .collect())
    }

    fn cancel_scheduled_report(
        &self,
        patient: &PatientId,
        frequency: Frequency,
    ) -> Result<ApiMessage> {
        self.record("cancel_scheduled_report");
        let mut scheduled = self.scheduled.borrow_mut();
        let before = scheduled.len();
        scheduled.retain(|r| !(&r.patient_id == patient && r.frequency == frequency));
        if scheduled.len() == before {
            return Err(ApiError::Status {
                status: 404,
                message: "Failed to cancel scheduled report".into(),
            });
        }
        Ok(ApiMessage {
            status: Some("success".into()),
            message: Some("Scheduled report cancelled".into()),
        })
    }
}
