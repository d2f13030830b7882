//! Recurring report schedules.

use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use chrono::NaiveTime;
use cw_client::{ApiError, ReportingApi};
use cw_common::model::{ApiMessage, DEFAULT_SCHEDULE_TIME};
use cw_common::{Frequency, PatientId, ReportSection, ScheduledReport, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A checked schedule, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    report: ScheduledReport,
}

impl ScheduleRequest {
    /// Check and normalize a schedule.
    ///
    /// The weekday only applies to weekly schedules and is stored as 0
    /// otherwise. A missing time means [`DEFAULT_SCHEDULE_TIME`].
    pub fn new(
        patient: Option<&str>,
        frequency: Frequency,
        weekday: Option<u8>,
        time: Option<&str>,
        include_ai: bool,
    ) -> Result<Self, ValidationError> {
        let patient = patient
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::MissingPatient)?;

        let weekday = match frequency {
            Frequency::Weekly => {
                let day = weekday.unwrap_or(0);
                if day > 6 {
                    return Err(ValidationError::InvalidWeekday(day));
                }
                day
            }
            Frequency::Daily | Frequency::Monthly => 0,
        };

        let time = match time.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => NaiveTime::parse_from_str(t, "%H:%M")
                .map_err(|_| ValidationError::InvalidTime(t.to_string()))?
                .format("%H:%M")
                .to_string(),
            None => DEFAULT_SCHEDULE_TIME.to_string(),
        };

        Ok(Self {
            report: ScheduledReport {
                patient_id: PatientId::new(patient),
                frequency,
                weekday: Some(weekday),
                time: Some(time),
                include_ai,
                sections: None,
            },
        })
    }

    /// Restrict the generated report to `sections`; empty means all.
    pub fn with_sections(mut self, sections: Vec<ReportSection>) -> Self {
        self.report.sections = (!sections.is_empty()).then_some(sections);
        self
    }

    pub fn report(&self) -> &ScheduledReport {
        &self.report
    }

    pub fn into_report(self) -> ScheduledReport {
        self.report
    }
}

pub fn schedule<A: ReportingApi + ?Sized>(
    api: &A,
    request: &ScheduleRequest,
    ctx: &LogContext,
) -> Result<ApiMessage, ScheduleError> {
    let report = request.report();
    let ack = api.schedule_report(report)?;
    log_event!(
        ctx,
        INFO,
        event_names::SCHEDULE_CREATED,
        Stage::Schedule,
        "report scheduled",
        patient_id = report.patient_id.as_str(),
        frequency = report.frequency.as_str(),
        time = report.time_text()
    );
    Ok(ack)
}

/// Schedules, optionally for one patient.
pub fn list<A: ReportingApi + ?Sized>(
    api: &A,
    patient: Option<&PatientId>,
) -> Result<Vec<ScheduledReport>, ScheduleError> {
    Ok(api.get_scheduled_reports(patient)?)
}

pub fn cancel<A: ReportingApi + ?Sized>(
    api: &A,
    patient: &PatientId,
    frequency: Frequency,
    ctx: &LogContext,
) -> Result<ApiMessage, ScheduleError> {
    let ack = api.cancel_scheduled_report(patient, frequency)?;
    log_event!(
        ctx,
        INFO,
        event_names::SCHEDULE_CANCELLED,
        Stage::Schedule,
        "scheduled report cancelled",
        patient_id = patient.as_str(),
        frequency = frequency.as_str()
    );
    Ok(ack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeApi;

    #[test]
    fn test_weekday_forced_to_zero_unless_weekly() {
        let req = ScheduleRequest::new(Some("5"), Frequency::Daily, Some(4), None, true).unwrap();
        assert_eq!(req.report().weekday, Some(0));
        assert_eq!(req.report().frequency_text(), "Daily");

        let req = ScheduleRequest::new(Some("5"), Frequency::Weekly, Some(4), None, true).unwrap();
        assert_eq!(req.report().weekday, Some(4));
        assert_eq!(req.report().frequency_text(), "Weekly (Friday)");
    }

    #[test]
    fn test_weekday_range() {
        let err = ScheduleRequest::new(Some("5"), Frequency::Weekly, Some(7), None, true).unwrap_err();
        assert_eq!(err, ValidationError::InvalidWeekday(7));
        // Out-of-range days are ignored for non-weekly schedules.
        assert!(ScheduleRequest::new(Some("5"), Frequency::Monthly, Some(9), None, true).is_ok());
    }

    #[test]
    fn test_time_default_and_format() {
        let req = ScheduleRequest::new(Some("5"), Frequency::Daily, None, None, false).unwrap();
        assert_eq!(req.report().time_text(), "02:00");
        assert_eq!(req.report().include_ai_text(), "No");

        let req =
            ScheduleRequest::new(Some("5"), Frequency::Daily, None, Some(" 07:05 "), true).unwrap();
        assert_eq!(req.report().time.as_deref(), Some("07:05"));

        let err = ScheduleRequest::new(Some("5"), Frequency::Daily, None, Some("25:00"), true)
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidTime("25:00".into()));
    }

    #[test]
    fn test_missing_patient() {
        let err = ScheduleRequest::new(Some(" "), Frequency::Daily, None, None, true).unwrap_err();
        assert_eq!(err, ValidationError::MissingPatient);
    }

    #[test]
    fn test_sections() {
        let req = ScheduleRequest::new(Some("5"), Frequency::Daily, None, None, true)
            .unwrap()
            .with_sections(vec![]);
        assert_eq!(req.report().sections, None);
        let req = req.with_sections(vec![ReportSection::Summary]);
        assert_eq!(req.report().sections, Some(vec![ReportSection::Summary]));
    }

    #[test]
    fn test_schedule_list_cancel() {
        let api = FakeApi::default();
        let ctx = LogContext::new("run-test");
        let weekly =
            ScheduleRequest::new(Some("5"), Frequency::Weekly, Some(2), Some("06:30"), true)
                .unwrap();
        let other = ScheduleRequest::new(Some("6"), Frequency::Daily, None, None, true).unwrap();
        schedule(&api, &weekly, &ctx).unwrap();
        schedule(&api, &other, &ctx).unwrap();

        let mine = list(&api, Some(&PatientId::from("5"))).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].frequency_text(), "Weekly (Wednesday)");
        assert_eq!(list(&api, None).unwrap().len(), 2);

        cancel(&api, &PatientId::from("5"), Frequency::Weekly, &ctx).unwrap();
        assert!(list(&api, Some(&PatientId::from("5"))).unwrap().is_empty());

        let err = cancel(&api, &PatientId::from("5"), Frequency::Weekly, &ctx).unwrap_err();
        assert!(matches!(err, ScheduleError::Api(_)));
    }
}
