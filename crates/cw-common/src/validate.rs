//! Presence and format checks run before any backend call.

use crate::id::PatientId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format used on the wire and in the CLI.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reasons a patient/date selection is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a patient")]
    MissingPatient,

    #[error("Please select both start and end dates")]
    MissingDates,

    #[error("Invalid {field} date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("Start date must be before end date")]
    StartAfterEnd,

    #[error("Weekday must be between 0 (Monday) and 6 (Sunday), got {0}")]
    InvalidWeekday(u8),

    #[error("Invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("Patient ID '{0}' cannot be used in a file name")]
    UnsafePatientId(String),
}

/// Inclusive reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start_str(), self.end_str())
    }
}

/// First day of `today`'s month through `today`.
pub fn default_date_range(today: NaiveDate) -> DateRange {
    let start = today.with_day(1).unwrap_or(today);
    DateRange { start, end: today }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Check a patient/date selection and return it in typed form.
///
/// The checks run in the same order the dashboard reports them: patient
/// first, then presence of both dates, then format, then ordering. Equal
/// start and end dates are accepted.
pub fn validate_inputs(
    patient_id: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<(PatientId, DateRange), ValidationError> {
    let patient = present(patient_id).ok_or(ValidationError::MissingPatient)?;

    let (start, end) = match (present(start_date), present(end_date)) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(ValidationError::MissingDates),
    };

    let start = parse_date("start", start)?;
    let end = parse_date("end", end)?;
    if start > end {
        return Err(ValidationError::StartAfterEnd);
    }

    Ok((PatientId::new(patient), DateRange { start, end }))
}

/// Patient ID that can be embedded in a report file name.
pub fn file_safe_patient(raw: &str) -> Result<PatientId, ValidationError> {
    let patient = PatientId::new(raw);
    if patient.is_blank() {
        return Err(ValidationError::MissingPatient);
    }
    let id = patient.as_str();
    if id.contains(['/', '\\', '\0']) || id.contains("..") {
        return Err(ValidationError::UnsafePatientId(id.to_string()));
    }
    Ok(patient)
}
