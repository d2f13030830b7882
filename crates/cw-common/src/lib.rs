//! CardWatch common types, IDs, and errors.
//!
//! This crate provides the foundational types shared by the client, the
//! report renderer and the CLI:
//! - Patient identity and the backend's JSON payload shapes
//! - Dashboard payload normalization (unified and legacy formats)
//! - Input validation for patient/date selections
//! - Progress percentage math
//! - Output format specifications

pub mod dashboard;
pub mod id;
pub mod model;
pub mod output;
pub mod percent;
pub mod validate;

pub use dashboard::{DashboardView, LegacyDashboardData, UnifiedReportData};
pub use id::PatientId;
pub use model::{
    AiAnalysis, ChatMessage, ChatResponse, ChatRole, Client, FoodItem, Frequency,
    GenerateReportResult, NutrientTarget, PatientReports, Report, ReportFormat, ReportSection,
    ScheduledReport,
};
pub use output::OutputFormat;
pub use percent::calculate_percentage;
pub use validate::{file_safe_patient, validate_inputs, DateRange, ValidationError};

/// Schema version stamped on JSON command output.
pub const SCHEMA_VERSION: &str = "1.0.0";
