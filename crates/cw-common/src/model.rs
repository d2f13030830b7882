//! JSON payloads exchanged with the reporting backend.
//!
//! The backend is loosely typed: most fields are optional and numbers
//! sometimes arrive as strings. Every struct here deserializes leniently so
//! one odd field does not discard a whole response.

use crate::id::PatientId;
use crate::percent::calculate_percentage;
use crate::validate::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// `null` decodes as the type's default, like a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Free text from a model-written field.
///
/// Strings pass through, lists are joined one entry per line, other scalars
/// are stringified and objects are kept as compact JSON. `null` is absent.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

/// A number that may arrive as a numeric string. Anything else is absent.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let lines: Vec<String> = items.into_iter().filter_map(value_text).collect();
            Some(lines.join("\n"))
        }
        other @ Value::Object(_) => Some(other.to_string()),
    }
}

/// A number or free text, as the backend sends quantities and ages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A patient as listed by `/clients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: PatientId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<Scalar>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allergies: Vec<String>,
}

impl Client {
    /// Name for pickers and headers; unnamed patients show as `Patient <id>`.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Patient {}", self.id),
        }
    }
}

/// Target/actual pair for one nutrient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTarget {
    #[serde(default, deserialize_with = "lenient_number")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub actual: Option<f64>,
}

impl NutrientTarget {
    pub fn new(target: f64, actual: f64) -> Self {
        Self {
            target: Some(target),
            actual: Some(actual),
        }
    }

    pub fn percent(&self) -> u8 {
        calculate_percentage(self.actual, self.target)
    }
}

/// One consumed food item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<Scalar>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub calories: Option<f64>,
}

/// A meal group in the unified `food_consumed` shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<MealItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    #[serde(default)]
    pub food: Option<String>,
    #[serde(default)]
    pub quantity: Option<Scalar>,
}

/// AI-written commentary attached to dashboard data.
///
/// The backend uses uppercase keys for these fields. They hold whatever the
/// language model produced, so each is read through [`lenient_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(rename = "SUMMARY", default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(rename = "ANALYSIS", default, deserialize_with = "lenient_text")]
    pub analysis: Option<String>,
    #[serde(rename = "RECOMMENDATIONS", default, deserialize_with = "lenient_text")]
    pub recommendations: Option<String>,
    #[serde(rename = "HEALTH_INSIGHTS", default, deserialize_with = "lenient_text")]
    pub health_insights: Option<String>,
}

impl AiAnalysis {
    /// Non-empty sections with their display titles, in display order.
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("Summary", &self.summary),
            ("Detailed Analysis", &self.analysis),
            ("Recommendations", &self.recommendations),
            ("Health Insights", &self.health_insights),
        ]
        .into_iter()
        .filter_map(|(title, text)| {
            text.as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(|t| (title, t))
        })
        .collect()
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Html,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Html => "html",
        }
    }

    /// Infer the format from a filename's extension; unknown means PDF.
    pub fn from_filename(filename: &str) -> Self {
        match std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("html") | Some("htm") => ReportFormat::Html,
            _ => ReportFormat::Pdf,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Start/end strings as stored with a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

fn default_report_type() -> String {
    "nutrition".to_string()
}

/// Metadata for a generated report file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub patient_id: PatientId,
    pub filename: String,
    #[serde(default = "default_report_type")]
    pub report_type: String,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub renderer: Option<String>,
    /// ISO-8601 local timestamp; compared as a string for ordering.
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub date_range: ReportRange,
}

/// Response of `/get-patient-reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientReports {
    pub patient_id: PatientId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reports: Vec<Report>,
}

/// Sections a generated report may include.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    #[value(name = "calories")]
    Calories,
    #[value(name = "macronutrients")]
    Macronutrients,
    #[value(name = "food_consumed")]
    FoodConsumed,
    #[value(name = "food_group_recommendations")]
    FoodGroupRecommendations,
    #[value(name = "nutrient_intake")]
    NutrientIntake,
    #[value(name = "ai_analysis")]
    AiAnalysis,
    #[value(name = "summary")]
    Summary,
}

impl ReportSection {
    pub const ALL: [ReportSection; 7] = [
        ReportSection::Calories,
        ReportSection::Macronutrients,
        ReportSection::FoodConsumed,
        ReportSection::FoodGroupRecommendations,
        ReportSection::NutrientIntake,
        ReportSection::AiAnalysis,
        ReportSection::Summary,
    ];

    /// Wire identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ReportSection::Calories => "calories",
            ReportSection::Macronutrients => "macronutrients",
            ReportSection::FoodConsumed => "food_consumed",
            ReportSection::FoodGroupRecommendations => "food_group_recommendations",
            ReportSection::NutrientIntake => "nutrient_intake",
            ReportSection::AiAnalysis => "ai_analysis",
            ReportSection::Summary => "summary",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportSection::Calories => "Calories",
            ReportSection::Macronutrients => "Macronutrients",
            ReportSection::FoodConsumed => "Food Consumed",
            ReportSection::FoodGroupRecommendations => "Food Group Recommendations",
            ReportSection::NutrientIntake => "Nutrient Intake",
            ReportSection::AiAnalysis => "AI Nutritional Analysis",
            ReportSection::Summary => "Summary",
        }
    }
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response of `/generate-report`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateReportResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub format: Option<ReportFormat>,
    #[serde(default)]
    pub renderer: Option<String>,
    #[serde(default)]
    pub sections_included: Option<Vec<String>>,
}

impl GenerateReportResult {
    pub fn format_or_default(&self) -> ReportFormat {
        self.format.unwrap_or_default()
    }

    /// "PDF Report Generated" or "HTML Report Generated".
    pub fn title(&self) -> &'static str {
        match self.format_or_default() {
            ReportFormat::Html => "HTML Report Generated",
            ReportFormat::Pdf => "PDF Report Generated",
        }
    }

    pub fn renderer_or_default(&self) -> &str {
        self.renderer.as_deref().unwrap_or("standard")
    }
}

/// How often a scheduled report runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// Capitalized label for display.
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekday names indexed Monday = 0.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub fn weekday_name(index: u8) -> Result<&'static str, ValidationError> {
    WEEKDAYS
        .get(index as usize)
        .copied()
        .ok_or(ValidationError::InvalidWeekday(index))
}

pub const DEFAULT_SCHEDULE_TIME: &str = "02:00";

fn default_true() -> bool {
    true
}

/// A recurring report-generation request keyed by patient and frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReport {
    pub patient_id: PatientId,
    pub frequency: Frequency,
    #[serde(default)]
    pub weekday: Option<u8>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default = "default_true")]
    pub include_ai: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<ReportSection>>,
}

impl ScheduledReport {
    /// `Weekly (Monday)`, `Daily`, ...
    pub fn frequency_text(&self) -> String {
        match (self.frequency, self.weekday) {
            (Frequency::Weekly, Some(day)) => match weekday_name(day) {
                Ok(name) => format!("{} ({})", self.frequency.label(), name),
                Err(_) => self.frequency.label().to_string(),
            },
            _ => self.frequency.label().to_string(),
        }
    }

    pub fn time_text(&self) -> &str {
        self.time
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SCHEDULE_TIME)
    }

    pub fn include_ai_text(&self) -> &'static str {
        if self.include_ai {
            "Yes"
        } else {
            "No"
        }
    }
}

/// Response of the scheduled-report listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduledReportList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub scheduled_reports: Vec<ScheduledReport>,
}

/// Generic `{status, message}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatRole {
    /// Sender label shown next to a message.
    pub fn sender_name(self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "AI Nutritionist",
            ChatRole::System => "CardWatch AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub patient_id: PatientId,
    pub message: String,
    pub chat_history: Vec<ChatMessage>,
}

/// Response of `POST /chat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Markdown text.
    #[serde(default)]
    pub response: String,
    /// Server-side view of the whole conversation, when provided.
    #[serde(default)]
    pub chat_history: Option<Vec<ChatMessage>>,
}
