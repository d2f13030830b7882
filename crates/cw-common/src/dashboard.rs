//! Dashboard payload shapes and their normalized view.
//!
//! The backend answers a dashboard request in one of two shapes. The
//! unified shape has fixed calorie and macronutrient slots; the legacy shape
//! is a free-form map of nutrient names. Both are folded into a single
//! [`DashboardView`] so the CLI only renders one thing.

use crate::model::{
    lenient_number, null_as_default, AiAnalysis, FoodItem, MealEntry, NutrientTarget, Scalar,
};
use serde::{Deserialize, Serialize};

/// Patient block as embedded in dashboard payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<Scalar>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_items_consumed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_calories: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Macronutrients {
    #[serde(default)]
    pub carbs: Option<NutrientTarget>,
    #[serde(default)]
    pub protein: Option<NutrientTarget>,
    #[serde(default)]
    pub fat: Option<NutrientTarget>,
    #[serde(default)]
    pub fiber: Option<NutrientTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedNutrients {
    #[serde(default)]
    pub calories: Option<NutrientTarget>,
    #[serde(default)]
    pub macronutrients: Option<Macronutrients>,
}

/// Response of `/unified-report-data`.
///
/// `nutrients` is required: a payload without it is not a usable unified
/// response and must fail to parse so the caller can fall back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedReportData {
    #[serde(default)]
    pub patient_info: Option<PatientInfo>,
    pub nutrients: UnifiedNutrients,
    #[serde(default)]
    pub food_items: Option<Vec<FoodItem>>,
    #[serde(default)]
    pub food_consumed: Option<Vec<MealEntry>>,
    #[serde(default)]
    pub summary: Option<DashboardSummary>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
}

/// Response of `/dashboard-data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyDashboardData {
    #[serde(default)]
    pub patient: Option<PatientInfo>,
    /// Nutrient name to target/actual, in server order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub nutrients: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub food_items: Option<Vec<FoodItem>>,
    #[serde(default)]
    pub summary: Option<DashboardSummary>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub name: String,
    pub age: String,
    pub allergies: String,
}

impl PatientSummary {
    fn from_info(info: Option<&PatientInfo>) -> Self {
        let info = info.cloned().unwrap_or_default();
        let name = info
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "N/A".to_string());
        let age = info
            .age
            .map(|a| a.to_string())
            .filter(|a| !a.is_empty() && a != "0")
            .unwrap_or_else(|| "N/A".to_string());
        let allergies = match info.allergies {
            Some(list) if !list.is_empty() => list.join(", "),
            _ => "None recorded".to_string(),
        };
        Self {
            name,
            age,
            allergies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientCard {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub target: f64,
    pub actual: f64,
    pub percent: u8,
}

impl NutrientCard {
    fn new(label: impl Into<String>, unit: Option<&str>, values: Option<NutrientTarget>) -> Self {
        let values = values.unwrap_or_default();
        Self {
            label: label.into(),
            unit: unit.map(str::to_string),
            target: values.target.unwrap_or(0.0),
            actual: values.actual.unwrap_or(0.0),
            percent: values.percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRow {
    pub item: String,
    pub quantity: String,
    pub date: String,
}

impl FoodRow {
    fn new(name: Option<&str>, quantity: Option<&Scalar>, date: Option<&str>) -> Self {
        let present = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Self {
            item: present(name).unwrap_or_else(|| "Unknown".to_string()),
            quantity: quantity
                .map(|q| q.to_string())
                .filter(|q| !q.is_empty() && q != "0")
                .unwrap_or_else(|| "1".to_string()),
            date: present(date).unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub title: String,
    pub text: String,
}

/// Normalized dashboard, independent of the payload shape it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub patient: PatientSummary,
    pub nutrients: Vec<NutrientCard>,
    pub food: Vec<FoodRow>,
    pub total_items: f64,
    pub total_calories: f64,
    pub analysis: Vec<AnalysisSection>,
}

/// JavaScript-style `a || b` over optional numbers: zero counts as absent.
fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && v.is_finite())
}

fn analysis_sections(analysis: Option<&AiAnalysis>) -> Vec<AnalysisSection> {
    analysis
        .map(|a| {
            a.sections()
                .into_iter()
                .map(|(title, text)| AnalysisSection {
                    title: title.to_string(),
                    text: text.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// First character uppercased, rest untouched.
fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl DashboardView {
    pub fn from_unified(data: &UnifiedReportData) -> Self {
        let calories = data.nutrients.calories;
        let macros = data.nutrients.macronutrients.clone().unwrap_or_default();

        let nutrients = vec![
            NutrientCard::new("Calories", None, calories),
            NutrientCard::new("Carbohydrates", Some("g"), macros.carbs),
            NutrientCard::new("Protein", Some("g"), macros.protein),
            NutrientCard::new("Fat", Some("g"), macros.fat),
            NutrientCard::new("Fiber", Some("g"), macros.fiber),
        ];

        let items = data.food_items.as_deref().unwrap_or_default();
        let food: Vec<FoodRow> = if !items.is_empty() {
            items
                .iter()
                .map(|i| FoodRow::new(i.name.as_deref(), i.quantity.as_ref(), i.date.as_deref()))
                .collect()
        } else {
            data.food_consumed
                .as_deref()
                .unwrap_or_default()
                .iter()
                .flat_map(|meal| {
                    meal.items.iter().map(move |i| {
                        FoodRow::new(i.food.as_deref(), i.quantity.as_ref(), meal.time.as_deref())
                    })
                })
                .collect()
        };

        let summary = data.summary.clone().unwrap_or_default();
        let total_items = nonzero(summary.total_items_consumed)
            .or_else(|| nonzero(Some(items.len() as f64)))
            .unwrap_or(0.0);
        let total_calories = nonzero(summary.total_calories)
            .or_else(|| nonzero(calories.and_then(|c| c.actual)))
            .unwrap_or(0.0);

        Self {
            patient: PatientSummary::from_info(data.patient_info.as_ref()),
            nutrients,
            food,
            total_items,
            total_calories,
            analysis: analysis_sections(data.ai_analysis.as_ref()),
        }
    }

    pub fn from_legacy(data: &LegacyDashboardData) -> Self {
        let nutrients = data
            .nutrients
            .iter()
            .map(|(key, value)| {
                let values = serde_json::from_value::<NutrientTarget>(value.clone()).ok();
                NutrientCard::new(capitalize(key), None, values)
            })
            .collect();

        let food = data
            .food_items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|i| FoodRow::new(i.name.as_deref(), i.quantity.as_ref(), i.date.as_deref()))
            .collect();

        let summary = data.summary.clone().unwrap_or_default();

        Self {
            patient: PatientSummary::from_info(data.patient.as_ref()),
            nutrients,
            food,
            total_items: nonzero(summary.total_items_consumed).unwrap_or(0.0),
            total_calories: nonzero(summary.total_calories).unwrap_or(0.0),
            analysis: analysis_sections(data.ai_analysis.as_ref()),
        }
    }
}
