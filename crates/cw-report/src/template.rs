//! Data substitution into report templates.

use crate::error::{ReportError, Result};
use serde_json::Value;

/// Marker replaced by the report data.
pub const DATA_PLACEHOLDER: &str = "/* DATA_PLACEHOLDER */";

/// Built-in report template.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/report-template.html");

/// Compact JSON that cannot terminate an enclosing `<script>` element.
///
/// Every `<` is written as `\u003c`, which also rules out `<!--` and the
/// script-data escape states it opens. `<` only occurs inside JSON strings,
/// so the escape keeps the value unchanged.
pub fn script_safe_json(data: &Value) -> Result<String> {
    let json = serde_json::to_string(data)?;
    Ok(json.replace('<', "\\u003c"))
}

/// Replace the first placeholder with `const reportData = <json>;`.
pub fn substitute(template: &str, data: &Value) -> Result<String> {
    if !template.contains(DATA_PLACEHOLDER) {
        return Err(ReportError::MissingPlaceholder);
    }
    let declaration = format!("const reportData = {};", script_safe_json(data)?);
    Ok(template.replacen(DATA_PLACEHOLDER, &declaration, 1))
}

/// Minimal HTML escaping for text nodes and attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
