//! Fuzz target for template substitution.
//!
//! Substituted JSON must never close the surrounding script element or
//! open a comment inside it.

#![no_main]

use cw_report::{substitute, DATA_PLACEHOLDER};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let template = format!("<script>{DATA_PLACEHOLDER}</script>");
    let data = serde_json::Value::String(text.to_string());
    if let Ok(html) = substitute(&template, &data) {
        assert_eq!(html.matches("</script>").count(), 1);
        assert_eq!(html.matches('<').count(), 2);
        assert!(!html.contains("<!--"));
    }
});
