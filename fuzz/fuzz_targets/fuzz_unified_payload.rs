//! Fuzz target for unified report payloads.
//!
//! Any payload that deserializes must also build a dashboard view.

#![no_main]

use cw_common::{DashboardView, UnifiedReportData};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = serde_json::from_slice::<UnifiedReportData>(data) {
        let view = DashboardView::from_unified(&payload);
        assert!(view.nutrients.iter().all(|n| n.percent <= 100));
    }
});
