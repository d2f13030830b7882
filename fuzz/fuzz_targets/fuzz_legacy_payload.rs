//! Fuzz target for legacy dashboard payloads.

#![no_main]

use cw_common::{DashboardView, LegacyDashboardData};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = serde_json::from_slice::<LegacyDashboardData>(data) {
        let view = DashboardView::from_legacy(&payload);
        assert!(view.nutrients.iter().all(|n| n.percent <= 100));
    }
});
