//! Fuzz target for report_index.json parsing.

#![no_main]

use cw_report::ReportIndex;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Corrupt indexes must be an error, never a panic
    let _ = serde_json::from_slice::<ReportIndex>(data);
});
