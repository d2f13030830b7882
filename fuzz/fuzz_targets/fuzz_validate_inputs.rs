//! Fuzz target for patient and date-range validation.
//!
//! Accepted ranges are never reversed.

#![no_main]

use arbitrary::Arbitrary;
use cw_common::validate_inputs;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Inputs<'a> {
    patient: Option<&'a str>,
    start: Option<&'a str>,
    end: Option<&'a str>,
}

fuzz_target!(|input: Inputs<'_>| {
    if let Ok(range) = validate_inputs(input.patient, input.start, input.end) {
        assert!(range.start <= range.end);
    }
});
