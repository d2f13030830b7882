//! Fuzz target for config.toml parsing and validation.

#![no_main]

use cw_core::config::Config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    if let Ok(config) = toml::from_str::<Config>(text) {
        let _ = config.validate();
    }
});
