//! Fuzz target for controller config parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use psr_config::{validate_config, ControllerConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<ControllerConfig>(data) {
        let _ = validate_config(&config);
    }
});
