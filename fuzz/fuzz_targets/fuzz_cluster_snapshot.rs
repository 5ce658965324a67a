//! Fuzz target for cluster snapshot parsing.
//!
//! Both the split layout and kubectl `List` documents must be rejected
//! with an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use psr_core::snapshot::ClusterSnapshot;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = ClusterSnapshot::from_json(s);
    }
});
