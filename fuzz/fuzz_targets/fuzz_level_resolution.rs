//! Fuzz target for namespace classification and level resolution.
//!
//! Arbitrary names, label and annotation values must classify, and either
//! resolve or report no signal, without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use psr_common::NamespaceRecord;
use psr_core::{classify, resolve};

fuzz_target!(|data: &[u8]| {
    let Ok(ns) = serde_json::from_slice::<NamespaceRecord>(data) else {
        return;
    };
    let _ = classify(&ns);
    if let Ok(resolved) = resolve(&ns) {
        let _ = resolved.level();
    }
});
