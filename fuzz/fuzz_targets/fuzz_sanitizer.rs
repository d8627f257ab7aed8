//! Fuzz target: error sanitizer.
//!
//! Arbitrary vendor statuses, codes and messages must always classify to a
//! client or server error status with a non-empty message.

#![no_main]

use libfuzzer_sys::fuzz_target;
use skill_core::Sanitizer;

fuzz_target!(|input: (Option<u16>, Option<&str>, &str)| {
    let (status, code, message) = input;
    let sanitizer = Sanitizer::default();
    let out = sanitizer.classify(status, code, Some(message));
    assert!((400..=599).contains(&out.status), "status {} for {input:?}", out.status);
    assert!(!out.message.is_empty());
    let _ = sanitizer.redact(message);
});
