//! Fuzz target: read-only SQL classifier.
//!
//! An accepted query must be a single, non-empty statement once comments
//! are stripped.

#![no_main]

use libfuzzer_sys::fuzz_target;
use skill_core::{check_read_only, is_select_query, sql::strip_comments};

fuzz_target!(|query: &str| {
    let accepted = check_read_only(query).is_ok();
    assert_eq!(accepted, is_select_query(query));
    if accepted {
        let stripped = strip_comments(query);
        assert!(!stripped.trim().is_empty(), "accepted an empty query");
        assert!(!stripped.contains(';'), "accepted multiple statements {query:?}");
    }
});
