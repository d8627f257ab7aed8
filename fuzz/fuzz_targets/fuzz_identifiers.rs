//! Fuzz target: identifier canonicalization.
//!
//! Every parser must be total, and its canonical output must parse back to
//! itself.

#![no_main]

use libfuzzer_sys::fuzz_target;
use skill_core::id::{self, IssueKey, IssueRef};

fn stable(parse: fn(&str) -> Result<String, String>, raw: &str) {
    if let Ok(canonical) = parse(raw) {
        assert_eq!(parse(&canonical).as_deref(), Ok(canonical.as_str()), "input {raw:?}");
    }
}

fuzz_target!(|raw: &str| {
    stable(id::uuid, raw);
    stable(id::team_ref, raw);
    stable(id::slack_channel, raw);
    stable(id::slack_user, raw);
    stable(id::slack_ts, raw);
    stable(id::sql_ident, raw);
    stable(id::email, raw);
    stable(id::hex_color, raw);
    if let Ok(key) = IssueKey::parse(raw) {
        assert_eq!(IssueKey::parse(key.as_str()), Ok(key));
    }
    if let Ok(reference) = IssueRef::parse(raw) {
        assert_eq!(IssueRef::parse(reference.as_str()), Ok(reference));
    }
});
