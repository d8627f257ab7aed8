//! Fuzz target: envelope decoding and command resolution.
//!
//! Arbitrary bytes are decoded as an action request and resolved against
//! every skill's command table. Resolution may fail but must never panic,
//! and a failure is always a client error.

#![no_main]

use std::sync::{Arc, LazyLock};

use libfuzzer_sys::fuzz_target;
use skill_core::{ActionRequest, Skill, SkillError};
use skill_vendors::{
    linear::LinearSkill, notion::NotionSkill, slack::SlackSkill, supabase::SupabaseSkill,
    RecordingTransport, VendorTransport,
};

fn stub() -> Arc<dyn VendorTransport> {
    Arc::new(RecordingTransport::new())
}

static LINEAR: LazyLock<LinearSkill> = LazyLock::new(|| LinearSkill::new(stub()));
static SLACK: LazyLock<SlackSkill> = LazyLock::new(|| SlackSkill::new(stub(), Some(stub())));
static NOTION: LazyLock<NotionSkill> = LazyLock::new(|| NotionSkill::new(stub()));
static SUPABASE: LazyLock<SupabaseSkill> =
    LazyLock::new(|| SupabaseSkill::new(stub(), Some((stub(), "abcdefghijklmnopqrst".to_owned()))));

fn check<S: Skill>(skill: &S, request: &ActionRequest) {
    if let Err(err) = skill.table().resolve(request) {
        assert!(err.is_client_error(), "resolution produced a vendor error: {err}");
        assert!(!matches!(err, SkillError::Vendor(_)));
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(request) = serde_json::from_slice::<ActionRequest>(data) else {
        return;
    };
    check(&*LINEAR, &request);
    check(&*SLACK, &request);
    check(&*NOTION, &request);
    check(&*SUPABASE, &request);
});
