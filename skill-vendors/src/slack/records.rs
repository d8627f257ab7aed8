//! Flat records built from Slack Web API objects.

use chrono::{DateTime, SecondsFormat};
use serde_json::{json, Value};

use crate::flatten::at;

/// RFC 3339 time of a Slack `ts` such as `1700000000.123456`.
pub(super) fn posted_at(ts: &str) -> Option<String> {
    let (secs, fraction) = ts.split_once('.')?;
    if fraction.is_empty() || fraction.len() > 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = format!("{fraction:0<6}").parse().ok()?;
    let time = DateTime::from_timestamp(secs, micros.checked_mul(1000)?)?;
    Some(time.to_rfc3339_opts(SecondsFormat::Micros, true))
}

pub(super) fn message(m: &Value) -> Value {
    let user = if m["user"].is_null() { &m["bot_id"] } else { &m["user"] };
    json!({
        "ts": m["ts"],
        "user": user,
        "text": m["text"],
        "threadTs": m["thread_ts"],
        "replyCount": m["reply_count"].as_u64().unwrap_or(0),
        "postedAt": m["ts"].as_str().and_then(posted_at),
    })
}

pub(super) fn search_match(m: &Value) -> Value {
    json!({
        "ts": m["ts"],
        "user": m["user"],
        "username": m["username"],
        "text": m["text"],
        "channel": at(m, "/channel/id"),
        "channelName": at(m, "/channel/name"),
        "permalink": m["permalink"],
        "postedAt": m["ts"].as_str().and_then(posted_at),
    })
}

pub(super) fn channel(c: &Value) -> Value {
    json!({
        "id": c["id"],
        "name": c["name"],
        "isPrivate": c["is_private"],
        "isArchived": c["is_archived"],
        "isMember": c["is_member"],
        "topic": at(c, "/topic/value"),
        "purpose": at(c, "/purpose/value"),
        "memberCount": c["num_members"],
    })
}

pub(super) fn user(u: &Value) -> Value {
    json!({
        "id": u["id"],
        "name": u["name"],
        "realName": at(u, "/profile/real_name"),
        "displayName": at(u, "/profile/display_name"),
        "email": at(u, "/profile/email"),
        "title": at(u, "/profile/title"),
        "isBot": u["is_bot"],
        "deleted": u["deleted"],
        "timezone": u["tz"],
    })
}

/// `response_metadata.next_cursor`, or `null` once the listing is exhausted.
pub(super) fn next_cursor(body: &Value) -> Value {
    match body.pointer("/response_metadata/next_cursor").and_then(Value::as_str) {
        Some(cursor) if !cursor.is_empty() => Value::String(cursor.to_owned()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posted_at_keeps_microseconds() {
        assert_eq!(posted_at("1700000000.123456").as_deref(), Some("2023-11-14T22:13:20.123456Z"));
        assert_eq!(posted_at("garbage"), None);
        assert_eq!(posted_at("1700000000"), None);
    }

    #[test]
    fn short_fractions_are_fractions_of_a_second() {
        assert_eq!(posted_at("1700000000.5").as_deref(), Some("2023-11-14T22:13:20.500000Z"));
        assert_eq!(posted_at("1700000000.0001").as_deref(), Some("2023-11-14T22:13:20.000100Z"));
        assert_eq!(posted_at("1700000000.1234567"), None);
        assert_eq!(posted_at("1700000000.+5"), None);
    }

    #[test]
    fn message_falls_back_to_bot_id() {
        let m = json!({"ts": "1700000000.000100", "bot_id": "B01", "text": "deploy done"});
        let flat = message(&m);
        assert_eq!(flat["user"], "B01");
        assert_eq!(flat["replyCount"], 0);
        assert_eq!(flat["threadTs"], Value::Null);
        assert_eq!(flat["postedAt"], "2023-11-14T22:13:20.000100Z");
    }

    #[test]
    fn empty_cursor_means_done() {
        assert_eq!(next_cursor(&json!({"response_metadata": {"next_cursor": ""}})), Value::Null);
        assert_eq!(next_cursor(&json!({"response_metadata": {"next_cursor": "dXNlcjpVMDYx"}})), "dXNlcjpVMDYx");
        assert_eq!(next_cursor(&json!({})), Value::Null);
    }
}
