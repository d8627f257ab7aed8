//! Slack skill: channels, messages, users, reactions and search over the
//! Slack Web API.
//!
//! Bot-token calls cover everything except `search.messages`, which Slack
//! only serves to user tokens.

mod records;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use skill_core::config::prefixed;
use skill_core::id;
use skill_core::{
    ActionEntry, ActionTable, ConfigError, KeyValues, ParamReader, Params, Rule, Sanitizer, Skill, SkillError,
    VendorError,
};

use crate::flatten::records;
use crate::http::HttpTransport;
use crate::transport::{VendorRequest, VendorTransport};
use crate::SetupError;

pub const NAME: &str = "slack";
pub const DEFAULT_PORT: u16 = 3102;
pub const API_URL: &str = "https://slack.com/api";

/// Slack's own limit on message text.
const MAX_TEXT: usize = 40_000;
const CHANNEL_TYPES: &[&str] = &["public_channel", "private_channel", "mpim", "im"];
const NEEDS_USER_TOKEN: &str = "search requires user_token in the slack config";

const AUTH: &str = "Authentication failed. Check bot_token in the slack config.";
const RULES: &[Rule] = &[
    Rule::code("not_in_channel", 403, "The bot is not a member of this channel. Invite it or use channels join."),
    Rule::code("channel_not_found", 404, "Channel not found or not visible to this token."),
    Rule::code("invalid_auth", 401, AUTH),
    Rule::code("not_authed", 401, AUTH),
    Rule::code("token_revoked", 401, AUTH),
    Rule::code("account_inactive", 401, AUTH),
    Rule::code("missing_scope", 403, "The Slack token is missing a required OAuth scope."),
    Rule::code("not_allowed_token_type", 403, "This Slack method does not accept this token type."),
    Rule::code("ratelimited", 429, "Slack rate limit exceeded. Try again later."),
    Rule::code("message_not_found", 404, "Message not found."),
    Rule::code("thread_not_found", 404, "Thread not found."),
    Rule::code("user_not_found", 404, "User not found."),
    Rule::code("users_not_found", 404, "User not found."),
    Rule::code("is_archived", 400, "The channel is archived."),
    Rule::code("already_reacted", 409, "That reaction is already present."),
    Rule::code("no_reaction", 404, "That reaction is not present on the message."),
    Rule::code("invalid_name", 400, "Unknown emoji name."),
    Rule::code("cant_update_message", 403, "Only messages posted by this bot can be changed."),
    Rule::code("cant_delete_message", 403, "Only messages posted by this bot can be deleted."),
    Rule::code("msg_too_long", 400, "Message text is too long."),
    Rule::code("no_text", 400, "Message text is required."),
    Rule::code("invalid_cursor", 400, "The pagination cursor is invalid or expired."),
    Rule::code("method_not_supported_for_channel_type", 400, "This action is not supported for this channel type."),
];

const REDACTIONS: &[&str] = &[r"hooks\.slack\.com/\S+", r"files\.slack\.com/\S+"];

/// Keys read from the slack config file.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    /// Enables `search messages`.
    pub user_token: Option<String>,
    pub port: Option<u16>,
}

impl SlackConfig {
    /// # Errors
    /// Returns [`ConfigError::Invalid`] listing every missing or malformed key.
    pub fn from_values(values: &KeyValues) -> Result<Self, ConfigError> {
        let mut check = values.check();
        let bot_token = check.required("bot_token", prefixed(&["xoxb-"]));
        let user_token = check.optional("user_token", prefixed(&["xoxp-"]));
        let port = check.port();
        check.finish()?;
        Ok(Self { bot_token, user_token, port })
    }
}

/// A validated Slack operation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Command {
    ListChannels {
        limit: i64,
        types: String,
        cursor: Option<String>,
    },
    ChannelInfo {
        channel: String,
    },
    History {
        channel: String,
        limit: i64,
        oldest: Option<String>,
        latest: Option<String>,
        cursor: Option<String>,
    },
    Join {
        channel: String,
    },
    Post {
        channel: String,
        text: String,
        thread_ts: Option<String>,
    },
    Update {
        channel: String,
        ts: String,
        text: String,
    },
    Delete {
        channel: String,
        ts: String,
    },
    Replies {
        channel: String,
        ts: String,
        limit: i64,
        cursor: Option<String>,
    },
    Permalink {
        channel: String,
        ts: String,
    },
    ListUsers {
        limit: i64,
        cursor: Option<String>,
    },
    UserInfo {
        user: String,
    },
    LookupUser {
        email: String,
    },
    AddReaction(Reaction),
    RemoveReaction(Reaction),
    SearchMessages {
        query: String,
        count: i64,
    },
}

/// Target of a reaction add or remove.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub channel: String,
    pub ts: String,
    pub name: String,
}

static ACTIONS: &[ActionEntry<Command>] = &[
    ActionEntry::new("channels", "list", parse_list_channels),
    ActionEntry::new("channels", "info", parse_channel_info),
    ActionEntry::new("channels", "history", parse_history),
    ActionEntry::new("channels", "join", parse_join),
    ActionEntry::new("messages", "post", parse_post),
    ActionEntry::new("messages", "update", parse_update),
    ActionEntry::new("messages", "delete", parse_delete),
    ActionEntry::new("messages", "replies", parse_replies),
    ActionEntry::new("messages", "permalink", parse_permalink),
    ActionEntry::new("users", "list", parse_list_users),
    ActionEntry::new("users", "info", parse_user_info),
    ActionEntry::new("users", "lookup", parse_lookup_user),
    ActionEntry::new("reactions", "add", parse_add_reaction),
    ActionEntry::new("reactions", "remove", parse_remove_reaction),
    ActionEntry::new("search", "messages", parse_search),
];

/// Emoji name with surrounding colons stripped, e.g. `:thumbsup:` → `thumbsup`.
fn emoji_name(raw: &str) -> Result<String, String> {
    let name = raw.trim().trim_matches(':');
    let valid = !name.is_empty()
        && name.len() <= 100
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_+-':".contains(c));
    if valid {
        Ok(name.to_owned())
    } else {
        Err("must be an emoji name like thumbsup or :thumbsup:".to_owned())
    }
}

/// Comma-separated conversation types.
fn channel_types(raw: &str) -> Result<String, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    if !parts.is_empty() && parts.iter().all(|p| CHANNEL_TYPES.contains(p)) {
        Ok(parts.join(","))
    } else {
        Err(format!("must be a comma-separated list of: {}", CHANNEL_TYPES.join(", ")))
    }
}

fn parse_list_channels(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let limit = r.int_or("limit", 1..=1000, 100);
    let types = r
        .opt_id("types", channel_types)
        .unwrap_or_else(|| "public_channel,private_channel".to_owned());
    let cursor = r.opt_string_max("cursor", 500);
    r.finish()?;
    Ok(Command::ListChannels { limit, types, cursor })
}

fn parse_channel_info(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    r.finish()?;
    Ok(Command::ChannelInfo { channel })
}

fn parse_history(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    let limit = r.int_or("limit", 1..=1000, 50);
    let oldest = r.opt_id("oldest", id::slack_ts);
    let latest = r.opt_id("latest", id::slack_ts);
    let cursor = r.opt_string_max("cursor", 500);
    r.finish()?;
    Ok(Command::History { channel, limit, oldest, latest, cursor })
}

fn parse_join(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    r.finish()?;
    Ok(Command::Join { channel })
}

fn parse_post(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    let text = r.string_max("text", MAX_TEXT);
    let thread_ts = r.opt_id("threadTs", id::slack_ts);
    r.finish()?;
    Ok(Command::Post { channel, text, thread_ts })
}

fn parse_update(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    let ts = r.id("ts", id::slack_ts);
    let text = r.string_max("text", MAX_TEXT);
    r.finish()?;
    Ok(Command::Update { channel, ts, text })
}

fn parse_delete(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    let ts = r.id("ts", id::slack_ts);
    r.finish()?;
    Ok(Command::Delete { channel, ts })
}

fn parse_replies(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    let ts = r.id("ts", id::slack_ts);
    let limit = r.int_or("limit", 1..=1000, 50);
    let cursor = r.opt_string_max("cursor", 500);
    r.finish()?;
    Ok(Command::Replies { channel, ts, limit, cursor })
}

fn parse_permalink(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    let ts = r.id("ts", id::slack_ts);
    r.finish()?;
    Ok(Command::Permalink { channel, ts })
}

fn parse_list_users(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let limit = r.int_or("limit", 1..=1000, 100);
    let cursor = r.opt_string_max("cursor", 500);
    r.finish()?;
    Ok(Command::ListUsers { limit, cursor })
}

fn parse_user_info(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let user = r.id("user", id::slack_user);
    r.finish()?;
    Ok(Command::UserInfo { user })
}

fn parse_lookup_user(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let email = r.id("email", id::email);
    r.finish()?;
    Ok(Command::LookupUser { email })
}

fn read_reaction(p: &Params) -> Result<Reaction, SkillError> {
    let mut r = ParamReader::new(p);
    let channel = r.id("channel", id::slack_channel);
    let ts = r.id("ts", id::slack_ts);
    let name = r.id("name", emoji_name);
    r.finish()?;
    Ok(Reaction { channel, ts, name })
}

fn parse_add_reaction(p: &Params) -> Result<Command, SkillError> {
    read_reaction(p).map(Command::AddReaction)
}

fn parse_remove_reaction(p: &Params) -> Result<Command, SkillError> {
    read_reaction(p).map(Command::RemoveReaction)
}

fn parse_search(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let query = r.string_max("query", 1000);
    let count = r.int_or("count", 1..=100, 20);
    r.finish()?;
    Ok(Command::SearchMessages { query, count })
}

/// `{messages, hasMore, nextCursor}` from a history or replies page.
fn message_page(body: &Value) -> Result<Value, VendorError> {
    Ok(json!({
        "messages": records(body, "/messages", records::message)?,
        "hasMore": body["has_more"].as_bool().unwrap_or(false),
        "nextCursor": records::next_cursor(body),
    }))
}

/// The Slack proxy.
pub struct SlackSkill {
    bot: Arc<dyn VendorTransport>,
    user: Option<Arc<dyn VendorTransport>>,
    sanitizer: Sanitizer,
}

impl SlackSkill {
    #[must_use]
    pub fn new(bot: Arc<dyn VendorTransport>, user: Option<Arc<dyn VendorTransport>>) -> Self {
        Self { bot, user, sanitizer: Sanitizer::new(RULES, REDACTIONS) }
    }

    /// Builds the skill with one HTTP client per configured token.
    ///
    /// # Errors
    /// Returns [`SetupError`] when a client cannot be built.
    pub fn from_config(config: &SlackConfig) -> Result<Self, SetupError> {
        let bot_auth = format!("Bearer {}", config.bot_token);
        let bot = HttpTransport::new(API_URL, &[("Authorization", bot_auth.as_str())])?;
        let user = match &config.user_token {
            Some(token) => {
                let user_auth = format!("Bearer {token}");
                let transport: Arc<dyn VendorTransport> =
                    Arc::new(HttpTransport::new(API_URL, &[("Authorization", user_auth.as_str())])?);
                Some(transport)
            }
            None => None,
        };
        Ok(Self::new(Arc::new(bot), user))
    }

    /// Sends a Web API call and unwraps Slack's `ok` flag.
    async fn call(transport: &dyn VendorTransport, request: VendorRequest) -> Result<Value, VendorError> {
        let body = transport.send(request).await?;
        if body["ok"] == Value::Bool(true) {
            return Ok(body);
        }
        let code = body["error"].as_str().unwrap_or("unknown_error").to_owned();
        Err(VendorError::code(code.clone(), code))
    }

    async fn bot(&self, request: VendorRequest) -> Result<Value, VendorError> {
        Self::call(self.bot.as_ref(), request).await
    }

    async fn react(&self, method: &str, reaction: Reaction) -> Result<Value, VendorError> {
        let body = json!({ "channel": reaction.channel, "timestamp": reaction.ts, "name": reaction.name });
        self.bot(VendorRequest::post(format!("/{method}"), body)).await?;
        Ok(json!({ "channel": reaction.channel, "ts": reaction.ts, "name": reaction.name }))
    }
}

#[async_trait]
impl Skill for SlackSkill {
    type Command = Command;

    fn name(&self) -> &'static str {
        NAME
    }

    fn table(&self) -> ActionTable<Command> {
        ActionTable::new(ACTIONS)
    }

    fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    async fn execute(&self, command: Command) -> Result<Value, SkillError> {
        let value = match command {
            Command::ListChannels { limit, types, cursor } => {
                let req = VendorRequest::get("/conversations.list")
                    .query("limit", limit.to_string())
                    .query("types", types)
                    .query("exclude_archived", "true")
                    .query_opt("cursor", cursor);
                let body = self.bot(req).await?;
                json!({
                    "channels": records(&body, "/channels", records::channel)?,
                    "nextCursor": records::next_cursor(&body),
                })
            }
            Command::ChannelInfo { channel } => {
                let body = self.bot(VendorRequest::get("/conversations.info").query("channel", channel)).await?;
                records::channel(&body["channel"])
            }
            Command::History { channel, limit, oldest, latest, cursor } => {
                let req = VendorRequest::get("/conversations.history")
                    .query("channel", channel)
                    .query("limit", limit.to_string())
                    .query_opt("oldest", oldest)
                    .query_opt("latest", latest)
                    .query_opt("cursor", cursor);
                message_page(&self.bot(req).await?)?
            }
            Command::Join { channel } => {
                let body = self.bot(VendorRequest::post("/conversations.join", json!({ "channel": channel }))).await?;
                records::channel(&body["channel"])
            }
            Command::Post { channel, text, thread_ts } => {
                let mut payload = json!({ "channel": channel, "text": text });
                if let Some(thread) = &thread_ts {
                    payload["thread_ts"] = Value::String(thread.clone());
                }
                let body = self.bot(VendorRequest::post("/chat.postMessage", payload)).await?;
                json!({ "channel": body["channel"], "ts": body["ts"], "threadTs": thread_ts })
            }
            Command::Update { channel, ts, text } => {
                let payload = json!({ "channel": channel, "ts": ts, "text": text });
                let body = self.bot(VendorRequest::post("/chat.update", payload)).await?;
                json!({ "channel": body["channel"], "ts": body["ts"] })
            }
            Command::Delete { channel, ts } => {
                let payload = json!({ "channel": channel, "ts": ts });
                self.bot(VendorRequest::post("/chat.delete", payload)).await?;
                json!({ "channel": channel, "ts": ts, "deleted": true })
            }
            Command::Replies { channel, ts, limit, cursor } => {
                let req = VendorRequest::get("/conversations.replies")
                    .query("channel", channel)
                    .query("ts", ts)
                    .query("limit", limit.to_string())
                    .query_opt("cursor", cursor);
                message_page(&self.bot(req).await?)?
            }
            Command::Permalink { channel, ts } => {
                let req = VendorRequest::get("/chat.getPermalink")
                    .query("channel", channel.clone())
                    .query("message_ts", ts.clone());
                let body = self.bot(req).await?;
                json!({ "channel": channel, "ts": ts, "permalink": body["permalink"] })
            }
            Command::ListUsers { limit, cursor } => {
                let req = VendorRequest::get("/users.list")
                    .query("limit", limit.to_string())
                    .query_opt("cursor", cursor);
                let body = self.bot(req).await?;
                json!({
                    "users": records(&body, "/members", records::user)?,
                    "nextCursor": records::next_cursor(&body),
                })
            }
            Command::UserInfo { user } => {
                let body = self.bot(VendorRequest::get("/users.info").query("user", user)).await?;
                records::user(&body["user"])
            }
            Command::LookupUser { email } => {
                let body = self.bot(VendorRequest::get("/users.lookupByEmail").query("email", email)).await?;
                records::user(&body["user"])
            }
            Command::AddReaction(reaction) => self.react("reactions.add", reaction).await?,
            Command::RemoveReaction(reaction) => self.react("reactions.remove", reaction).await?,
            Command::SearchMessages { query, count } => {
                let user = self
                    .user
                    .as_deref()
                    .ok_or_else(|| SkillError::Unavailable(NEEDS_USER_TOKEN.to_owned()))?;
                let req = VendorRequest::get("/search.messages")
                    .query("query", query)
                    .query("count", count.to_string());
                let body = Self::call(user, req).await?;
                records(&body, "/messages/matches", records::search_match)?
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use skill_core::{ActionRequest, Proxy};

    use super::*;
    use crate::transport::{Method, RecordingTransport};

    fn skill(bot: &Arc<RecordingTransport>) -> SlackSkill {
        SlackSkill::new(bot.clone(), None)
    }

    fn request(category: &str, action: &str, params: Value) -> ActionRequest {
        ActionRequest::new(category, action).with_params(params)
    }

    #[tokio::test]
    async fn channel_mention_and_bare_id_send_the_same_channel() {
        let ok = json!({"ok": true, "channel": {"id": "C0123456789", "name": "general"}});
        let bot = Arc::new(RecordingTransport::new().reply(ok.clone()).reply(ok));
        let s = skill(&bot);
        for raw in ["<#C0123456789|general>", "c0123456789"] {
            if let Err(e) = s.handle(request("channels", "info", json!({ "channel": raw }))).await {
                panic!("info failed for {raw}: {e}");
            }
            let sent = bot.last().and_then(|r| r.query_value("channel").map(str::to_owned));
            assert_eq!(sent.as_deref(), Some("C0123456789"));
        }
    }

    #[tokio::test]
    async fn history_flattens_messages() {
        let bot = Arc::new(RecordingTransport::new().reply(json!({
            "ok": true,
            "has_more": true,
            "messages": [
                {"type": "message", "ts": "1700000000.123456", "user": "U0123456789", "text": "hi",
                 "thread_ts": "1700000000.123456", "reply_count": 2, "blocks": [{"type": "rich_text"}]}
            ],
            "response_metadata": {"next_cursor": "bmV4dA=="}
        })));
        let params = json!({"channel": "C0123456789", "oldest": "p1699999999000000"});
        let value = match skill(&bot).handle(request("channels", "history", params)).await {
            Ok(v) => v,
            Err(e) => panic!("history failed: {e}"),
        };
        assert_eq!(
            value["messages"][0],
            json!({
                "ts": "1700000000.123456", "user": "U0123456789", "text": "hi",
                "threadTs": "1700000000.123456", "replyCount": 2,
                "postedAt": "2023-11-14T22:13:20.123456Z"
            })
        );
        assert_eq!(value["hasMore"], true);
        assert_eq!(value["nextCursor"], "bmV4dA==");
        let sent = bot.last().and_then(|r| r.query_value("oldest").map(str::to_owned));
        assert_eq!(sent.as_deref(), Some("1699999999.000000"));
    }

    #[tokio::test]
    async fn history_and_replies_forward_the_cursor() {
        let page = json!({"ok": true, "messages": [], "has_more": false});
        let bot = Arc::new(RecordingTransport::new().reply(page.clone()).reply(page));
        let s = skill(&bot);
        let history = json!({"channel": "C0123456789", "cursor": "dXNlcjpVMDYx"});
        let replies = json!({"channel": "C0123456789", "ts": "1700000000.123456", "cursor": "bmV4dA=="});
        for (action, params, cursor) in [("history", history, "dXNlcjpVMDYx"), ("replies", replies, "bmV4dA==")] {
            let category = if action == "history" { "channels" } else { "messages" };
            let value = match s.handle(request(category, action, params)).await {
                Ok(v) => v,
                Err(e) => panic!("{action} failed: {e}"),
            };
            assert_eq!(value["hasMore"], false);
            assert!(value["nextCursor"].is_null(), "{action}: {value}");
            let sent = bot.last().and_then(|r| r.query_value("cursor").map(str::to_owned));
            assert_eq!(sent.as_deref(), Some(cursor), "{action}");
        }
    }

    #[tokio::test]
    async fn search_without_user_token_never_calls_slack() {
        let bot = Arc::new(RecordingTransport::new());
        let s = skill(&bot);
        let err = match s.handle(request("search", "messages", json!({"query": "deploy"}))).await {
            Err(e) => e,
            Ok(v) => panic!("expected failure, got {v}"),
        };
        let sanitized = Skill::sanitizer(&s).sanitize(&err);
        assert_eq!(sanitized.status, 400);
        assert_eq!(sanitized.message, NEEDS_USER_TOKEN);
        assert_eq!(bot.calls(), 0);
    }

    #[tokio::test]
    async fn search_uses_the_user_token_transport() {
        let bot = Arc::new(RecordingTransport::new());
        let user = Arc::new(RecordingTransport::new().reply(json!({
            "ok": true,
            "messages": {"matches": [{"ts": "1700000000.000001", "text": "deploy",
                                      "channel": {"id": "C0123456789", "name": "ops"}}]}
        })));
        let s = SlackSkill::new(bot.clone(), Some(user.clone() as Arc<dyn VendorTransport>));
        let value = match s.handle(request("search", "messages", json!({"query": "deploy", "count": 5}))).await {
            Ok(v) => v,
            Err(e) => panic!("search failed: {e}"),
        };
        assert_eq!(value[0]["channelName"], "ops");
        assert_eq!(bot.calls(), 0);
        assert_eq!(user.calls(), 1);
    }

    #[tokio::test]
    async fn not_ok_reply_maps_to_vendor_code() {
        let bot = Arc::new(RecordingTransport::new().reply(json!({"ok": false, "error": "not_in_channel"})));
        let s = skill(&bot);
        let err = match s.handle(request("messages", "post", json!({"channel": "C0123456789", "text": "hi"}))).await {
            Err(e) => e,
            Ok(v) => panic!("expected failure, got {v}"),
        };
        let sanitized = Skill::sanitizer(&s).sanitize(&err);
        assert_eq!(sanitized.status, 403);
        assert!(sanitized.message.starts_with("The bot is not a member"));
    }

    #[tokio::test]
    async fn reaction_name_loses_its_colons() {
        let bot = Arc::new(RecordingTransport::new().reply(json!({"ok": true})));
        let params = json!({"channel": "C0123456789", "ts": "1700000000.000001", "name": ":thumbsup:"});
        let value = match skill(&bot).handle(request("reactions", "add", params)).await {
            Ok(v) => v,
            Err(e) => panic!("reaction failed: {e}"),
        };
        assert_eq!(value["name"], "thumbsup");
        match bot.last() {
            Some(req) => {
                assert_eq!(req.method, Method::Post);
                assert_eq!(req.path, "/reactions.add");
                assert_eq!(req.body, Some(json!({"channel": "C0123456789", "timestamp": "1700000000.000001", "name": "thumbsup"})));
            }
            None => panic!("no request sent"),
        }
    }

    #[tokio::test]
    async fn oversized_text_is_rejected_locally() {
        let bot = Arc::new(RecordingTransport::new());
        let params = json!({"channel": "C0123456789", "text": "x".repeat(MAX_TEXT + 1)});
        let result = skill(&bot).handle(request("messages", "post", params)).await;
        assert!(matches!(result, Err(SkillError::InvalidParams(_))));
        assert_eq!(bot.calls(), 0);
    }

    #[test]
    fn emoji_and_type_parsers() {
        assert_eq!(emoji_name(":+1:"), Ok("+1".to_owned()));
        assert_eq!(emoji_name("wave::skin-tone-2"), Ok("wave::skin-tone-2".to_owned()));
        assert!(emoji_name("::").is_err());
        assert!(emoji_name("Thumbs Up").is_err());
        assert_eq!(channel_types("public_channel, im"), Ok("public_channel,im".to_owned()));
        assert!(channel_types("dm").is_err());
    }

    #[test]
    fn user_token_is_optional_but_checked() {
        let kv = KeyValues::from_pairs([("bot_token", "xoxb-1"), ("user_token", "xoxb-2")]);
        assert!(SlackConfig::from_values(&kv).is_err());
        let kv = KeyValues::from_pairs([("bot_token", "xoxb-1")]);
        match SlackConfig::from_values(&kv) {
            Ok(c) => assert!(c.user_token.is_none()),
            Err(e) => panic!("config rejected: {e}"),
        }
    }
}
