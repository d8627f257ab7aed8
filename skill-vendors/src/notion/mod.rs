//! Notion skill: pages, databases, blocks, search, users and comments over
//! the Notion REST API.

mod records;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use skill_core::config::prefixed;
use skill_core::id;
use skill_core::{
    ActionEntry, ActionTable, ConfigError, KeyValues, ParamReader, Params, Rule, Sanitizer, Skill, SkillError,
    VendorError,
};

use crate::flatten::records;
use crate::http::HttpTransport;
use crate::transport::{Method, VendorRequest, VendorTransport};
use crate::SetupError;

pub const NAME: &str = "notion";
pub const DEFAULT_PORT: u16 = 3103;
pub const API_URL: &str = "https://api.notion.com/v1";
pub const API_VERSION: &str = "2022-06-28";

/// Notion's limit on a single rich-text run.
const MAX_TEXT: usize = 2000;

const RULES: &[Rule] = &[
    Rule::code(
        "object_not_found",
        404,
        "Notion object not found, or not shared with the integration.",
    ),
    Rule::code("restricted_resource", 403, "The integration lacks access to this Notion resource."),
    Rule::code("unauthorized", 401, "Authentication failed. Check api_key in the notion config."),
    Rule::code("validation_error", 400, "Notion rejected the request. Check property names and values."),
    Rule::code("invalid_json", 400, "Notion rejected the request body."),
    Rule::code("invalid_request", 400, "Notion does not support this request."),
    Rule::code("conflict_error", 409, "The Notion object was modified concurrently. Try again."),
    Rule::code("rate_limited", 429, "Notion rate limit exceeded. Try again later."),
    Rule::code("internal_server_error", 502, "Notion failed to process the request. Try again later."),
    Rule::code("service_unavailable", 503, "Notion is unavailable. Try again later."),
];

const REDACTIONS: &[&str] = &[
    r"prod-files-secure\.s3\.[a-z0-9-]+\.amazonaws\.com/\S+",
    r"file\.notion\.so/\S+",
];

/// Keys read from the notion config file.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub api_key: String,
    pub port: Option<u16>,
}

impl NotionConfig {
    /// # Errors
    /// Returns [`ConfigError::Invalid`] listing every missing or malformed key.
    pub fn from_values(values: &KeyValues) -> Result<Self, ConfigError> {
        let mut check = values.check();
        let api_key = check.required("api_key", prefixed(&["secret_", "ntn_"]));
        let port = check.port();
        check.finish()?;
        Ok(Self { api_key, port })
    }
}

/// Where a new page is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentType {
    Page,
    Database,
}

impl ParentType {
    fn key(self) -> &'static str {
        match self {
            Self::Page => "page_id",
            Self::Database => "database_id",
        }
    }
}

/// A validated Notion operation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Command {
    GetPage {
        page_id: String,
    },
    CreatePage {
        parent_id: String,
        parent_type: ParentType,
        title: String,
        content: Vec<String>,
    },
    UpdatePage {
        page_id: String,
        title: Option<String>,
        archived: Option<bool>,
    },
    ArchivePage {
        page_id: String,
    },
    GetDatabase {
        database_id: String,
    },
    QueryDatabase {
        database_id: String,
        filter: Option<Map<String, Value>>,
        sorts: Option<Vec<Value>>,
        page_size: i64,
        start_cursor: Option<String>,
    },
    BlockChildren {
        block_id: String,
        page_size: i64,
        start_cursor: Option<String>,
    },
    AppendBlocks {
        block_id: String,
        paragraphs: Vec<String>,
    },
    Search {
        query: Option<String>,
        filter: Option<&'static str>,
        page_size: i64,
    },
    ListUsers,
    Me,
    ListComments {
        block_id: String,
    },
    CreateComment {
        page_id: String,
        text: String,
    },
}

static ACTIONS: &[ActionEntry<Command>] = &[
    ActionEntry::new("pages", "get", parse_get_page),
    ActionEntry::new("pages", "create", parse_create_page),
    ActionEntry::new("pages", "update", parse_update_page),
    ActionEntry::new("pages", "archive", parse_archive_page),
    ActionEntry::new("databases", "get", parse_get_database),
    ActionEntry::new("databases", "query", parse_query_database),
    ActionEntry::new("blocks", "children", parse_block_children),
    ActionEntry::new("blocks", "append", parse_append_blocks),
    ActionEntry::new("search", "query", parse_search),
    ActionEntry::new("users", "list", parse_list_users),
    ActionEntry::new("users", "me", parse_me),
    ActionEntry::new("comments", "list", parse_list_comments),
    ActionEntry::new("comments", "create", parse_create_comment),
];

/// Rejects list elements longer than one rich-text run.
fn check_runs(r: &mut ParamReader<'_>, field: &str, items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        if item.chars().count() > MAX_TEXT {
            r.reject(&format!("{field}[{i}]"), format!("must be at most {MAX_TEXT} characters"));
        }
    }
}

fn parse_get_page(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let page_id = r.id("pageId", id::uuid);
    r.finish()?;
    Ok(Command::GetPage { page_id })
}

fn parse_create_page(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let parent_id = r.id("parentId", id::uuid);
    let parent_type = match r.opt_one_of("parentType", &["page", "database"]) {
        Some("database") => ParentType::Database,
        _ => ParentType::Page,
    };
    let title = r.string_max("title", MAX_TEXT);
    let content = if r.has("content") { r.string_list("content", 0..=100) } else { Vec::new() };
    check_runs(&mut r, "content", &content);
    r.finish()?;
    Ok(Command::CreatePage { parent_id, parent_type, title, content })
}

fn parse_update_page(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let page_id = r.id("pageId", id::uuid);
    let title = r.opt_string_max("title", MAX_TEXT);
    let archived = r.opt_bool("archived");
    if !r.has("title") && !r.has("archived") {
        r.reject("params", "at least one of title, archived is required");
    }
    r.finish()?;
    Ok(Command::UpdatePage { page_id, title, archived })
}

fn parse_archive_page(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let page_id = r.id("pageId", id::uuid);
    r.finish()?;
    Ok(Command::ArchivePage { page_id })
}

fn parse_get_database(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let database_id = r.id("databaseId", id::uuid);
    r.finish()?;
    Ok(Command::GetDatabase { database_id })
}

fn parse_query_database(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let database_id = r.id("databaseId", id::uuid);
    let filter = r.opt_object("filter");
    let sorts = r.opt_array("sorts");
    let page_size = r.int_or("pageSize", 1..=100, 50);
    let start_cursor = r.opt_string_max("startCursor", 200);
    r.finish()?;
    Ok(Command::QueryDatabase { database_id, filter, sorts, page_size, start_cursor })
}

fn parse_block_children(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let block_id = r.id("blockId", id::uuid);
    let page_size = r.int_or("pageSize", 1..=100, 100);
    let start_cursor = r.opt_string_max("startCursor", 200);
    r.finish()?;
    Ok(Command::BlockChildren { block_id, page_size, start_cursor })
}

fn parse_append_blocks(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let block_id = r.id("blockId", id::uuid);
    let paragraphs = r.string_list("paragraphs", 1..=100);
    check_runs(&mut r, "paragraphs", &paragraphs);
    r.finish()?;
    Ok(Command::AppendBlocks { block_id, paragraphs })
}

fn parse_search(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let query = r.opt_string_max("query", 500);
    let filter = r.opt_one_of("filter", &["page", "database"]);
    let page_size = r.int_or("pageSize", 1..=100, 25);
    r.finish()?;
    Ok(Command::Search { query, filter, page_size })
}

fn parse_list_users(_: &Params) -> Result<Command, SkillError> {
    Ok(Command::ListUsers)
}

fn parse_me(_: &Params) -> Result<Command, SkillError> {
    Ok(Command::Me)
}

fn parse_list_comments(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let block_id = r.id("blockId", id::uuid);
    r.finish()?;
    Ok(Command::ListComments { block_id })
}

fn parse_create_comment(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let page_id = r.id("pageId", id::uuid);
    let text = r.string_max("text", MAX_TEXT);
    r.finish()?;
    Ok(Command::CreateComment { page_id, text })
}

/// `{results, nextCursor, hasMore}` for a paginated Notion list.
fn page_of(body: &Value, key: &str, record: fn(&Value) -> Value) -> Result<Value, VendorError> {
    Ok(json!({
        key: records(body, "/results", record)?,
        "nextCursor": body["next_cursor"],
        "hasMore": body["has_more"].as_bool().unwrap_or(false),
    }))
}

/// The Notion proxy.
pub struct NotionSkill {
    transport: Arc<dyn VendorTransport>,
    sanitizer: Sanitizer,
}

impl NotionSkill {
    #[must_use]
    pub fn new(transport: Arc<dyn VendorTransport>) -> Self {
        Self { transport, sanitizer: Sanitizer::new(RULES, REDACTIONS) }
    }

    /// Builds the skill with an HTTP client pinned to [`API_VERSION`].
    ///
    /// # Errors
    /// Returns [`SetupError`] when the client cannot be built.
    pub fn from_config(config: &NotionConfig) -> Result<Self, SetupError> {
        let auth = format!("Bearer {}", config.api_key);
        let transport = HttpTransport::new(
            API_URL,
            &[("Authorization", auth.as_str()), ("Notion-Version", API_VERSION)],
        )?;
        Ok(Self::new(Arc::new(transport)))
    }

    async fn send(&self, request: VendorRequest) -> Result<Value, VendorError> {
        self.transport.send(request).await
    }

    /// Name of the title column of `database_id`.
    async fn database_title_property(&self, database_id: &str) -> Result<String, VendorError> {
        let db = self.send(VendorRequest::get(format!("/databases/{database_id}"))).await?;
        records::title_property(&db["properties"])
            .ok_or_else(|| VendorError::Decode("database has no title property".to_owned()))
    }

    /// Name of the title property of an existing page.
    async fn page_title_property(&self, page_id: &str) -> Result<String, VendorError> {
        let page = self.send(VendorRequest::get(format!("/pages/{page_id}"))).await?;
        records::title_property(&page["properties"])
            .ok_or_else(|| VendorError::Decode("page has no title property".to_owned()))
    }
}

#[async_trait]
impl Skill for NotionSkill {
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
            Command::GetPage { page_id } => {
                let page = self.send(VendorRequest::get(format!("/pages/{page_id}"))).await?;
                records::page(&page)
            }
            Command::CreatePage { parent_id, parent_type, title, content } => {
                let title_key = match parent_type {
                    ParentType::Page => "title".to_owned(),
                    ParentType::Database => self.database_title_property(&parent_id).await?,
                };
                let mut body = json!({
                    "parent": { parent_type.key(): parent_id },
                    "properties": { title_key: { "title": records::rich_text(&title) } },
                });
                if !content.is_empty() {
                    body["children"] = content.iter().map(|c| records::paragraph(c)).collect();
                }
                let page = self.send(VendorRequest::post("/pages", body)).await?;
                records::page_ref(&page)
            }
            Command::UpdatePage { page_id, title, archived } => {
                let mut body = json!({});
                if let Some(title) = title {
                    let title_key = self.page_title_property(&page_id).await?;
                    body["properties"] = json!({ title_key: { "title": records::rich_text(&title) } });
                }
                if let Some(archived) = archived {
                    body["archived"] = Value::Bool(archived);
                }
                let req = VendorRequest::new(Method::Patch, format!("/pages/{page_id}")).json(body);
                records::page_ref(&self.send(req).await?)
            }
            Command::ArchivePage { page_id } => {
                let req = VendorRequest::new(Method::Patch, format!("/pages/{page_id}")).json(json!({ "archived": true }));
                let page = self.send(req).await?;
                json!({ "id": page["id"], "archived": page["archived"] })
            }
            Command::GetDatabase { database_id } => {
                let db = self.send(VendorRequest::get(format!("/databases/{database_id}"))).await?;
                records::database(&db)
            }
            Command::QueryDatabase { database_id, filter, sorts, page_size, start_cursor } => {
                let mut body = json!({ "page_size": page_size });
                if let Some(filter) = filter {
                    body["filter"] = Value::Object(filter);
                }
                if let Some(sorts) = sorts {
                    body["sorts"] = Value::Array(sorts);
                }
                if let Some(cursor) = start_cursor {
                    body["start_cursor"] = Value::String(cursor);
                }
                let result = self.send(VendorRequest::post(format!("/databases/{database_id}/query"), body)).await?;
                page_of(&result, "rows", records::row)?
            }
            Command::BlockChildren { block_id, page_size, start_cursor } => {
                let req = VendorRequest::get(format!("/blocks/{block_id}/children"))
                    .query("page_size", page_size.to_string())
                    .query_opt("start_cursor", start_cursor);
                page_of(&self.send(req).await?, "blocks", records::block)?
            }
            Command::AppendBlocks { block_id, paragraphs } => {
                let children: Vec<Value> = paragraphs.iter().map(|p| records::paragraph(p)).collect();
                let req = VendorRequest::new(Method::Patch, format!("/blocks/{block_id}/children"))
                    .json(json!({ "children": children }));
                let result = self.send(req).await?;
                json!({ "blockId": block_id, "blocks": records(&result, "/results", records::block)? })
            }
            Command::Search { query, filter, page_size } => {
                let mut body = json!({ "page_size": page_size });
                if let Some(query) = query {
                    body["query"] = Value::String(query);
                }
                if let Some(kind) = filter {
                    body["filter"] = json!({ "property": "object", "value": kind });
                }
                let result = self.send(VendorRequest::post("/search", body)).await?;
                page_of(&result, "results", records::search_result)?
            }
            Command::ListUsers => {
                let result = self.send(VendorRequest::get("/users")).await?;
                records(&result, "/results", records::user)?
            }
            Command::Me => records::user(&self.send(VendorRequest::get("/users/me")).await?),
            Command::ListComments { block_id } => {
                let result = self.send(VendorRequest::get("/comments").query("block_id", block_id)).await?;
                records(&result, "/results", records::comment)?
            }
            Command::CreateComment { page_id, text } => {
                let body = json!({ "parent": { "page_id": page_id }, "rich_text": records::rich_text(&text) });
                let comment = self.send(VendorRequest::post("/comments", body)).await?;
                records::comment(&comment)
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use skill_core::{ActionRequest, Proxy};

    use super::*;
    use crate::transport::RecordingTransport;

    const PAGE: &str = "0b2c6f1e-8d4a-4c3b-9f7e-1a2b3c4d5e6f";

    fn skill(stub: &Arc<RecordingTransport>) -> NotionSkill {
        NotionSkill::new(stub.clone())
    }

    fn request(category: &str, action: &str, params: Value) -> ActionRequest {
        ActionRequest::new(category, action).with_params(params)
    }

    #[tokio::test]
    async fn url_and_bare_ids_hit_the_same_page() {
        let page = json!({"object": "page", "id": PAGE, "properties": {}});
        let stub = Arc::new(RecordingTransport::new().reply(page.clone()).reply(page.clone()).reply(page));
        let s = skill(&stub);
        let compact = PAGE.replace('-', "");
        let url = format!("https://www.notion.so/acme/Roadmap-{compact}?v=1234567890abcdef1234567890abcdef");
        for raw in [PAGE.to_owned(), compact, url] {
            if let Err(e) = s.handle(request("pages", "get", json!({ "pageId": raw }))).await {
                panic!("get failed for {raw}: {e}");
            }
            assert_eq!(stub.last().map(|r| r.path), Some(format!("/pages/{PAGE}")));
        }
    }

    #[tokio::test]
    async fn database_parent_uses_the_database_title_column() {
        let stub = Arc::new(
            RecordingTransport::new()
                .reply(json!({"object": "database", "properties": {
                    "Task": {"type": "title", "title": {}},
                    "Due": {"type": "date", "date": {}}
                }}))
                .reply(json!({"object": "page", "id": "new", "url": "https://www.notion.so/new"})),
        );
        let params = json!({"parentId": PAGE, "parentType": "database", "title": "Write docs", "content": ["first"]});
        let value = match skill(&stub).handle(request("pages", "create", params)).await {
            Ok(v) => v,
            Err(e) => panic!("create failed: {e}"),
        };
        assert_eq!(value, json!({"id": "new", "url": "https://www.notion.so/new", "archived": null}));
        let sent = stub.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].path, format!("/databases/{PAGE}"));
        let body = sent[1].body.clone().unwrap_or_default();
        assert_eq!(body["parent"], json!({ "database_id": PAGE }));
        assert_eq!(body["properties"]["Task"]["title"][0]["text"]["content"], "Write docs");
        assert_eq!(body["children"][0]["paragraph"]["rich_text"][0]["text"]["content"], "first");
    }

    #[tokio::test]
    async fn query_flattens_rows_and_passes_filter_through() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({
            "object": "list",
            "results": [{"object": "page", "id": "r1", "properties": {
                "Name": {"type": "title", "title": [{"plain_text": "Row one"}]},
                "Status": {"type": "select", "select": {"name": "Open"}}
            }}],
            "next_cursor": "abc",
            "has_more": true
        })));
        let filter = json!({"property": "Status", "select": {"equals": "Open"}});
        let params = json!({"databaseId": PAGE, "filter": filter, "pageSize": 10});
        let value = match skill(&stub).handle(request("databases", "query", params)).await {
            Ok(v) => v,
            Err(e) => panic!("query failed: {e}"),
        };
        assert_eq!(value["rows"][0]["title"], "Row one");
        assert_eq!(value["rows"][0]["properties"], json!({"Name": "Row one", "Status": "Open"}));
        assert_eq!(value["nextCursor"], "abc");
        assert_eq!(value["hasMore"], true);
        let body = stub.last().and_then(|r| r.body).unwrap_or_default();
        assert_eq!(body["filter"], filter);
        assert_eq!(body["page_size"], 10);
    }

    #[tokio::test]
    async fn update_returns_only_the_identifying_fields() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({
            "object": "page", "id": PAGE, "url": "https://www.notion.so/p", "archived": true,
            "created_time": "2024-01-01T00:00:00.000Z",
            "properties": {"Name": {"type": "title", "title": [{"plain_text": "Old"}]}}
        })));
        let params = json!({"pageId": PAGE, "archived": true});
        let value = match skill(&stub).handle(request("pages", "update", params)).await {
            Ok(v) => v,
            Err(e) => panic!("update failed: {e}"),
        };
        assert_eq!(value, json!({"id": PAGE, "url": "https://www.notion.so/p", "archived": true}));
        assert_eq!(stub.last().and_then(|r| r.body), Some(json!({"archived": true})));
    }

    #[tokio::test]
    async fn update_needs_at_least_one_change() {
        let stub = Arc::new(RecordingTransport::new());
        let result = skill(&stub).handle(request("pages", "update", json!({"pageId": PAGE}))).await;
        assert!(matches!(result, Err(SkillError::InvalidParams(_))));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_paragraph_is_rejected() {
        let stub = Arc::new(RecordingTransport::new());
        let params = json!({"blockId": PAGE, "paragraphs": ["ok", "x".repeat(MAX_TEXT + 1)]});
        match skill(&stub).handle(request("blocks", "append", params)).await {
            Err(SkillError::InvalidParams(fields)) => assert_eq!(fields[0].field, "paragraphs[1]"),
            other => panic!("expected InvalidParams, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unshared_page_is_reported_as_not_found() {
        let stub = Arc::new(RecordingTransport::new().fail(VendorError::Api {
            status: Some(404),
            code: Some("object_not_found".to_owned()),
            message: format!("Could not find page with ID: {PAGE}. Make sure the relevant pages are shared."),
        }));
        let s = skill(&stub);
        let err = match s.handle(request("pages", "get", json!({"pageId": PAGE}))).await {
            Err(e) => e,
            Ok(v) => panic!("expected failure, got {v}"),
        };
        let sanitized = Skill::sanitizer(&s).sanitize(&err);
        assert_eq!(sanitized.status, 404);
        assert!(!sanitized.message.contains(PAGE));
    }

    #[tokio::test]
    async fn search_filter_targets_object_kind() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({
            "results": [{"object": "database", "id": "d1", "title": [{"plain_text": "Tasks"}], "properties": {}}],
            "next_cursor": null, "has_more": false
        })));
        let value = match skill(&stub).handle(request("search", "query", json!({"filter": "database"}))).await {
            Ok(v) => v,
            Err(e) => panic!("search failed: {e}"),
        };
        assert_eq!(value["results"][0]["object"], "database");
        assert_eq!(value["results"][0]["title"], "Tasks");
        let body = stub.last().and_then(|r| r.body).unwrap_or_default();
        assert_eq!(body["filter"], json!({"property": "object", "value": "database"}));
    }
}
