//! Supabase skill: table CRUD through PostgREST, read-only SQL through the
//! Management API, RPC calls and storage listings.

mod filter;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use skill_core::config::{non_empty, prefixed};
use skill_core::id;
use skill_core::{
    check_read_only, ActionEntry, ActionTable, ConfigError, KeyValues, ParamReader, Params, Rule, Sanitizer, Skill,
    SkillError, VendorError,
};

pub use filter::Filter;

use crate::flatten::{at, records};
use crate::http::HttpTransport;
use crate::transport::{Method, VendorRequest, VendorTransport};
use crate::SetupError;

pub const NAME: &str = "supabase";
pub const DEFAULT_PORT: u16 = 3104;
pub const MANAGEMENT_URL: &str = "https://api.supabase.com";

const MAX_ROWS: usize = 500;
const NEEDS_ACCESS_TOKEN: &str = "sql requires access_token and project_ref in the supabase config";

const RULES: &[Rule] = &[
    Rule::code("42P01", 404, "Table or view not found."),
    Rule::code("PGRST205", 404, "Table or view not found."),
    Rule::code("42703", 400, "Column not found."),
    Rule::code("PGRST204", 400, "Column not found."),
    Rule::code("23505", 409, "A row with this key already exists."),
    Rule::code("23503", 409, "The row references a missing row or is still referenced."),
    Rule::code("23502", 400, "A required column is missing."),
    Rule::code("22P02", 400, "A value has the wrong type for its column."),
    Rule::code("42501", 403, "Permission denied by a database policy."),
    Rule::code("PGRST116", 404, "No rows matched."),
    Rule::code("PGRST301", 401, "Authentication failed. Check service_role_key in the supabase config."),
    Rule::code("PGRST202", 404, "Database function not found."),
    Rule::code("42883", 404, "Database function not found."),
    Rule::code("42601", 400, "SQL syntax error."),
    Rule::code("57014", 504, "The query was cancelled by a statement timeout."),
    Rule::contains("jwt expired", 401, "Authentication failed. Check service_role_key in the supabase config."),
    Rule::contains("invalid jwt", 401, "Authentication failed. Check service_role_key in the supabase config."),
    Rule::contains("bucket not found", 404, "Storage bucket not found."),
];

const REDACTIONS: &[&str] = &[
    r"[a-z0-9.-]+\.pooler\.supabase\.com",
    r"[a-z0-9-]+\.supabase\.(?:co|in)",
];

/// Keys read from the supabase config file.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcdefghijklmnopqrst.supabase.co`.
    pub url: String,
    pub service_role_key: String,
    /// Personal access token for the Management API.
    pub access_token: Option<String>,
    pub project_ref: Option<String>,
    pub port: Option<u16>,
}

impl SupabaseConfig {
    /// Reads the config. `project_ref` defaults to the first label of a
    /// `*.supabase.co` URL.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] listing every missing or malformed key.
    pub fn from_values(values: &KeyValues) -> Result<Self, ConfigError> {
        let mut check = values.check();
        let url = check.required("url", project_url);
        let service_role_key = check.required("service_role_key", non_empty);
        let access_token = check.optional("access_token", prefixed(&["sbp_"]));
        let project_ref = check.optional("project_ref", |v| {
            if v.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
                Ok(())
            } else {
                Err("must contain only lowercase letters and digits".to_owned())
            }
        });
        let port = check.port();
        check.finish()?;
        let project_ref = project_ref.or_else(|| ref_from_url(&url));
        Ok(Self { url: url.trim_end_matches('/').to_owned(), service_role_key, access_token, project_ref, port })
    }
}

/// `https://` URLs, plus plain HTTP for a local stack.
fn project_url(v: &str) -> Result<(), String> {
    let local = ["http://localhost", "http://127.0.0.1"].iter().any(|p| v.starts_with(p));
    if (v.starts_with("https://") && v.len() > "https://".len()) || local {
        Ok(())
    } else {
        Err("must be an https:// project URL (http:// is accepted for localhost)".to_owned())
    }
}

fn ref_from_url(url: &str) -> Option<String> {
    let host = url.strip_prefix("https://")?.split(['/', ':']).next()?;
    let project = host.strip_suffix(".supabase.co")?;
    (!project.is_empty() && !project.contains('.')).then(|| project.to_owned())
}

/// Storage bucket id.
fn bucket(raw: &str) -> Result<String, String> {
    let valid = !raw.is_empty()
        && raw.len() <= 100
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c));
    if valid {
        Ok(raw.to_owned())
    } else {
        Err("must be a bucket id (letters, digits, '-', '_', '.')".to_owned())
    }
}

/// Table location shared by the CRUD commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub schema: Option<String>,
    pub name: String,
}

/// A validated Supabase operation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Command {
    Select {
        table: Table,
        columns: Option<Vec<String>>,
        filters: Vec<Filter>,
        order: Option<String>,
        ascending: bool,
        limit: i64,
    },
    Insert {
        table: Table,
        rows: Vec<Value>,
    },
    Update {
        table: Table,
        values: Map<String, Value>,
        filters: Vec<Filter>,
    },
    Delete {
        table: Table,
        filters: Vec<Filter>,
    },
    Sql {
        query: String,
    },
    Rpc {
        schema: Option<String>,
        function: String,
        args: Map<String, Value>,
    },
    Buckets,
    ListObjects {
        bucket: String,
        prefix: Option<String>,
        limit: i64,
    },
}

static ACTIONS: &[ActionEntry<Command>] = &[
    ActionEntry::new("tables", "select", parse_select),
    ActionEntry::new("tables", "insert", parse_insert),
    ActionEntry::new("tables", "update", parse_update),
    ActionEntry::new("tables", "delete", parse_delete),
    ActionEntry::new("sql", "query", parse_sql),
    ActionEntry::new("rpc", "call", parse_rpc),
    ActionEntry::new("storage", "buckets", parse_buckets),
    ActionEntry::new("storage", "list", parse_list_objects),
];

fn read_table(r: &mut ParamReader<'_>) -> Table {
    Table { schema: r.opt_id("schema", id::sql_ident), name: r.id("table", id::sql_ident) }
}

fn parse_select(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let table = read_table(&mut r);
    let columns = r.opt_id_list("columns", id::sql_ident);
    let filters = filter::read(&mut r, false);
    let order = r.opt_id("order", id::sql_ident);
    let ascending = r.opt_bool("ascending").unwrap_or(true);
    let limit = r.int_or("limit", 1..=1000, 100);
    r.finish()?;
    Ok(Command::Select { table, columns, filters, order, ascending, limit })
}

fn parse_insert(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let table = read_table(&mut r);
    let rows = match r.opt_value("rows") {
        Some(Value::Object(row)) => vec![Value::Object(row)],
        Some(Value::Array(rows)) if (1..=MAX_ROWS).contains(&rows.len()) && rows.iter().all(Value::is_object) => rows,
        Some(_) => {
            r.reject("rows", format!("must be an object or an array of 1 to {MAX_ROWS} objects"));
            Vec::new()
        }
        None => {
            r.reject("rows", "is required");
            Vec::new()
        }
    };
    r.finish()?;
    Ok(Command::Insert { table, rows })
}

fn parse_update(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let table = read_table(&mut r);
    let values = r.object("values");
    if r.has("values") && values.is_empty() {
        r.reject("values", "must set at least one column");
    }
    let filters = filter::read(&mut r, true);
    r.finish()?;
    Ok(Command::Update { table, values, filters })
}

fn parse_delete(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let table = read_table(&mut r);
    let filters = filter::read(&mut r, true);
    r.finish()?;
    Ok(Command::Delete { table, filters })
}

fn parse_sql(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let query = r.string("query");
    r.finish()?;
    check_read_only(&query).map_err(SkillError::UnsafeQuery)?;
    Ok(Command::Sql { query })
}

fn parse_rpc(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let schema = r.opt_id("schema", id::sql_ident);
    let function = r.id("function", id::sql_ident);
    let args = r.opt_object("args").unwrap_or_default();
    r.finish()?;
    Ok(Command::Rpc { schema, function, args })
}

fn parse_buckets(_: &Params) -> Result<Command, SkillError> {
    Ok(Command::Buckets)
}

fn parse_list_objects(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let bucket = r.id("bucket", bucket);
    let prefix = r.opt_string_max("prefix", 1024);
    let limit = r.int_or("limit", 1..=1000, 100);
    r.finish()?;
    Ok(Command::ListObjects { bucket, prefix, limit })
}

/// `{count, ids}` for rows returned by a write.
fn write_summary(rows: &Value) -> Value {
    let rows = rows.as_array().map(Vec::as_slice).unwrap_or_default();
    let ids: Vec<Value> = rows.iter().map(|row| row["id"].clone()).filter(|id| !id.is_null()).collect();
    json!({ "count": rows.len(), "ids": ids })
}

fn bucket_record(b: &Value) -> Value {
    json!({
        "id": b["id"],
        "name": b["name"],
        "public": b["public"],
        "createdAt": b["created_at"],
        "updatedAt": b["updated_at"],
    })
}

fn object_record(o: &Value) -> Value {
    json!({
        "name": o["name"],
        "id": o["id"],
        "size": at(o, "/metadata/size"),
        "mimetype": at(o, "/metadata/mimetype"),
        "updatedAt": o["updated_at"],
    })
}

/// Management API handle for SQL.
struct Management {
    transport: Arc<dyn VendorTransport>,
    project_ref: String,
}

/// The Supabase proxy.
pub struct SupabaseSkill {
    project: Arc<dyn VendorTransport>,
    management: Option<Management>,
    sanitizer: Sanitizer,
}

impl SupabaseSkill {
    /// `management` pairs a Management API transport with the project ref;
    /// without it the `sql` category answers with a configuration hint.
    #[must_use]
    pub fn new(project: Arc<dyn VendorTransport>, management: Option<(Arc<dyn VendorTransport>, String)>) -> Self {
        Self {
            project,
            management: management.map(|(transport, project_ref)| Management { transport, project_ref }),
            sanitizer: Sanitizer::new(RULES, REDACTIONS),
        }
    }

    /// Builds the project client and, when configured, the Management API
    /// client.
    ///
    /// # Errors
    /// Returns [`SetupError`] when a client cannot be built.
    pub fn from_config(config: &SupabaseConfig) -> Result<Self, SetupError> {
        let auth = format!("Bearer {}", config.service_role_key);
        let project = HttpTransport::new(
            &config.url,
            &[("apikey", config.service_role_key.as_str()), ("Authorization", auth.as_str())],
        )?;
        let management = match (&config.access_token, &config.project_ref) {
            (Some(token), Some(project_ref)) => {
                let auth = format!("Bearer {token}");
                let transport: Arc<dyn VendorTransport> =
                    Arc::new(HttpTransport::new(MANAGEMENT_URL, &[("Authorization", auth.as_str())])?);
                Some((transport, project_ref.clone()))
            }
            _ => None,
        };
        Ok(Self::new(Arc::new(project), management))
    }

    async fn rest(&self, request: VendorRequest) -> Result<Value, VendorError> {
        self.project.send(request).await
    }
}

/// Adds the schema profile header PostgREST uses to pick a non-default schema.
fn profiled(request: VendorRequest, header: &'static str, schema: Option<String>) -> VendorRequest {
    match schema {
        Some(schema) => request.header(header, schema),
        None => request,
    }
}

fn with_filters(mut request: VendorRequest, filters: &[Filter]) -> VendorRequest {
    request.query.extend(filters.iter().map(Filter::pair));
    request
}

#[async_trait]
impl Skill for SupabaseSkill {
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
            Command::Select { table, columns, filters, order, ascending, limit } => {
                let select = columns.map_or_else(|| "*".to_owned(), |c| c.join(","));
                let req = VendorRequest::get(format!("/rest/v1/{}", table.name)).query("select", select);
                let req = with_filters(req, &filters)
                    .query_opt("order", order.map(|col| format!("{col}.{}", if ascending { "asc" } else { "desc" })))
                    .query("limit", limit.to_string());
                self.rest(profiled(req, "Accept-Profile", table.schema)).await?
            }
            Command::Insert { table, rows } => {
                let req = VendorRequest::post(format!("/rest/v1/{}", table.name), Value::Array(rows))
                    .header("Prefer", "return=representation");
                write_summary(&self.rest(profiled(req, "Content-Profile", table.schema)).await?)
            }
            Command::Update { table, values, filters } => {
                let req = VendorRequest::new(Method::Patch, format!("/rest/v1/{}", table.name))
                    .json(Value::Object(values))
                    .header("Prefer", "return=representation");
                let req = with_filters(req, &filters);
                write_summary(&self.rest(profiled(req, "Content-Profile", table.schema)).await?)
            }
            Command::Delete { table, filters } => {
                let req = VendorRequest::new(Method::Delete, format!("/rest/v1/{}", table.name))
                    .header("Prefer", "return=representation");
                let req = with_filters(req, &filters);
                write_summary(&self.rest(profiled(req, "Content-Profile", table.schema)).await?)
            }
            Command::Sql { query } => {
                // Checked again here so no code path can skip the classifier.
                check_read_only(&query).map_err(SkillError::UnsafeQuery)?;
                let management = self
                    .management
                    .as_ref()
                    .ok_or_else(|| SkillError::Unavailable(NEEDS_ACCESS_TOKEN.to_owned()))?;
                let path = format!("/v1/projects/{}/database/query", management.project_ref);
                management.transport.send(VendorRequest::post(path, json!({ "query": query }))).await?
            }
            Command::Rpc { schema, function, args } => {
                let req = VendorRequest::post(format!("/rest/v1/rpc/{function}"), Value::Object(args));
                self.rest(profiled(req, "Content-Profile", schema)).await?
            }
            Command::Buckets => {
                let result = self.rest(VendorRequest::get("/storage/v1/bucket")).await?;
                records(&result, "", bucket_record)?
            }
            Command::ListObjects { bucket, prefix, limit } => {
                let body = json!({
                    "prefix": prefix.unwrap_or_default(),
                    "limit": limit,
                    "offset": 0,
                    "sortBy": { "column": "name", "order": "asc" },
                });
                let result = self.rest(VendorRequest::post(format!("/storage/v1/object/list/{bucket}"), body)).await?;
                records(&result, "", object_record)?
            }
        };
        Ok(value)
    }
}
