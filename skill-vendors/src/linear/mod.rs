//! Linear skill: issues, projects, teams, comments, users, cycles and labels
//! over Linear's GraphQL API.

mod queries;
mod records;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use skill_core::config::prefixed;
use skill_core::id::{self, IssueRef};
use skill_core::{
    ActionEntry, ActionTable, ConfigError, KeyValues, ParamReader, Params, Rule, Sanitizer, Skill, SkillError,
    VendorError,
};

use crate::flatten::{found, records};
use crate::http::{graphql_code, HttpTransport};
use crate::transport::{VendorRequest, VendorTransport};
use crate::SetupError;

pub const NAME: &str = "linear";
pub const DEFAULT_PORT: u16 = 3101;
pub const API_URL: &str = "https://api.linear.app";

const RULES: &[Rule] = &[
    Rule::code("AUTHENTICATION_ERROR", 401, "Authentication failed. Check api_key in the linear config."),
    Rule::code("FORBIDDEN", 403, "The Linear API key lacks permission for this operation."),
    Rule::code("RATELIMITED", 429, "Linear rate limit exceeded. Try again later."),
    Rule::code("INVALID_INPUT", 400, "Linear rejected the input. Check the field values."),
    Rule::code("ENTITY_NOT_FOUND", 404, "Linear entity not found."),
    Rule::code("MUTATION_FAILED", 400, "Linear did not apply the change."),
    Rule::contains("entity not found", 404, "Linear entity not found."),
    Rule::contains("argument validation error", 400, "Linear rejected the input. Check the field values."),
];

const REDACTIONS: &[&str] = &[r"https://uploads\.linear\.app/\S+", r"lin_wh_[A-Za-z0-9]+"];

/// Keys read from the linear config file.
#[derive(Debug, Clone)]
pub struct LinearConfig {
    pub api_key: String,
    pub port: Option<u16>,
}

impl LinearConfig {
    /// # Errors
    /// Returns [`ConfigError::Invalid`] listing every missing or malformed key.
    pub fn from_values(values: &KeyValues) -> Result<Self, ConfigError> {
        let mut check = values.check();
        let api_key = check.required("api_key", prefixed(&["lin_api_"]));
        let port = check.port();
        check.finish()?;
        Ok(Self { api_key, port })
    }
}

/// Fields of an issue create or update, serialized as Linear's input object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
}

/// A validated Linear operation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Command {
    ListIssues {
        team_id: Option<String>,
        assignee_id: Option<String>,
        state: Option<String>,
        first: i64,
    },
    GetIssue {
        id: IssueRef,
    },
    CreateIssue(IssueInput),
    UpdateIssue {
        id: IssueRef,
        input: IssueInput,
    },
    SearchIssues {
        query: String,
        first: i64,
    },
    ListProjects {
        first: i64,
    },
    GetProject {
        id: String,
    },
    CreateProject {
        name: String,
        team_ids: Vec<String>,
        description: Option<String>,
    },
    ListTeams,
    GetTeam {
        team: String,
    },
    ListComments {
        issue: IssueRef,
    },
    CreateComment {
        issue: IssueRef,
        body: String,
    },
    ListUsers {
        first: i64,
    },
    Me,
    ListCycles {
        team_id: String,
    },
    ActiveCycle {
        team_id: String,
    },
    ListLabels {
        team_id: Option<String>,
    },
    CreateLabel {
        name: String,
        team_id: String,
        color: Option<String>,
    },
}

static ACTIONS: &[ActionEntry<Command>] = &[
    ActionEntry::new("issues", "list", parse_list_issues),
    ActionEntry::new("issues", "get", parse_get_issue),
    ActionEntry::new("issues", "create", parse_create_issue),
    ActionEntry::new("issues", "update", parse_update_issue),
    ActionEntry::new("issues", "search", parse_search_issues),
    ActionEntry::new("projects", "list", parse_list_projects),
    ActionEntry::new("projects", "get", parse_get_project),
    ActionEntry::new("projects", "create", parse_create_project),
    ActionEntry::new("teams", "list", parse_list_teams),
    ActionEntry::new("teams", "get", parse_get_team),
    ActionEntry::new("comments", "list", parse_list_comments),
    ActionEntry::new("comments", "create", parse_create_comment),
    ActionEntry::new("users", "list", parse_list_users),
    ActionEntry::new("users", "me", parse_me),
    ActionEntry::new("cycles", "list", parse_list_cycles),
    ActionEntry::new("cycles", "active", parse_active_cycle),
    ActionEntry::new("labels", "list", parse_list_labels),
    ActionEntry::new("labels", "create", parse_create_label),
];

fn parse_list_issues(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let team_id = r.opt_id("teamId", id::uuid);
    let assignee_id = r.opt_id("assigneeId", id::uuid);
    let state = r.opt_string_max("state", 100);
    let first = r.int_or("first", 1..=250, 50);
    r.finish()?;
    Ok(Command::ListIssues { team_id, assignee_id, state, first })
}

fn parse_get_issue(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let id = r.id("id", IssueRef::parse);
    r.finish()?;
    Ok(Command::GetIssue { id })
}

/// Optional fields shared by create and update.
fn read_issue_fields(r: &mut ParamReader<'_>) -> IssueInput {
    IssueInput {
        description: r.opt_string("description"),
        priority: r.opt_int("priority", 0..=4),
        assignee_id: r.opt_id("assigneeId", id::uuid),
        state_id: r.opt_id("stateId", id::uuid),
        project_id: r.opt_id("projectId", id::uuid),
        ..IssueInput::default()
    }
}

fn parse_create_issue(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let team_id = r.id("teamId", id::uuid);
    let title = r.string_max("title", 500);
    let mut input = read_issue_fields(&mut r);
    input.label_ids = r.opt_id_list("labelIds", id::uuid);
    r.finish()?;
    input.team_id = Some(team_id);
    input.title = Some(title);
    Ok(Command::CreateIssue(input))
}

fn parse_update_issue(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let id = r.id("id", IssueRef::parse);
    let title = r.opt_string_max("title", 500);
    let mut input = read_issue_fields(&mut r);
    input.title = title;
    if input == IssueInput::default() {
        r.reject(
            "params",
            "at least one of title, description, priority, assigneeId, stateId, projectId is required",
        );
    }
    r.finish()?;
    Ok(Command::UpdateIssue { id, input })
}

fn parse_search_issues(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let query = r.string_max("query", 500);
    let first = r.int_or("first", 1..=100, 25);
    r.finish()?;
    Ok(Command::SearchIssues { query, first })
}

fn parse_list_projects(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let first = r.int_or("first", 1..=250, 50);
    r.finish()?;
    Ok(Command::ListProjects { first })
}

fn parse_get_project(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let id = r.id("id", id::uuid);
    r.finish()?;
    Ok(Command::GetProject { id })
}

fn parse_create_project(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let name = r.string_max("name", 255);
    let team_ids = r.id_list("teamIds", id::uuid);
    let description = r.opt_string("description");
    r.finish()?;
    Ok(Command::CreateProject { name, team_ids, description })
}

fn parse_list_teams(_: &Params) -> Result<Command, SkillError> {
    Ok(Command::ListTeams)
}

fn parse_get_team(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let team = r.id("id", id::team_ref);
    r.finish()?;
    Ok(Command::GetTeam { team })
}

fn parse_list_comments(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let issue = r.id("issueId", IssueRef::parse);
    r.finish()?;
    Ok(Command::ListComments { issue })
}

fn parse_create_comment(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let issue = r.id("issueId", IssueRef::parse);
    let body = r.string("body");
    r.finish()?;
    Ok(Command::CreateComment { issue, body })
}

fn parse_list_users(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let first = r.int_or("first", 1..=250, 50);
    r.finish()?;
    Ok(Command::ListUsers { first })
}

fn parse_me(_: &Params) -> Result<Command, SkillError> {
    Ok(Command::Me)
}

fn parse_list_cycles(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let team_id = r.id("teamId", id::uuid);
    r.finish()?;
    Ok(Command::ListCycles { team_id })
}

fn parse_active_cycle(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let team_id = r.id("teamId", id::uuid);
    r.finish()?;
    Ok(Command::ActiveCycle { team_id })
}

fn parse_list_labels(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let team_id = r.opt_id("teamId", id::uuid);
    r.finish()?;
    Ok(Command::ListLabels { team_id })
}

fn parse_create_label(p: &Params) -> Result<Command, SkillError> {
    let mut r = ParamReader::new(p);
    let name = r.string_max("name", 100);
    let team_id = r.id("teamId", id::uuid);
    let color = r.opt_id("color", id::hex_color);
    r.finish()?;
    Ok(Command::CreateLabel { name, team_id, color })
}

/// The Linear proxy.
pub struct LinearSkill {
    transport: Arc<dyn VendorTransport>,
    sanitizer: Sanitizer,
}

impl LinearSkill {
    #[must_use]
    pub fn new(transport: Arc<dyn VendorTransport>) -> Self {
        Self { transport, sanitizer: Sanitizer::new(RULES, REDACTIONS) }
    }

    /// Builds the skill with an HTTP client for [`API_URL`].
    ///
    /// # Errors
    /// Returns [`SetupError`] when the client cannot be built.
    pub fn from_config(config: &LinearConfig) -> Result<Self, SetupError> {
        let transport = HttpTransport::new(API_URL, &[("Authorization", config.api_key.as_str())])?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Runs one GraphQL document and returns its `data`.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, VendorError> {
        let request = VendorRequest::post("/graphql", json!({ "query": query, "variables": variables }));
        let mut body = self.transport.send(request).await?;
        if let Some(first) = body.pointer("/errors/0") {
            return Err(VendorError::Api {
                status: None,
                code: graphql_code(first),
                message: first["message"].as_str().unwrap_or("GraphQL error").to_owned(),
            });
        }
        match body.get_mut("data").map(Value::take) {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(VendorError::Decode("GraphQL response carried no data".to_owned())),
        }
    }

    /// Runs a mutation and returns its payload's `entity`, failing when
    /// Linear reports `success: false`.
    async fn mutate(&self, query: &str, variables: Value, field: &str, entity: &str) -> Result<Value, VendorError> {
        let data = self.graphql(query, variables).await?;
        let payload = &data[field];
        if payload["success"] != Value::Bool(true) {
            return Err(VendorError::code("MUTATION_FAILED", format!("{field} reported success=false")));
        }
        Ok(payload[entity].clone())
    }
}

#[async_trait]
impl Skill for LinearSkill {
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
            Command::ListIssues { team_id, assignee_id, state, first } => {
                let mut filter = Map::new();
                if let Some(team) = team_id {
                    filter.insert("team".into(), json!({ "id": { "eq": team } }));
                }
                if let Some(assignee) = assignee_id {
                    filter.insert("assignee".into(), json!({ "id": { "eq": assignee } }));
                }
                if let Some(state) = state {
                    filter.insert("state".into(), json!({ "name": { "eqIgnoreCase": state } }));
                }
                let data = self.graphql(&queries::issues(), json!({ "filter": filter, "first": first })).await?;
                records(&data, "/issues/nodes", records::issue)?
            }
            Command::GetIssue { id } => {
                let data = self.graphql(&queries::issue(), json!({ "id": id.as_str() })).await?;
                records::issue(found(&data, "/issue", "issue")?)
            }
            Command::CreateIssue(input) => {
                self.mutate(queries::CREATE_ISSUE, json!({ "input": input }), "issueCreate", "issue")
                    .await?
            }
            Command::UpdateIssue { id, input } => {
                self.mutate(
                    queries::UPDATE_ISSUE,
                    json!({ "id": id.as_str(), "input": input }),
                    "issueUpdate",
                    "issue",
                )
                .await?
            }
            Command::SearchIssues { query, first } => {
                let data = self
                    .graphql(&queries::search_issues(), json!({ "term": query, "first": first }))
                    .await?;
                records(&data, "/searchIssues/nodes", records::issue)?
            }
            Command::ListProjects { first } => {
                let data = self.graphql(&queries::projects(), json!({ "first": first })).await?;
                records(&data, "/projects/nodes", records::project)?
            }
            Command::GetProject { id } => {
                let data = self.graphql(&queries::project(), json!({ "id": id })).await?;
                records::project(found(&data, "/project", "project")?)
            }
            Command::CreateProject { name, team_ids, description } => {
                let mut input = json!({ "name": name, "teamIds": team_ids });
                if let Some(description) = description {
                    input["description"] = Value::String(description);
                }
                self.mutate(queries::CREATE_PROJECT, json!({ "input": input }), "projectCreate", "project")
                    .await?
            }
            Command::ListTeams => {
                let data = self.graphql(queries::TEAMS, json!({})).await?;
                records(&data, "/teams/nodes", records::team)?
            }
            Command::GetTeam { team } => {
                if id::uuid(&team).is_ok() {
                    let data = self.graphql(queries::TEAM, json!({ "id": team })).await?;
                    records::team(found(&data, "/team", "team")?)
                } else {
                    let filter = json!({ "filter": { "key": { "eq": team } } });
                    let data = self.graphql(queries::TEAMS, filter).await?;
                    records::team(found(&data, "/teams/nodes/0", "team")?)
                }
            }
            Command::ListComments { issue } => {
                let data = self.graphql(queries::COMMENTS, json!({ "id": issue.as_str() })).await?;
                found(&data, "/issue", "issue")?;
                records(&data, "/issue/comments/nodes", records::comment)?
            }
            Command::CreateComment { issue, body } => {
                let input = json!({ "issueId": issue.as_str(), "body": body });
                self.mutate(queries::CREATE_COMMENT, json!({ "input": input }), "commentCreate", "comment")
                    .await?
            }
            Command::ListUsers { first } => {
                let data = self.graphql(queries::USERS, json!({ "first": first })).await?;
                records(&data, "/users/nodes", records::user)?
            }
            Command::Me => {
                let data = self.graphql(queries::VIEWER, json!({})).await?;
                records::user(found(&data, "/viewer", "viewer")?)
            }
            Command::ListCycles { team_id } => {
                let data = self.graphql(&queries::cycles(), json!({ "teamId": team_id })).await?;
                found(&data, "/team", "team")?;
                records(&data, "/team/cycles/nodes", records::cycle)?
            }
            Command::ActiveCycle { team_id } => {
                let data = self.graphql(&queries::active_cycle(), json!({ "teamId": team_id })).await?;
                let team = found(&data, "/team", "team")?;
                match &team["activeCycle"] {
                    Value::Null => Value::Null,
                    cycle => records::cycle(cycle),
                }
            }
            Command::ListLabels { team_id } => {
                let filter = team_id.map(|team| json!({ "team": { "id": { "eq": team } } }));
                let data = self.graphql(queries::LABELS, json!({ "filter": filter })).await?;
                records(&data, "/issueLabels/nodes", records::label)?
            }
            Command::CreateLabel { name, team_id, color } => {
                let mut input = json!({ "name": name, "teamId": team_id });
                if let Some(color) = color {
                    input["color"] = Value::String(color);
                }
                self.mutate(queries::CREATE_LABEL, json!({ "input": input }), "issueLabelCreate", "issueLabel")
                    .await?
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

    const TEAM_UUID: &str = "0b2c6f1e-8d4a-4c3b-9f7e-1a2b3c4d5e6f";

    fn skill(stub: &Arc<RecordingTransport>) -> LinearSkill {
        LinearSkill::new(stub.clone())
    }

    fn request(category: &str, action: &str, params: Value) -> ActionRequest {
        ActionRequest::new(category, action).with_params(params)
    }

    fn variables(stub: &RecordingTransport) -> Value {
        match stub.last() {
            Some(req) => req.body.map_or(Value::Null, |b| b["variables"].clone()),
            None => panic!("no request was sent"),
        }
    }

    #[tokio::test]
    async fn teams_list_returns_flat_records() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({
            "data": {"teams": {"nodes": [
                {"id": "t1", "key": "ENG", "name": "Engineering", "description": null},
                {"id": "t2", "key": "OPS", "name": "Operations", "description": "On-call"}
            ]}}
        })));
        let value = match skill(&stub).handle(request("teams", "list", json!({}))).await {
            Ok(v) => v,
            Err(e) => panic!("teams list failed: {e}"),
        };
        assert_eq!(
            value,
            json!([
                {"id": "t1", "key": "ENG", "name": "Engineering", "description": null},
                {"id": "t2", "key": "OPS", "name": "Operations", "description": "On-call"}
            ])
        );
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn issue_key_and_uuid_forms_normalize_before_the_call() {
        let reply = json!({"data": {"issue": {"id": "i1", "identifier": "ENG-42"}}});
        let stub = Arc::new(RecordingTransport::new().reply(reply.clone()).reply(reply));
        let s = skill(&stub);
        for raw in ["eng-42", " ENG-42 "] {
            let req = request("issues", "get", json!({ "id": raw }));
            if let Err(e) = s.handle(req).await {
                panic!("get failed for {raw}: {e}");
            }
            assert_eq!(variables(&stub)["id"], "ENG-42");
        }

        let stub = Arc::new(
            RecordingTransport::new()
                .reply(json!({"data": {"team": {"cycles": {"nodes": []}}}}))
                .reply(json!({"data": {"team": {"cycles": {"nodes": []}}}})),
        );
        let s = skill(&stub);
        for raw in [TEAM_UUID.to_owned(), TEAM_UUID.replace('-', "").to_uppercase()] {
            if let Err(e) = s.handle(request("cycles", "list", json!({ "teamId": raw }))).await {
                panic!("cycles failed: {e}");
            }
            assert_eq!(variables(&stub)["teamId"], TEAM_UUID);
        }
    }

    #[tokio::test]
    async fn unknown_action_never_reaches_linear() {
        let stub = Arc::new(RecordingTransport::new());
        let err = match skill(&stub).handle(request("issues", "delete", json!({}))).await {
            Err(e) => e,
            Ok(v) => panic!("expected failure, got {v}"),
        };
        assert!(err.to_string().contains("list, get, create, update, search"), "got {err}");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn create_issue_reports_every_bad_field() {
        let stub = Arc::new(RecordingTransport::new());
        let params = json!({"teamId": "nope", "priority": 9, "labelIds": ["x"]});
        match skill(&stub).handle(request("issues", "create", params)).await {
            Err(SkillError::InvalidParams(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["teamId", "title", "priority", "labelIds[0]"]);
            }
            other => panic!("expected InvalidParams, got {other:?}"),
        }
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn create_issue_sends_camel_case_input() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({
            "data": {"issueCreate": {"success": true, "issue": {"id": "i9", "identifier": "ENG-9"}}}
        })));
        let params = json!({"teamId": TEAM_UUID, "title": "Broken login", "priority": 1});
        let value = match skill(&stub).handle(request("issues", "create", params)).await {
            Ok(v) => v,
            Err(e) => panic!("create failed: {e}"),
        };
        assert_eq!(value["identifier"], "ENG-9");
        assert_eq!(
            variables(&stub)["input"],
            json!({"teamId": TEAM_UUID, "title": "Broken login", "priority": 1})
        );
    }

    #[tokio::test]
    async fn update_without_fields_is_rejected() {
        let stub = Arc::new(RecordingTransport::new());
        let result = skill(&stub).handle(request("issues", "update", json!({"id": "ENG-1"}))).await;
        assert!(matches!(result, Err(SkillError::InvalidParams(_))));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn failed_mutation_is_a_vendor_error() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({
            "data": {"commentCreate": {"success": false, "comment": null}}
        })));
        let params = json!({"issueId": "ENG-1", "body": "hi"});
        match skill(&stub).handle(request("comments", "create", params)).await {
            Err(SkillError::Vendor(VendorError::Api { code, .. })) => {
                assert_eq!(code.as_deref(), Some("MUTATION_FAILED"));
            }
            other => panic!("expected vendor error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn graphql_errors_are_classified() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({
            "data": null,
            "errors": [{"message": "Entity not found: Issue", "extensions": {"code": "ENTITY_NOT_FOUND"}}]
        })));
        let s = skill(&stub);
        let err = match s.handle(request("issues", "get", json!({"id": "ENG-404"}))).await {
            Err(e) => e,
            Ok(v) => panic!("expected failure, got {v}"),
        };
        let sanitized = Skill::sanitizer(&s).sanitize(&err);
        assert_eq!(sanitized.status, 404);
        assert_eq!(sanitized.message, "Linear entity not found.");
    }

    #[tokio::test]
    async fn team_key_is_looked_up_by_filter() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({
            "data": {"teams": {"nodes": [{"id": "t1", "key": "ENG", "name": "Engineering"}]}}
        })));
        let value = match skill(&stub).handle(request("teams", "get", json!({"id": "eng"}))).await {
            Ok(v) => v,
            Err(e) => panic!("team get failed: {e}"),
        };
        assert_eq!(value["id"], "t1");
        assert_eq!(variables(&stub), json!({"filter": {"key": {"eq": "ENG"}}}));
    }

    #[tokio::test]
    async fn missing_team_by_key_is_not_found() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({"data": {"teams": {"nodes": []}}})));
        let result = skill(&stub).handle(request("teams", "get", json!({"id": "NOPE"}))).await;
        assert!(matches!(
            result,
            Err(SkillError::Vendor(VendorError::Api { status: Some(404), .. }))
        ));
    }

    #[tokio::test]
    async fn active_cycle_may_be_absent() {
        let stub = Arc::new(RecordingTransport::new().reply(json!({"data": {"team": {"activeCycle": null}}})));
        match skill(&stub).handle(request("cycles", "active", json!({"teamId": TEAM_UUID}))).await {
            Ok(v) => assert!(v.is_null()),
            Err(e) => panic!("active cycle failed: {e}"),
        }
    }

    #[test]
    fn config_requires_linear_key_prefix() {
        let bad = KeyValues::from_pairs([("api_key", "sk-123")]);
        assert!(matches!(LinearConfig::from_values(&bad), Err(ConfigError::Invalid { .. })));
        let good = KeyValues::from_pairs([("api_key", "lin_api_abc"), ("port", "4101")]);
        match LinearConfig::from_values(&good) {
            Ok(c) => assert_eq!(c.port, Some(4101)),
            Err(e) => panic!("config rejected: {e}"),
        }
    }
}
