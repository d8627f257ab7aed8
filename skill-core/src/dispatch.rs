//! Command tables and the skill abstraction.
//!
//! Every skill declares a static [`ActionTable`] mapping `(category, action)`
//! to a parse function that validates the params and builds one variant of the
//! skill's `Command` enum. Executing a command is an exhaustive `match`, so a
//! table entry without an executor does not build.

use async_trait::async_trait;
use serde_json::Value;

use crate::envelope::{ActionRequest, Params};
use crate::error::SkillError;
use crate::sanitize::Sanitizer;

/// Validates params and builds a command.
pub type ParseFn<C> = fn(&Params) -> Result<C, SkillError>;

/// One `(category, action)` row of an [`ActionTable`].
pub struct ActionEntry<C> {
    pub category: &'static str,
    pub action: &'static str,
    pub parse: ParseFn<C>,
}

impl<C> ActionEntry<C> {
    #[must_use]
    pub const fn new(category: &'static str, action: &'static str, parse: ParseFn<C>) -> Self {
        Self { category, action, parse }
    }
}

/// Closed mapping from `(category, action)` to parse functions.
///
/// A thin view over a `static` slice of entries, cheap to copy.
pub struct ActionTable<C: 'static> {
    entries: &'static [ActionEntry<C>],
}

impl<C> Clone for ActionTable<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ActionTable<C> {}

impl<C> ActionTable<C> {
    #[must_use]
    pub const fn new(entries: &'static [ActionEntry<C>]) -> Self {
        Self { entries }
    }

    /// Distinct categories in declaration order.
    #[must_use]
    pub fn categories(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for entry in self.entries {
            if !out.contains(&entry.category) {
                out.push(entry.category);
            }
        }
        out
    }

    /// Actions declared for `category`, in declaration order.
    #[must_use]
    pub fn actions(&self, category: &str) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.action)
            .collect()
    }

    /// Routes and validates a request into a command.
    ///
    /// Matching is exact: no prefixes, no case folding.
    ///
    /// # Errors
    /// Returns [`SkillError::UnknownCategory`], [`SkillError::UnknownAction`],
    /// or whatever the entry's parse function rejects.
    pub fn resolve(&self, request: &ActionRequest) -> Result<C, SkillError> {
        let available = self.actions(&request.category);
        if available.is_empty() {
            return Err(SkillError::UnknownCategory {
                category: request.category.clone(),
                available: self.categories(),
            });
        }
        let entry = self
            .entries
            .iter()
            .find(|e| e.category == request.category && e.action == request.action)
            .ok_or_else(|| SkillError::UnknownAction {
                category: request.category.clone(),
                action: request.action.clone(),
                available,
            })?;
        (entry.parse)(&request.params)
    }
}

/// A vendor proxy: a command table plus an executor that talks to the vendor.
///
/// Implementations hold their configuration and a long-lived vendor client
/// and must be safe to share across concurrent requests.
#[async_trait]
pub trait Skill: Send + Sync + 'static {
    /// Validated, canonicalized work item produced by the table.
    type Command: Send + std::fmt::Debug;

    /// Short skill name, e.g. `"linear"`.
    fn name(&self) -> &'static str;

    /// The skill's static command table.
    fn table(&self) -> ActionTable<Self::Command>;

    /// The vendor-specific error sanitizer.
    fn sanitizer(&self) -> &Sanitizer;

    /// Runs a command against the vendor and returns the adapted result.
    ///
    /// # Errors
    /// Returns [`SkillError::Vendor`] for vendor failures, or a client error
    /// for checks that need configuration (e.g. a missing optional token).
    async fn execute(&self, command: Self::Command) -> Result<Value, SkillError>;
}

/// Object-safe view of a [`Skill`], used by the HTTP layer.
#[async_trait]
pub trait Proxy: Send + Sync {
    fn name(&self) -> &'static str;

    fn sanitizer(&self) -> &Sanitizer;

    /// Resolves, validates and executes one request.
    ///
    /// # Errors
    /// Any [`SkillError`]; validation failures return before the vendor is
    /// contacted.
    async fn handle(&self, request: ActionRequest) -> Result<Value, SkillError>;
}

#[async_trait]
impl<S: Skill> Proxy for S {
    fn name(&self) -> &'static str {
        Skill::name(self)
    }

    fn sanitizer(&self) -> &Sanitizer {
        Skill::sanitizer(self)
    }

    async fn handle(&self, request: ActionRequest) -> Result<Value, SkillError> {
        let command = self.table().resolve(&request)?;
        self.execute(command).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::params::ParamReader;

    #[derive(Debug, PartialEq)]
    enum Command {
        ListTeams,
        GetTeam { id: String },
    }

    fn parse_list(_: &Params) -> Result<Command, SkillError> {
        Ok(Command::ListTeams)
    }

    fn parse_get(p: &Params) -> Result<Command, SkillError> {
        let mut r = ParamReader::new(p);
        let id = r.string("id");
        r.finish()?;
        Ok(Command::GetTeam { id })
    }

    static ACTIONS: &[ActionEntry<Command>] = &[
        ActionEntry::new("teams", "list", parse_list),
        ActionEntry::new("teams", "get", parse_get),
        ActionEntry::new("users", "list", parse_list),
    ];

    struct CountingSkill {
        calls: AtomicUsize,
        sanitizer: Sanitizer,
    }

    #[async_trait]
    impl Skill for CountingSkill {
        type Command = Command;

        fn name(&self) -> &'static str {
            "counting"
        }

        fn table(&self) -> ActionTable<Command> {
            ActionTable::new(ACTIONS)
        }

        fn sanitizer(&self) -> &Sanitizer {
            &self.sanitizer
        }

        async fn execute(&self, command: Command) -> Result<Value, SkillError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match command {
                Command::ListTeams => json!([]),
                Command::GetTeam { id } => json!({ "id": id }),
            })
        }
    }

    fn skill() -> CountingSkill {
        CountingSkill { calls: AtomicUsize::new(0), sanitizer: Sanitizer::default() }
    }

    #[test]
    fn categories_are_deduplicated_in_order() {
        let table = ActionTable::new(ACTIONS);
        assert_eq!(table.categories(), vec!["teams", "users"]);
        assert_eq!(table.actions("teams"), vec!["list", "get"]);
        assert!(table.actions("nope").is_empty());
    }

    #[tokio::test]
    async fn unknown_category_never_executes() {
        let s = skill();
        let err = match s.handle(ActionRequest::new("widgets", "list")).await {
            Err(e) => e,
            Ok(v) => panic!("expected failure, got {v}"),
        };
        assert!(err.to_string().contains("Unknown category: widgets"));
        assert_eq!(s.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_action_lists_valid_actions_and_never_executes() {
        let s = skill();
        let err = match s.handle(ActionRequest::new("teams", "delete")).await {
            Err(e) => e,
            Ok(v) => panic!("expected failure, got {v}"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Unknown action: delete"), "got {msg}");
        assert!(msg.contains("list, get"), "got {msg}");
        assert_eq!(s.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn category_match_is_exact() {
        let s = skill();
        assert!(s.handle(ActionRequest::new("Teams", "list")).await.is_err());
        assert!(s.handle(ActionRequest::new("team", "list")).await.is_err());
        assert_eq!(s.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_params_never_execute() {
        let s = skill();
        let result = s.handle(ActionRequest::new("teams", "get")).await;
        assert!(matches!(result, Err(SkillError::InvalidParams(_))));
        assert_eq!(s.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_request_executes_once() {
        let s = skill();
        let req = ActionRequest::new("teams", "get").with_params(json!({"id": "t1"}));
        let value = match s.handle(req).await {
            Ok(v) => v,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(value, json!({"id": "t1"}));
        assert_eq!(s.calls.load(Ordering::SeqCst), 1);
    }
}
