use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open parameter mapping carried by every request.
pub type Params = Map<String, Value>;

/// The generic `{category, action, params}` request accepted by every skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ActionRequest {
    /// Resource family, e.g. `"issues"` or `"channels"`.
    pub category: String,
    /// Operation within the category, e.g. `"list"`.
    pub action: String,
    /// Action parameters. Absent means `{}`.
    #[serde(default)]
    pub params: Params,
}

impl ActionRequest {
    /// Creates a request with empty params.
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            params: Params::new(),
        }
    }

    /// Replaces the params with the given JSON object.
    ///
    /// Non-object values leave the params empty.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        if let Value::Object(map) = params {
            self.params = map;
        }
        self
    }
}

/// The uniform `{success, data|error}` response.
///
/// Exactly one of `data` and `error` is set, gated by `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    /// A successful response carrying `data`.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// A failed response carrying an already sanitized message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}
