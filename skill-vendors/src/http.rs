//! `reqwest`-backed [`VendorTransport`].
//!
//! One client per base URL, built once at startup with the vendor's fixed
//! headers (credentials, API version). Non-success statuses are decoded into
//! [`VendorError::Api`] using whichever error shape the vendor returned.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use skill_core::VendorError;

use crate::transport::{Method, VendorRequest, VendorTransport};
use crate::SetupError;

/// Only connecting is bounded. Once connected, a request waits for the
/// vendor for as long as the vendor takes.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Longest raw body kept as an error message when the vendor sent no JSON.
const MAX_RAW_MESSAGE: usize = 512;

/// HTTP transport rooted at a base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds a client that sends `headers` on every request.
    ///
    /// Header values are marked sensitive so they never appear in debug
    /// output.
    ///
    /// # Errors
    /// Returns [`SetupError::Header`] for values HTTP cannot carry and
    /// [`SetupError::Client`] when the TLS client cannot be initialized.
    pub fn new(base_url: impl Into<String>, headers: &[(&str, &str)]) -> Result<Self, SetupError> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let header_error = || SetupError::Header { name: (*name).to_owned() };
            let key = HeaderName::from_bytes(name.as_bytes()).map_err(|_| header_error())?;
            let mut val = HeaderValue::from_str(value).map_err(|_| header_error())?;
            val.set_sensitive(true);
            map.insert(key, val);
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("skill-proxies/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(map)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl VendorTransport for HttpTransport {
    async fn send(&self, request: VendorRequest) -> Result<Value, VendorError> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "vendor call finished"
        );

        if !status.is_success() {
            let parsed: Option<Value> = serde_json::from_str(&text).ok();
            let (code, message) = parsed.as_ref().map(error_fields).unwrap_or_default();
            return Err(VendorError::Api {
                status: Some(status.as_u16()),
                code,
                message: message.unwrap_or_else(|| truncate(&text)),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| VendorError::Decode(format!("response is not JSON: {e}")))
    }
}

fn transport_error(err: reqwest::Error) -> VendorError {
    let err = err.without_url();
    if err.is_timeout() {
        VendorError::Timeout(err.to_string())
    } else if err.is_decode() || err.is_body() {
        VendorError::Decode(err.to_string())
    } else {
        VendorError::Connect(err.to_string())
    }
}

/// Pulls a code and a message out of the error bodies the supported vendors
/// send: `{code, message}` (Notion, PostgREST), `{error, message}` (Supabase
/// storage, Slack) and GraphQL `{errors: [{message, extensions: {code}}]}`.
pub(crate) fn error_fields(body: &Value) -> (Option<String>, Option<String>) {
    let text = |v: &Value| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    let first_graphql = body.pointer("/errors/0");
    let code = text(&body["code"])
        .or_else(|| text(&body["error_code"]))
        .or_else(|| text(&body["error"]))
        .or_else(|| first_graphql.and_then(graphql_code));
    let message = text(&body["message"])
        .or_else(|| text(&body["msg"]))
        .or_else(|| text(&body["error_description"]))
        .or_else(|| first_graphql.and_then(|e| text(&e["message"])))
        .or_else(|| text(&body["error"]));
    (code, message)
}

/// `extensions.code`, falling back to `extensions.type`.
pub(crate) fn graphql_code(error: &Value) -> Option<String> {
    error
        .pointer("/extensions/code")
        .or_else(|| error.pointer("/extensions/type"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_RAW_MESSAGE).collect()
}
