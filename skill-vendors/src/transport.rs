//! Vendor transport abstraction.
//!
//! Skills describe each vendor call as a [`VendorRequest`] and hand it to a
//! [`VendorTransport`]. Production uses [`crate::HttpTransport`]; tests swap
//! in a recording stub so no network is needed.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use skill_core::VendorError;

/// HTTP verb of a vendor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

/// One call against a vendor API, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorRequest {
    pub method: Method,
    /// Path appended to the base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Per-call headers on top of the transport's fixed ones.
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl VendorRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).json(body)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Adds `key=value` only when `value` is present.
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first query pair named `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Sends vendor calls and returns the decoded JSON body.
///
/// Implementations must be `Send + Sync`; one instance serves every request
/// for the life of the process.
///
/// # Cancel Safety
/// Dropping the future abandons the call; nothing is retried.
#[async_trait]
pub trait VendorTransport: Send + Sync {
    /// Performs `request`.
    ///
    /// # Errors
    /// Returns [`VendorError::Api`] for non-success statuses,
    /// [`VendorError::Timeout`] or [`VendorError::Connect`] for transport
    /// failures, and [`VendorError::Decode`] for unreadable bodies.
    async fn send(&self, request: VendorRequest) -> Result<Value, VendorError>;
}

#[cfg(any(test, feature = "testing"))]
pub use recording::RecordingTransport;

#[cfg(any(test, feature = "testing"))]
mod recording {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;
    use skill_core::VendorError;

    use super::{VendorRequest, VendorTransport};

    /// Test transport that records every request and replays queued replies.
    ///
    /// With nothing queued it answers with a decode error, so a test that
    /// forgets to queue a reply fails loudly.
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        replies: Mutex<VecDeque<Result<Value, VendorError>>>,
        requests: Mutex<Vec<VendorRequest>>,
    }

    #[expect(clippy::expect_used, reason = "a poisoned lock means a test already panicked")]
    impl RecordingTransport {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a successful reply.
        #[must_use]
        pub fn reply(self, body: Value) -> Self {
            self.replies.lock().expect("replies lock").push_back(Ok(body));
            self
        }

        /// Queues a failed reply.
        #[must_use]
        pub fn fail(self, err: VendorError) -> Self {
            self.replies.lock().expect("replies lock").push_back(Err(err));
            self
        }

        /// Number of requests sent so far.
        pub fn calls(&self) -> usize {
            self.requests.lock().expect("requests lock").len()
        }

        /// Snapshot of every request sent so far.
        pub fn requests(&self) -> Vec<VendorRequest> {
            self.requests.lock().expect("requests lock").clone()
        }

        /// The most recent request, if any.
        pub fn last(&self) -> Option<VendorRequest> {
            self.requests.lock().expect("requests lock").last().cloned()
        }
    }

    #[async_trait]
    impl VendorTransport for RecordingTransport {
        #[expect(clippy::expect_used, reason = "a poisoned lock means a test already panicked")]
        async fn send(&self, request: VendorRequest) -> Result<Value, VendorError> {
            self.requests.lock().expect("requests lock").push(request);
            self.replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .unwrap_or_else(|| Err(VendorError::Decode("no reply queued".to_owned())))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_collects_query_and_headers() {
        let req = VendorRequest::get("/rest/v1/todos")
            .query("select", "*")
            .query_opt("limit", Some("10"))
            .query_opt("offset", None::<String>)
            .header("Accept-Profile", "app");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.query_value("select"), Some("*"));
        assert_eq!(req.query_value("limit"), Some("10"));
        assert_eq!(req.query_value("offset"), None);
        assert_eq!(req.headers, vec![("Accept-Profile", "app".to_owned())]);
        assert!(req.body.is_none());
    }

    #[tokio::test]
    async fn recording_transport_replays_in_order() {
        let stub = RecordingTransport::new()
            .reply(json!({"n": 1}))
            .fail(VendorError::status(404, "missing"));
        let first = stub.send(VendorRequest::get("/a")).await;
        let second = stub.send(VendorRequest::get("/b")).await;
        let third = stub.send(VendorRequest::get("/c")).await;
        assert!(matches!(first, Ok(ref v) if v["n"] == 1));
        assert!(matches!(second, Err(VendorError::Api { status: Some(404), .. })));
        assert!(matches!(third, Err(VendorError::Decode(_))));
        assert_eq!(stub.calls(), 3);
        assert_eq!(stub.last().map(|r| r.path), Some("/c".to_owned()));
    }
}
