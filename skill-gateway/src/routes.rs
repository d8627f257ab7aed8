//! Axum route handlers for a skill proxy.

use std::{any::Any, sync::Arc, time::Instant};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::Uri,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use skill_core::{sanitize::panic_message, ActionRequest, ActionResponse, Proxy, Sanitizer};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::error::GatewayError;

type Skill = Arc<dyn Proxy>;

/// Build the application router around one skill.
pub fn create_router(proxy: Skill) -> Router {
    let sanitizer = proxy.sanitizer().clone();
    Router::new()
        .route("/health", get(health))
        .route("/action", post(action))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(proxy)
        .layer(CatchPanicLayer::custom(move |payload: Box<dyn Any + Send + 'static>| {
            panic_response(&sanitizer, payload.as_ref())
        }))
        .layer(TraceLayer::new_for_http())
}

/// `GET /health` — liveness check. Never touches the vendor.
pub async fn health(State(proxy): State<Skill>) -> Json<Value> {
    Json(json!({ "status": "ok", "skill": proxy.name() }))
}

/// `POST /action` — resolve, validate and run one `{category, action, params}`
/// request.
///
/// # Errors
/// [`GatewayError::BadBody`] when the body is not an action envelope, or
/// [`GatewayError::Action`] with the sanitized failure.
pub async fn action(
    State(proxy): State<Skill>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, GatewayError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(skill = proxy.name(), %rejection, "rejected request body");
        GatewayError::BadBody
    })?;
    let category = request.category.clone();
    let action = request.action.clone();

    let started = Instant::now();
    let result = proxy.handle(request).await;
    let elapsed_ms = started.elapsed().as_millis();

    match result {
        Ok(data) => {
            tracing::info!(skill = proxy.name(), %category, %action, elapsed_ms, status = 200, "action ok");
            Ok(Json(ActionResponse::ok(data)))
        }
        Err(err) => {
            let sanitized = proxy.sanitizer().sanitize(&err);
            tracing::debug!(
                skill = proxy.name(),
                detail = %proxy.sanitizer().redact(&err.to_string()),
                "raw action failure"
            );
            tracing::warn!(
                skill = proxy.name(),
                %category,
                %action,
                elapsed_ms,
                status = sanitized.status,
                client_error = err.is_client_error(),
                "action failed"
            );
            Err(GatewayError::Action(sanitized))
        }
    }
}

async fn not_found(State(proxy): State<Skill>, uri: Uri) -> GatewayError {
    GatewayError::NotFound(proxy.sanitizer().redact(uri.path()))
}

async fn method_not_allowed() -> GatewayError {
    GatewayError::MethodNotAllowed
}

fn panic_response(sanitizer: &Sanitizer, payload: &(dyn Any + Send)) -> Response {
    let sanitized = sanitizer.sanitize_panic(payload);
    let detail = panic_message(payload).map(|m| sanitizer.redact(m));
    tracing::error!(detail = detail.as_deref().unwrap_or("<non-string payload>"), "handler panicked");
    GatewayError::Action(sanitized).into_response()
}
