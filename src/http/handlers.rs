//! Management API handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::admission::AdmissionRegistry;
use crate::config::AdmissionConfig;
use crate::error::TollgateError;
use crate::overview::{compose, PersistentStats};
use crate::usage::{self, UsageLedger};

/// Shared state for the management API.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<UsageLedger>,
    pub registry: Arc<AdmissionRegistry>,
    pub stats: Arc<dyn PersistentStats>,
    pub admission: Arc<AdmissionConfig>,
}

/// Build the management router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v0/management/usage", get(get_usage))
        .route("/v0/management/usage/export", get(export_usage))
        .route("/v0/management/usage/import", post(import_usage))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admission_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Admission middleware: requests carrying an `x-api-key` header are
/// checked against that key's configured limit. Requests without a key are
/// not limited here; authentication is a separate concern.
async fn admission_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if let Some(key) = key {
        let limit_rpm = state.admission.limit_for(&key);
        if !state.registry.allow(&key, limit_rpm) {
            debug!(key = %key, limit_rpm = limit_rpm, "Request throttled");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": {
                        "message": "rate limit exceeded",
                        "type": "rate_limit_error",
                    }
                })),
            )
                .into_response();
        }
    }

    next.run(request).await
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Composed statistics overview: the live snapshot with persistent totals,
/// period costs, and per-model aggregates layered on top.
async fn get_usage(State(state): State<AppState>) -> Json<crate::overview::Overview> {
    let overview = compose(state.ledger.snapshot(), state.stats.as_ref()).await;
    Json(overview)
}

/// Complete usage snapshot for backup/migration.
async fn export_usage(State(state): State<AppState>) -> Json<usage::ExportPayload> {
    Json(usage::export(&state.ledger))
}

/// Merge a previously exported usage snapshot into the ledger.
async fn import_usage(State(state): State<AppState>, body: Bytes) -> Response {
    match usage::import_bytes(&state.ledger, &body) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(TollgateError::InvalidPayload(err)) => {
            warn!(error = %err, "Rejected usage import: malformed payload");
            (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid json"}))).into_response()
        }
        Err(TollgateError::UnsupportedVersion(version)) => {
            warn!(version = version, "Rejected usage import: unsupported version");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "unsupported version"})),
            )
                .into_response()
        }
        Err(err) => {
            warn!(error = %err, "Usage import failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "import failed"})),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overview::NoPersistence;
    use crate::usage::Outcome;
    use axum::body::Body;
    use axum::http::{header, Method, Request as HttpRequest};
    use tower::ServiceExt;

    fn test_state(admission: AdmissionConfig) -> AppState {
        AppState {
            ledger: Arc::new(UsageLedger::new()),
            registry: Arc::new(AdmissionRegistry::new()),
            stats: Arc::new(NoPersistence),
            admission: Arc::new(admission),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state(AdmissionConfig::default()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_overview_reports_live_values_without_persistence() {
        let state = test_state(AdmissionConfig::default());
        state.ledger.record("gemini", "gemini-pro", 100, Outcome::Success);
        state.ledger.record("gemini", "gemini-pro", 50, Outcome::Failure);
        let app = router(state);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/v0/management/usage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["usage"]["total_requests"], 2);
        assert_eq!(body["failed_requests"], 1);
    }

    #[tokio::test]
    async fn test_export_import_round_trip_over_http() {
        let state = test_state(AdmissionConfig::default());
        state.ledger.record("gemini", "gemini-pro", 100, Outcome::Success);
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/v0/management/usage/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let exported = body_json(response).await;
        assert_eq!(exported["version"], 1);

        // Import the export into a fresh ledger behind a fresh router.
        let fresh = test_state(AdmissionConfig::default());
        let fresh_app = router(fresh.clone());
        let response = fresh_app
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/v0/management/usage/import")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(exported.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["added"], 1);
        assert_eq!(body["skipped"], 0);
        assert_eq!(body["total_requests"], 1);
        assert_eq!(fresh.ledger.snapshot(), state.ledger.snapshot());
    }

    #[tokio::test]
    async fn test_import_rejects_unsupported_version() {
        let app = router(test_state(AdmissionConfig::default()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/v0/management/usage/import")
                    .body(Body::from(r#"{"version": 2, "usage": {}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "unsupported version");
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_payload() {
        let app = router(test_state(AdmissionConfig::default()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/v0/management/usage/import")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid json");
    }

    #[tokio::test]
    async fn test_admission_guard_throttles_configured_key() {
        let admission = AdmissionConfig {
            default_limit_rpm: 0,
            key_limits: std::collections::HashMap::from([("tight-key".to_string(), 2)]),
        };
        let app = router(test_state(admission));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    HttpRequest::builder()
                        .uri("/health")
                        .header("x-api-key", "tight-key")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .header("x-api-key", "tight-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_unkeyed_requests_are_not_limited() {
        let admission = AdmissionConfig {
            default_limit_rpm: 1,
            key_limits: std::collections::HashMap::new(),
        };
        let state = test_state(admission);
        let app = router(state.clone());

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(
                    HttpRequest::builder()
                        .uri("/health")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert!(state.registry.is_empty());
    }
}
