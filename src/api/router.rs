//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! API routes live under `/api/`; anything else falls through to the
//! static demo assets directory.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config;

/// Build the full application router.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(endpoints::health::check))
        .route("/api/chat/start", post(endpoints::chat::start))
        .route("/api/chat/:id/message", post(endpoints::chat::message))
        .route("/api/chat/:id/restart", post(endpoints::chat::restart))
        .route("/api/llm", post(endpoints::llm::summarize))
        .fallback_service(ServeDir::new(config::assets_dir()))
        .layer(cors_layer())
        .with_state(ctx)
}

fn cors_layer() -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    let origin = config::allowed_origin();
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "invalid allowed origin, falling back to any");
            layer.allow_origin(Any)
        }
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::summarize::SummaryClient;

    fn test_router() -> Router {
        // No upstream key: the summarizer resolves locally, no network.
        let ctx = ApiContext::new(SummaryClient::new("http://127.0.0.1:9", None, "test-model"));
        api_router(ctx)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ── Health ──

    #[tokio::test]
    async fn health_reports_ok() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], true);
        assert!(body["time"].is_string());
    }

    // ── Chat ──

    #[tokio::test]
    async fn chat_start_then_message_round_trip() {
        let ctx = ApiContext::new(SummaryClient::new("http://127.0.0.1:9", None, "test-model"));
        let router = api_router(ctx);

        let response = router
            .clone()
            .oneshot(post_json("/api/chat/start", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(body["replies"].as_array().unwrap().len(), 3);

        let response = router
            .clone()
            .oneshot(post_json(
                &format!("/api/chat/{session_id}/message"),
                r#"{"message": "It is for my 12-year-old son"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["step"], "collecting");
        assert_eq!(body["newly_escalated"], false);
        assert!(!body["replies"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_escalation_then_restart_resets() {
        let ctx = ApiContext::new(SummaryClient::new("http://127.0.0.1:9", None, "test-model"));
        let router = api_router(ctx);

        let body = json_body(
            router
                .clone()
                .oneshot(post_json("/api/chat/start", "{}"))
                .await
                .unwrap(),
        )
        .await;
        let session_id = body["session_id"].as_str().unwrap().to_string();

        let body = json_body(
            router
                .clone()
                .oneshot(post_json(
                    &format!("/api/chat/{session_id}/message"),
                    r#"{"message": "My father collapsed and is vomiting lots of blood right now"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["step"], "escalated");
        assert_eq!(body["newly_escalated"], true);

        let response = router
            .clone()
            .oneshot(post_json(&format!("/api/chat/{session_id}/restart"), "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(
            router
                .clone()
                .oneshot(post_json(
                    &format!("/api/chat/{session_id}/message"),
                    r#"{"message": "it's for me"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["step"], "collecting");
    }

    #[tokio::test]
    async fn chat_rejects_empty_and_oversized_messages() {
        let ctx = ApiContext::new(SummaryClient::new("http://127.0.0.1:9", None, "test-model"));
        let router = api_router(ctx);

        let body = json_body(
            router
                .clone()
                .oneshot(post_json("/api/chat/start", "{}"))
                .await
                .unwrap(),
        )
        .await;
        let session_id = body["session_id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(post_json(
                &format!("/api/chat/{session_id}/message"),
                r#"{"message": "   "}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let long = "a".repeat(2_001);
        let response = router
            .clone()
            .oneshot(post_json(
                &format!("/api/chat/{session_id}/message"),
                &format!(r#"{{"message": "{long}"}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_unknown_session_is_404() {
        let response = test_router()
            .oneshot(post_json(
                &format!("/api/chat/{}/message", uuid::Uuid::new_v4()),
                r#"{"message": "hello"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ── Summarization proxy ──

    #[tokio::test]
    async fn llm_missing_prompt_is_400() {
        let response = test_router()
            .oneshot(post_json("/api/llm", r#"{"engine_result": {}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn llm_oversized_prompt_is_400() {
        let long = "p".repeat(2_001);
        let response = test_router()
            .oneshot(post_json("/api/llm", &format!(r#"{{"prompt": "{long}"}}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn llm_without_upstream_answers_locally() {
        let response = test_router()
            .oneshot(post_json(
                "/api/llm",
                r#"{"prompt": "Summarise", "engine_result": {"title": "Headache", "advice": [{"name": "Paracetamol"}]}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["provider"], "local");
        assert!(body["text"].as_str().unwrap().contains("Paracetamol"));
    }
}
