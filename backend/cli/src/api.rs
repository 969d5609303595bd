use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use routeforge_core::{ChatErrorKind, ChatRequest, ChatResult};
use routeforge_routing::{Router as ChatRouter, RouterStats};

/// Shared application state for API handlers.
pub struct AppState {
    pub router: Arc<ChatRouter>,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/stats", get(stats))
        .route("/api/availability/refresh", post(refresh_availability))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "routeforge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Route one chat request.
///
/// The call runs on its own task; if the client goes away the handler future
/// is dropped, the guard fires the token and the router records the
/// cancellation instead of vanishing mid-attempt.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<(StatusCode, Json<ChatResult>), StatusCode> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let router = Arc::clone(&state.router);
    let result = tokio::spawn(async move { router.chat_with_cancel(request, &cancel).await })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Chat task failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((status_for(&result), Json(result)))
}

fn status_for(result: &ChatResult) -> StatusCode {
    match result.error.as_ref().map(|e| e.kind) {
        None => StatusCode::OK,
        Some(ChatErrorKind::InvalidRequest) => StatusCode::BAD_REQUEST,
        Some(ChatErrorKind::NoProviderAvailable) => StatusCode::SERVICE_UNAVAILABLE,
        Some(ChatErrorKind::AllProvidersFailed) => StatusCode::BAD_GATEWAY,
        Some(ChatErrorKind::Cancelled) => StatusCode::REQUEST_TIMEOUT,
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<RouterStats> {
    Json(state.router.stats())
}

async fn refresh_availability(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.router.refresh_availability().await;
    Json(json!({ "availability": state.router.stats().availability }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use routeforge_core::{ProviderError, ProviderId};
    use routeforge_providers::{AdapterSet, MockProvider};
    use routeforge_routing::AvailabilityRegistry;
    use tower::ServiceExt;

    fn app(adapters: AdapterSet, available: &[ProviderId]) -> Router {
        let availability = Arc::new(AvailabilityRegistry::from_state(
            available.iter().map(|p| (*p, true)),
        ));
        let router = Arc::new(ChatRouter::new(adapters, availability));
        build_router(Arc::new(AppState { router }))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_chat(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(AdapterSet::new(), &[])
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_chat_success() {
        let adapters = AdapterSet::new().with(Arc::new(
            MockProvider::new(ProviderId::Gemini).with_response("grounded answer"),
        ));
        let response = app(adapters, &[ProviderId::Gemini])
            .oneshot(post_chat(json!({
                "messages": [{"role": "user", "content": "latest rust release?"}],
                "task_category": "search"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["content"], "grounded answer");
        assert_eq!(body["provider_used"], "gemini");
        assert_eq!(body["usage"]["input_tokens"], 0);
    }

    #[tokio::test]
    async fn test_chat_failure_status_codes() {
        let response = app(AdapterSet::new(), &[])
            .oneshot(post_chat(json!({"messages": [{"role": "user", "content": "hi"}]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"]["kind"], "no_provider_available");

        let adapters = AdapterSet::new().with(Arc::new(
            MockProvider::new(ProviderId::OpenAi).failing(ProviderError::Auth("bad key".into())),
        ));
        let response = app(adapters, &[ProviderId::OpenAi])
            .oneshot(post_chat(json!({"messages": [{"role": "user", "content": "hi"}]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = app(AdapterSet::new(), &[])
            .oneshot(post_chat(json!({"messages": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats() {
        let response = app(AdapterSet::new(), &[ProviderId::Ollama])
            .oneshot(Request::builder().uri("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["availability"]["ollama"], true);
        assert_eq!(body["availability"]["anthropic"], false);
        assert_eq!(body["models"]["openai"], "gpt-4o");
        assert_eq!(body["policy"]["chat"][0], "openai");
    }

    #[tokio::test]
    async fn test_refresh_availability() {
        let adapters = AdapterSet::new()
            .with(Arc::new(MockProvider::new(ProviderId::Anthropic)))
            .with(Arc::new(MockProvider::new(ProviderId::OpenAi).without_credentials()));
        let response = app(adapters, &[])
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/availability/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["availability"]["anthropic"], true);
        assert_eq!(body["availability"]["openai"], false);
    }
}
