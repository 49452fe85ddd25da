use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use chess_coach_core::Session;

#[derive(Deserialize)]
pub struct MoveRequest {
    pub move_uci: Option<String>,
}

#[derive(Deserialize)]
pub struct AskRequest {
    pub query: Option<String>,
}

pub fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/move", post(make_move))
        .route("/ask", post(ask_coach))
        .route("/state", get(state))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

pub async fn make_move(
    State(session): State<Arc<Session>>,
    req: Result<Json<MoveRequest>, JsonRejection>,
) -> impl IntoResponse {
    match req {
        Ok(Json(req)) => Json(session.submit_move(req.move_uci.as_deref())),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "unreadable move request");
            Json(session.reject_move_request())
        }
    }
}

pub async fn ask_coach(
    State(session): State<Arc<Session>>,
    req: Result<Json<AskRequest>, JsonRejection>,
) -> impl IntoResponse {
    match req {
        Ok(Json(req)) => Json(session.ask(req.query.as_deref()).await),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "unreadable advice request");
            Json(session.reject_advice_request())
        }
    }
}

pub async fn state(State(session): State<Arc<Session>>) -> impl IntoResponse {
    match session.snapshot() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use chess_coach_core::{
        Coach, EngineConfig, EngineManager, Game, GenerationError, TextGenerator,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct OfflineGenerator;

    #[async_trait]
    impl TextGenerator for OfflineGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Empty)
        }
    }

    fn app() -> Router {
        let engine = EngineManager::new(EngineConfig {
            path: "/nonexistent/stockfish".to_string(),
            ..EngineConfig::default()
        });
        let coach = Coach::new(
            Arc::new(engine),
            Arc::new(OfflineGenerator),
            Duration::from_secs(1),
        );
        router(Arc::new(Session::new(Game::new(), coach)))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> Value {
        post_raw(app, uri, body.to_string()).await
    }

    async fn post_raw(app: Router, uri: &str, body: String) -> Value {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_move_endpoint() {
        let body = post_json(app(), "/move", json!({ "move_uci": "e2e4" })).await;

        assert_eq!(body["success"], true);
        assert_eq!(
            body["fen"],
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn test_move_endpoint_rejects_missing_move() {
        let body = post_json(app(), "/move", json!({})).await;

        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No move provided.");
        assert_eq!(
            body["fen"],
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[tokio::test]
    async fn test_move_endpoint_rejects_unreadable_body() {
        let bodies = [json!({ "move_uci": 5 }).to_string(), "not json".to_string()];
        for raw in bodies {
            let body = post_raw(app(), "/move", raw).await;

            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "An internal error occurred.");
            assert_eq!(
                body["fen"],
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            );
        }
    }

    #[tokio::test]
    async fn test_ask_endpoint_rejects_unreadable_body() {
        let bodies = [json!({ "query": ["a", "b"] }).to_string(), "{".to_string()];
        for raw in bodies {
            let body = post_raw(app(), "/ask", raw).await;

            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Failed to get advice from the coach.");
            assert!(body.get("advice").is_none());
        }
    }

    #[tokio::test]
    async fn test_ask_endpoint_answers_with_everything_offline() {
        let body = post_json(app(), "/ask", json!({ "query": "What should I do?" })).await;

        assert_eq!(body["success"], true);
        let advice = body["advice"].as_str().unwrap();
        assert!(advice.contains("analysis is not available"));
    }

    #[tokio::test]
    async fn test_ask_endpoint_rejects_missing_query() {
        let body = post_json(app(), "/ask", json!({ "query": "" })).await;

        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No query provided.");
    }

    #[tokio::test]
    async fn test_state_and_health() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::get("/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["turn"], "White");
        assert_eq!(body["game_over"], false);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
