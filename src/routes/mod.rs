use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

mod evaluate;
mod health;

pub use health::health;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/evaluate", get(evaluate::routes::evaluate))
        .layer(CorsLayer::permissive())
}

async fn root() -> &'static str {
    "Flag evaluation service"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, CacheStore};
    use crate::engine::Engine;
    use crate::evaluation::{FlagConfig, TargetingRule};
    use crate::events::AuditEmitter;
    use crate::sources::{FetchError, FlagSources};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    // Cache that is always empty and never stores
    struct NullCache;

    #[async_trait]
    impl CacheStore for NullCache {
        async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
            Ok(None)
        }
        async fn set(&self, _: &str, _: String, _: Duration) -> Result<(), CacheError> {
            Ok(())
        }
    }

    enum Script {
        Found(bool),
        Missing,
        Down,
    }

    struct ScriptedSources(Script);

    #[async_trait]
    impl FlagSources for ScriptedSources {
        async fn fetch_flag(&self, name: &str) -> Result<FlagConfig, FetchError> {
            match self.0 {
                Script::Found(enabled) => Ok(FlagConfig {
                    name: name.to_string(),
                    description: String::new(),
                    enabled,
                }),
                Script::Missing => Err(FetchError::NotFound(name.to_string())),
                Script::Down => Err(FetchError::Status(StatusCode::SERVICE_UNAVAILABLE)),
            }
        }
        async fn fetch_rule(&self, name: &str) -> Result<TargetingRule, FetchError> {
            Err(FetchError::NotFound(name.to_string()))
        }
    }

    fn app_with(script: Script) -> Router {
        let engine = Engine::new(Arc::new(ScriptedSources(script)), Arc::new(NullCache));
        let emitter = AuditEmitter::spawn(None);
        routes().with_state(AppState { engine, emitter })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = app_with(Script::Found(true))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_evaluate_enabled_flag() {
        let response = app_with(Script::Found(true))
            .oneshot(
                Request::get("/evaluate?user_id=user1&flag_name=my_flag")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["flag_name"], "my_flag");
        assert_eq!(body["user_id"], "user1");
        assert_eq!(body["result"], true);
    }

    #[tokio::test]
    async fn test_evaluate_unknown_flag_is_false_not_an_error() {
        let response = app_with(Script::Missing)
            .oneshot(
                Request::get("/evaluate?user_id=user1&flag_name=ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["result"], false);
    }

    #[tokio::test]
    async fn test_evaluate_unreachable_source_is_a_gateway_error() {
        let response = app_with(Script::Down)
            .oneshot(
                Request::get("/evaluate?user_id=user1&flag_name=my_flag")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_evaluate_missing_params_is_a_client_error() {
        let response = app_with(Script::Found(true))
            .oneshot(
                Request::get("/evaluate?user_id=user1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app_with(Script::Found(true))
            .oneshot(
                Request::get("/evaluate?user_id=&flag_name=my_flag")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
