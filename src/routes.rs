//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  Set Request ID  │ ← x-request-id (UUIDv4) if the client sent none
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Body Limit     │ ← 413 if exceeded
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler       ← procedure extractor runs the guards
//! ```
//!
//! The request id is copied back onto the response.
//!
//! # Route Groups
//!
//! | Route | Procedure |
//! |---|---|
//! | `/health`, `/ready`, `/auth/*` | none |
//! | `GET /users/me`, `GET /users/me/usage` | protected |
//! | `GET /dreams`, `GET /dreams/{id}`, `GET /reflections` | protected |
//! | `POST /dreams`, `PATCH`/`DELETE /dreams/{id}` | write |
//! | `POST /reflections` | usage_limited |
//! | `POST /dreams/{id}/evolution` | premium |
//! | `/admin/users`, `/admin/users/{id}/tier` | creator |

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let cors = build_cors_layer(&config.cors_allowed_origins);

    let mut router = Router::new()
        // Health (public)
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // Accounts (public)
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/signin", post(handlers::signin))
        .route("/auth/demo", post(handlers::demo))
        // Current user
        .route("/users/me", get(handlers::me))
        .route("/users/me/usage", get(handlers::usage))
        // Dreams
        .route(
            "/dreams",
            get(handlers::list_dreams).post(handlers::create_dream),
        )
        .route(
            "/dreams/{id}",
            get(handlers::get_dream)
                .patch(handlers::update_dream)
                .delete(handlers::delete_dream),
        )
        .route("/dreams/{id}/evolution", post(handlers::evolution_report))
        // Reflections
        .route(
            "/reflections",
            get(handlers::list_reflections).post(handlers::create_reflection),
        )
        // Administration
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/users/{id}/tier", patch(handlers::update_tier));

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    info!(
        max_size_kb = config.max_request_body_size / 1024,
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));
    router = router.layer(cors);
    router = router.layer(PropagateRequestIdLayer::x_request_id());
    router = router.layer(TraceLayer::new_for_http());
    router = router.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    router.with_state(state)
}

/// Build CORS layer from configuration.
///
/// `["*"]` allows any origin. Convenient for development; list explicit
/// origins in production.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    fn router() -> Router {
        build_router(AppState::new(Config::default()).unwrap())
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_build_cors_layer_specific_origins() {
        let origins = vec![
            "https://mirrorofdreams.app".to_string(),
            "not a valid origin\n".to_string(),
        ];
        // Unparseable origins are dropped rather than failing the build
        let _layer = build_cors_layer(&origins);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = router()
            .oneshot(request(Method::GET, "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_guarded_routes_reject_anonymous_callers() {
        for (method, uri) in [
            (Method::GET, "/users/me"),
            (Method::GET, "/dreams"),
            (Method::GET, "/reflections"),
            (Method::POST, "/reflections"),
            (Method::DELETE, "/dreams/00000000-0000-0000-0000-000000000000"),
            (
                Method::POST,
                "/dreams/00000000-0000-0000-0000-000000000000/evolution",
            ),
            (Method::GET, "/admin/users"),
        ] {
            let response = router().oneshot(request(method, uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/auth/signup")
                    .header("content-type", "application/json")
                    .body(Body::from("{"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "BAD_REQUEST");
        assert_eq!(body["message"], "Malformed JSON in request body");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let config = Config {
            max_request_body_size: 64,
            ..Config::default()
        };
        let payload = format!(r#"{{"email":"{}@example.com"}}"#, "a".repeat(128));
        let response = build_router(AppState::new(config).unwrap())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/auth/signin")
                    .header("content-type", "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_request_id_is_set_on_response() {
        let response = router()
            .oneshot(request(Method::GET, "/health"))
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));

        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "client-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "client-supplied");
    }
}
