//! API 라우트 정의.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 호출 가능 연산
        .route(
            "/recordPerformance",
            post(handlers::callables::record_performance),
        )
        .route("/recordError", post(handlers::callables::record_error))
        .route(
            "/sendAlertEmail",
            post(handlers::callables::send_alert_email),
        )
        .route(
            "/sendSlackAlert",
            post(handlers::callables::send_slack_alert),
        )
        // 조회
        .route("/alerts", get(handlers::alerts::list_alerts))
        .route("/health", get(handlers::health::health))
}

#[cfg(test)]
mod tests {
    use crate::build_router;
    use crate::testing::{test_state, GOOD_TOKEN};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn perf_body(load_time: f64) -> Value {
        json!({"route": "/decks", "loadTime": load_time, "metricType": "pageLoad"})
    }

    #[tokio::test]
    async fn record_performance_requires_token() {
        let (state, _) = test_state();
        let app = build_router(state);

        let (status, body) = call(&app, post("/api/recordPerformance", None, perf_body(100.0))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Authentification requise", "status": 401}));

        let (status, _) = call(
            &app,
            post("/api/recordPerformance", Some("forged"), perf_body(100.0)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn record_performance_succeeds_with_token() {
        let (state, _) = test_state();
        let app = build_router(state);

        let (status, body) = call(
            &app,
            post("/api/recordPerformance", Some(GOOD_TOKEN), perf_body(2500.0)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
    }

    #[tokio::test]
    async fn record_error_allows_anonymous() {
        let (state, _) = test_state();
        let app = build_router(state);

        let (status, body) = call(
            &app,
            post(
                "/api/recordError",
                None,
                json!({"message": "image introuvable", "stack": "at img.ts:3"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (state, _) = test_state();
        let app = build_router(state);

        let (status, body) = call(
            &app,
            post("/api/recordPerformance", Some(GOOD_TOKEN), json!({"route": "/x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn slack_alert_posts_to_route_channel() {
        let (state, outbox) = test_state();
        let app = build_router(state);

        let (status, _) = call(
            &app,
            post(
                "/api/sendSlackAlert",
                Some(GOOD_TOKEN),
                json!({"type": "trading", "message": "offre expirée", "metadata": {"trend": "hausse"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let chat = outbox.chat.lock().unwrap();
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].0, "pokemon-tcg-trading");
        assert!(chat[0].1.contains("hausse"));
    }

    #[tokio::test]
    async fn unknown_alert_type_is_internal_error() {
        let (state, outbox) = test_state();
        let app = build_router(state);

        let (status, body) = call(
            &app,
            post(
                "/api/sendAlertEmail",
                Some(GOOD_TOKEN),
                json!({"type": "marketing", "message": "x"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Erreur lors de l'envoi de l'email");
        assert!(outbox.email.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn alerts_list_returns_created_alerts() {
        let (state, _) = test_state();
        let app = build_router(state);

        call(
            &app,
            post("/api/recordPerformance", Some(GOOD_TOKEN), perf_body(9000.0)),
        )
        .await;

        let unauth = Request::get("/api/alerts").body(Body::empty()).unwrap();
        assert_eq!(call(&app, unauth).await.0, StatusCode::UNAUTHORIZED);

        let request = Request::get("/api/alerts?limit=5")
            .header(header::AUTHORIZATION, format!("Bearer {GOOD_TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let alerts = body.as_array().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0]["type"], "performance");
        assert_eq!(alerts[0]["severity"], "critical");
    }

    #[tokio::test]
    async fn health_is_public() {
        let (state, _) = test_state();
        let app = build_router(state);

        let request = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
