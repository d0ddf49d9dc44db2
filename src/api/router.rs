use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::{
    logging_middleware, metrics_middleware, origin_headers_middleware,
    security_headers_middleware, MAX_BODY_SIZE,
};
use super::state::AppState;
use super::v1;

/// Build the full router
pub fn create_router(state: AppState) -> Router {
    let v1 = v1::create_v1_router()
        .route_layer(from_fn_with_state(state.clone(), origin_headers_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route("/metrics", get(health::metrics))
        .nest("/v1", v1)
        .nest("/admin", admin::create_admin_router())
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(logging_middleware))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Duration;
    use tower::ServiceExt;

    use crate::domain::credentials::SecretValue;
    use crate::domain::generation::mock::MockGenerationProvider;
    use crate::domain::generation::GenerationOutput;
    use crate::domain::rate_limit::RateLimitPolicy;
    use crate::domain::tenant::{
        ClubAiMode, ClubAiSettings, ClubId, OrganizationAiMode, OrganizationAiSettings,
        OrganizationId,
    };
    use crate::infrastructure::auth::{JwtService, SessionClaims};
    use crate::infrastructure::credentials::CredentialResolver;
    use crate::infrastructure::gateway::{GatewayService, ModelDefaults, OriginPolicy};
    use crate::infrastructure::rate_limit::RateLimiter;
    use crate::infrastructure::tenant::{InMemorySettingsRepository, SettingsService};
    use crate::infrastructure::usage::{InMemoryUsageLog, UsageRecorder};
    use crate::infrastructure::vault::SecretVault;

    const SESSION_SECRET: &str = "session-secret";
    const ADMIN_TOKEN: &str = "admin-token";
    const APP_ORIGIN: &str = "https://app.clubhub.io";

    struct TestApp {
        router: Router,
        provider: Arc<MockGenerationProvider>,
    }

    fn app_with(provider: MockGenerationProvider, caller_max: u32) -> TestApp {
        let vault = Arc::new(SecretVault::new(&[9u8; 32]).unwrap());
        let org = OrganizationId::new("org-1").unwrap();
        let settings = Arc::new(InMemorySettingsRepository::with_rows(
            vec![
                OrganizationAiSettings::new(org.clone(), OrganizationAiMode::Managed),
                OrganizationAiSettings::new(
                    OrganizationId::new("org-2").unwrap(),
                    OrganizationAiMode::Managed,
                ),
            ],
            vec![ClubAiSettings::new(
                ClubId::new("club-1").unwrap(),
                org,
                ClubAiMode::Inherit,
            )],
        ));
        let resolver = CredentialResolver::new(
            settings.clone(),
            vault.clone(),
            Some(SecretValue::new("sk-platform")),
        );
        let provider = Arc::new(provider);
        let origins = OriginPolicy::new(
            APP_ORIGIN,
            vec!["http://localhost:5173".to_string()],
            Some(r"https://clubhub-[a-z0-9-]+\.vercel\.app"),
        )
        .unwrap();

        let gateway = GatewayService::new(
            Arc::new(origins),
            RateLimiter::default(),
            RateLimitPolicy::new("caller", 60_000, caller_max),
            RateLimitPolicy::new("tenant", 60_000, 100),
            resolver,
            provider.clone(),
            UsageRecorder::new(Arc::new(InMemoryUsageLog::default())),
            ModelDefaults {
                text: "text-model".to_string(),
                image: "image-model".to_string(),
            },
        );

        let state = AppState::new(gateway, SettingsService::new(settings, vault))
            .with_jwt(JwtService::new(SESSION_SECRET).unwrap())
            .with_admin_token(SecretValue::new(ADMIN_TOKEN));

        TestApp {
            router: create_router(state),
            provider,
        }
    }

    fn app() -> TestApp {
        app_with(
            MockGenerationProvider::new().with_output(GenerationOutput::text("Match preview")),
            10,
        )
    }

    fn generate_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/v1/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, APP_ORIGIN)
            .header("x-forwarded-for", "203.0.113.5")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn text_body() -> serde_json::Value {
        serde_json::json!({
            "organization_id": "org-1",
            "club_id": "club-1",
            "kind": "text",
            "prompt": "Write a match preview"
        })
    }

    fn session_token(org: Option<&str>) -> String {
        JwtService::new(SESSION_SECRET)
            .unwrap()
            .issue(&SessionClaims::new("user-1", org.map(str::to_string), Duration::hours(1)))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(json_body(response).await["status"], "healthy");

        let response = app
            .router
            .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_generate_success() {
        let app = app();

        let response = app.router.oneshot(generate_request(text_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], APP_ORIGIN);
        assert_eq!(headers[header::VARY], "Origin");
        assert_eq!(headers["x-ratelimit-limit"], "10");
        assert_eq!(headers["x-ratelimit-remaining"], "9");
        assert!(headers.contains_key("x-ratelimit-reset"));
        assert!(!headers.contains_key(header::RETRY_AFTER));

        let body = json_body(response).await;
        assert_eq!(body["text"], "Match preview");
        assert_eq!(body["provenance"], "platform_default");
        assert_eq!(app.provider.seen_keys(), vec!["sk-platform".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_origin_gets_canonical() {
        let app = app();
        let mut request = generate_request(text_body());
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://evil.example".parse().unwrap());

        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], APP_ORIGIN);
    }

    #[tokio::test]
    async fn test_preview_origin_is_echoed() {
        let app = app();
        let mut request = generate_request(text_body());
        request.headers_mut().insert(
            header::ORIGIN,
            "https://clubhub-git-kits.vercel.app".parse().unwrap(),
        );

        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://clubhub-git-kits.vercel.app"
        );
    }

    #[tokio::test]
    async fn test_preflight() {
        let app = app();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/v1/generate")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let app = app_with(
            MockGenerationProvider::new().with_output(GenerationOutput::text("ok")),
            1,
        );

        let first = app.router.clone().oneshot(generate_request(text_body())).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.router.oneshot(generate_request(text_body())).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers()["x-ratelimit-remaining"], "0");
        let retry_after: u64 = second.headers()[header::RETRY_AFTER]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(retry_after >= 1);
        assert_eq!(
            second.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            APP_ORIGIN
        );

        let body = json_body(second).await;
        assert_eq!(body["error"]["type"], "rate_limit_error");
        assert_eq!(app.provider.seen_keys().len(), 1);
    }

    #[tokio::test]
    async fn test_cross_tenant_club_rejected() {
        let app = app();
        let mut body = text_body();
        body["organization_id"] = serde_json::json!("org-2");

        let response = app.router.oneshot(generate_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(app.provider.seen_keys().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_body_keeps_cors_headers() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, APP_ORIGIN)
            .body(Body::from("{\"prompt\": 1"))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();

        assert!(response.status().is_client_error());
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], APP_ORIGIN);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "9");
        assert_eq!(json_body(response).await["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let app = app();
        let mut body = text_body();
        body["prompt"] = serde_json::json!("");

        let response = app.router.oneshot(generate_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_session_token_is_401() {
        let app = app();
        let mut request = generate_request(text_body());
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer not-a-jwt".parse().unwrap());

        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "9");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], APP_ORIGIN);
    }

    #[tokio::test]
    async fn test_rejected_requests_consume_caller_slots() {
        let app = app_with(
            MockGenerationProvider::new().with_output(GenerationOutput::text("ok")),
            3,
        );
        let bearer = format!("Bearer {}", session_token(None));
        let with_auth = |mut request: Request<Body>, value: &str| {
            request
                .headers_mut()
                .insert(header::AUTHORIZATION, value.parse().unwrap());
            request
        };

        let forged = with_auth(generate_request(text_body()), "Bearer garbage");
        let response = app.router.clone().oneshot(forged).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "2");

        let mut bad_org = text_body();
        bad_org["organization_id"] = serde_json::json!("org/1");
        let response = app
            .router
            .clone()
            .oneshot(with_auth(generate_request(bad_org), &bearer))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "1");

        let malformed = Request::builder()
            .method(Method::POST)
            .uri("/v1/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.5")
            .body(Body::from("{"))
            .unwrap();
        let response = app
            .router
            .clone()
            .oneshot(with_auth(malformed, &bearer))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

        let response = app
            .router
            .oneshot(with_auth(generate_request(text_body()), &bearer))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert!(app.provider.seen_keys().is_empty());
    }

    #[tokio::test]
    async fn test_session_scoped_to_other_organization() {
        let app = app();
        let mut request = generate_request(text_body());
        let token = format!("Bearer {}", session_token(Some("org-2")));
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, token.parse().unwrap());

        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(app.provider.seen_keys().is_empty());
    }

    #[tokio::test]
    async fn test_valid_session_is_accepted() {
        let app = app();
        let mut request = generate_request(text_body());
        let token = format!("Bearer {}", session_token(Some("org-1")));
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, token.parse().unwrap());

        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upstream_status_is_propagated() {
        let app = app_with(
            MockGenerationProvider::new().with_error(Some(503), "overloaded"),
            10,
        );

        let response = app.router.oneshot(generate_request(text_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
        assert_eq!(json_body(response).await["error"]["type"], "upstream_error");
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let app = app();
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/admin/ai-settings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({
                    "scope": "organization",
                    "organization_id": "org-1",
                    "mode": "byok",
                    "api_key": "sk-org"
                })
                .to_string(),
            ))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_sets_key_then_generation_uses_it() {
        let app = app();
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/admin/ai-settings")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-admin-token", ADMIN_TOKEN)
            .body(Body::from(
                serde_json::json!({
                    "scope": "organization",
                    "organization_id": "org-1",
                    "mode": "byok",
                    "api_key": "sk-org-secret"
                })
                .to_string(),
            ))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("sk-org-secret"));
        let summary: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(summary["mode"], "byok");
        assert_eq!(summary["has_api_key"], true);

        let response = app.router.oneshot(generate_request(text_body())).await.unwrap();
        assert_eq!(json_body(response).await["provenance"], "org_override");
        assert_eq!(app.provider.seen_keys(), vec!["sk-org-secret".to_string()]);
    }

    #[tokio::test]
    async fn test_admin_unknown_scope() {
        let app = app();
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/admin/ai-settings")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-admin-token", ADMIN_TOKEN)
            .body(Body::from(
                serde_json::json!({
                    "scope": "team",
                    "organization_id": "org-1",
                    "mode": "byok"
                })
                .to_string(),
            ))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let app = app();

        let response = app
            .router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
