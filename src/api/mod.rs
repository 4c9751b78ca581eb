// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! HTTP API: route table, middleware stack and OpenAPI document.
//!
//! Every request passes the authentication gate (identity extraction, never
//! rejects) and then the access policy (the rejection point) before reaching
//! a handler.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{gate, identity::CurrentUser, policy, roles::Role},
    state::AppState,
    storage::UserSummary,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod oauth;
pub mod upload;
pub mod visitor;

pub fn router(state: AppState) -> Router {
    let uploads_dir = state.storage().paths().uploads_dir();

    let routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/auth/logout", post(auth::logout))
        .route("/oauth2/authorization/google", get(oauth::authorize_google))
        .route("/login/oauth2/code/google", get(oauth::google_callback))
        .route("/admin/stats", get(admin::get_system_stats))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/clear-data", delete(admin::clear_data))
        .route("/visitor/track", post(visitor::track_visitor))
        .route("/visitor/stats", get(visitor::visitor_stats))
        .route("/upload/image", post(upload::upload_image))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        // Applied bottom-up: the gate (outermost) establishes the identity,
        // the policy then decides whether the route needs it.
        .layer(middleware::from_fn_with_state(state.clone(), policy::enforce))
        .layer(middleware::from_fn_with_state(state.clone(), gate::authenticate))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::get_profile,
        auth::update_profile,
        auth::logout,
        oauth::authorize_google,
        oauth::google_callback,
        admin::get_system_stats,
        admin::list_users,
        admin::clear_data,
        visitor::track_visitor,
        visitor::visitor_stats,
        upload::upload_image,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Role,
            CurrentUser,
            UserSummary,
            auth::RegisterRequest,
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::ProfileResponse,
            auth::UpdateProfileRequest,
            auth::LogoutResponse,
            admin::SystemStatsResponse,
            admin::AdminUserListResponse,
            admin::ClearDataResponse,
            visitor::TrackResponse,
            visitor::VisitorStatsResponse,
            upload::UploadResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and profile"),
        (name = "OAuth", description = "Google sign-in"),
        (name = "Admin", description = "Administrative tooling"),
        (name = "Visitors", description = "Visitor statistics"),
        (name = "Uploads", description = "Image upload"),
        (name = "Health", description = "Probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{seed_user, seed_user_with_role, test_state};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _temp) = test_state();
        let app = router(state);
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn public_routes_need_no_identity() {
        let (state, _temp) = test_state();
        let app = router(state);

        let response = app
            .oneshot(Request::get("/visitor/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_request_without_token_gets_structured_401() {
        let (state, _temp) = test_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::get("/auth/profile")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "Authentication required");
    }

    #[tokio::test]
    async fn browser_request_without_token_is_redirected_to_oauth() {
        let (state, _temp) = test_state();
        let app = router(state);

        let response = app
            .oneshot(Request::get("/auth/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/oauth2/authorization/google"
        );
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_requiring_auth() {
        let (state, _temp) = test_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::get("/definitely/not/a/route")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_route_rejects_public_role_allows_root() {
        let (state, _temp) = test_state();
        seed_user(&state, 1, "pleb@example.com");
        seed_user_with_role(&state, 2, "root@example.com", Role::Root);

        let public_token = state.tokens().issue("pleb@example.com").unwrap();
        let root_token = state.tokens().issue("root@example.com").unwrap();
        let app = router(state);

        let forbidden = app
            .clone()
            .oneshot(
                Request::get("/admin/stats")
                    .header(header::AUTHORIZATION, format!("Bearer {public_token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let allowed = app
            .oneshot(
                Request::get("/admin/stats")
                    .header(header::AUTHORIZATION, format!("Bearer {root_token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_login_profile_flow_over_http() {
        let (state, _temp) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(
                Request::post("/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email":"flow@example.com","password":"password123","firstName":"Flo","lastName":"W"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::post("/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"email":"flow@example.com","password":"password123"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let token = body["token"].as_str().unwrap().to_string();
        assert!(!token.is_empty());

        let response = app
            .oneshot(
                Request::get("/auth/profile")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["user"]["email"], "flow@example.com");
    }

    #[tokio::test]
    async fn expired_token_is_anonymous_hence_401() {
        let (state, _temp) = test_state();
        seed_user(&state, 1, "expired@example.com");

        // Signed with the right secret but long past expiry
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
        let claims = crate::auth::token::Claims {
            sub: "expired@example.com".to_string(),
            iat: 1_600_000_000,
            exp: 1_600_001_800,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-at-least-32-bytes-long!"),
        )
        .unwrap();

        let app = router(state);
        let response = app
            .oneshot(
                Request::get("/auth/profile")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_then_fetch_static_file() {
        let (state, _temp) = test_state();
        seed_user(&state, 1, "uploader@example.com");
        let token = state.tokens().issue("uploader@example.com").unwrap();
        let app = router(state);

        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"pic.png\"\r\nContent-Type: image/png\r\n\r\nnot-a-real-png\r\n--{boundary}--\r\n"
        );

        let response = app
            .clone()
            .oneshot(
                Request::post("/upload/image")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let image_url = body["imageUrl"].as_str().unwrap().to_string();
        assert!(image_url.starts_with("/uploads/"));

        let response = app
            .oneshot(Request::get(image_url.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
