use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, ProfileResponse, RegisterRequest},
        extractors::AuthUser,
        services,
    },
    error::ApiError,
    extract::Json,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let out = services::register(&state, payload).await?;
    info!(user_id = %out.user.id, email = %out.user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user: out.user,
            token: out.token,
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let out = services::login(&state, payload).await?;
    info!(user_id = %out.user.id, email = %out.user.email, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        user: out.user,
        token: out.token,
        message: "Login successful".into(),
    }))
}

#[instrument(skip(state))]
async fn profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = services::get_by_id(&state, claims.sub)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(ProfileResponse {
        success: true,
        user,
    }))
}

/// Server-side no-op: tokens are stateless, so the presented token
/// remains valid until expiry. Clients drop their cached copy.
#[instrument(skip_all)]
async fn logout(AuthUser(claims): AuthUser) -> Json<MessageResponse> {
    info!(user_id = %claims.sub, "user logged out");
    Json(MessageResponse {
        success: true,
        message: "Logged out successfully".into(),
    })
}

#[cfg(test)]
mod router_tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use time::OffsetDateTime;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{
        app::build_app,
        auth::jwt::{JwtKeys, TOKEN_TTL},
        state::AppState,
    };

    // AppState::fake carries a lazily connecting pool; every path
    // exercised here fails or succeeds before any query runs.

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret")
    }

    fn get(path: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(path: &str, body: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_owned())).unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let app = build_app(AppState::fake());
        let resp = app.oneshot(get("/api/health", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn profile_without_token_is_401() {
        let app = build_app(AppState::fake());
        let resp = app.oneshot(get("/api/auth/profile", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn profile_with_garbage_token_is_403() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(get("/api/auth/profile", Some("not.a.jwt")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn profile_with_wrong_secret_token_is_403() {
        let app = build_app(AppState::fake());
        let forged = JwtKeys::new("attacker-secret")
            .sign(Uuid::new_v4(), "a@b.com", "a")
            .unwrap();
        let resp = app
            .oneshot(get("/api/auth/profile", Some(&forged)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn profile_with_expired_token_is_401() {
        let app = build_app(AppState::fake());
        let issued = OffsetDateTime::now_utc() - TOKEN_TTL - time::Duration::seconds(1);
        let expired = keys()
            .sign_at(Uuid::new_v4(), "a@b.com", "a", issued)
            .unwrap();
        let resp = app
            .oneshot(get("/api/auth/profile", Some(&expired)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_with_valid_token_succeeds_without_store() {
        let app = build_app(AppState::fake());
        let token = keys().sign(Uuid::new_v4(), "alice@x.com", "Alice").unwrap();
        let resp = app
            .oneshot(post_json("/api/auth/logout", "", Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn logout_without_token_is_401() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(post_json("/api/auth/logout", "", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_with_short_password_is_400() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(post_json(
                "/api/auth/register",
                r#"{"name":"Alice","email":"alice@x.com","password":"12345"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Password must be at least 6 characters long");
    }

    #[tokio::test]
    async fn register_with_blank_fields_is_400() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(post_json(
                "/api/auth/register",
                r#"{"name":"","email":"","password":""}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_with_missing_field_is_400_with_envelope() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(post_json(
                "/api/auth/register",
                r#"{"email":"alice@x.com","password":"secret1"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn register_with_malformed_body_is_400() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(post_json("/api/auth/register", "{not json", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_with_missing_field_is_400() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email":"alice@x.com"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn register_with_invalid_email_is_400() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(post_json(
                "/api/auth/register",
                r#"{"name":"Alice","email":"not-an-email","password":"secret1"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_with_blank_fields_is_400() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"email":"","password":""}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
