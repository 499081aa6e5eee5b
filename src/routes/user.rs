use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::auth::{
        RefreshTokenRequest, RefreshTokenResponse, ResendVerificationResponse,
        RevokeSessionRequest, SessionList, VerifyEmailParams, VerifyEmailResponse,
    },
    error::{AppError, AppResult},
    middleware::auth::{
        AuthUser, REFRESH_COOKIE_NAME, SESSION_COOKIE_NAME, build_clear_cookie,
        extract_cookie_value,
    },
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/sessions", get(list_sessions))
        .route("/revoke-session", post(revoke_session))
        .route("/verify-email", get(verify_email))
        .route("/resend-verification", post(resend_verification))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| extract_cookie_value(header, name))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/profile",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<serde_json::Value>),
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    let resp = auth_service::logout(&state, &user).await?;

    let mut response = Json(resp).into_response();
    for cookie in [
        build_clear_cookie(REFRESH_COOKIE_NAME),
        build_clear_cookie(SESSION_COOKIE_NAME),
    ] {
        if let Ok(value) = cookie.parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/user/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = ApiResponse<RefreshTokenResponse>),
        (status = 401, description = "Invalid session or refresh token"),
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    _user: AuthUser,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<Json<ApiResponse<RefreshTokenResponse>>> {
    let session_id = cookie_value(&headers, SESSION_COOKIE_NAME)
        .and_then(|v| Uuid::parse_str(&v).ok())
        .ok_or_else(|| AppError::Auth("No session found".into()))?;

    let presented = payload
        .refresh_token
        .or_else(|| cookie_value(&headers, REFRESH_COOKIE_NAME))
        .ok_or_else(|| AppError::Auth("No refresh token found".into()))?;

    let resp = auth_service::refresh_token(&state, session_id, &presented).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/sessions",
    responses(
        (status = 200, description = "Sessions for the current user", body = ApiResponse<SessionList>),
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SessionList>>> {
    let resp = auth_service::list_sessions(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/revoke-session",
    request_body = RevokeSessionRequest,
    responses(
        (status = 200, description = "Session revoked", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Session not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn revoke_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RevokeSessionRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::revoke_session(&state, &user, payload.session_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/verify-email",
    params(VerifyEmailParams),
    responses(
        (status = 200, description = "Email verified", body = ApiResponse<VerifyEmailResponse>),
        (status = 401, description = "Invalid or expired verification token"),
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<VerifyEmailParams>,
) -> AppResult<Json<ApiResponse<VerifyEmailResponse>>> {
    let resp = auth_service::verify_email(&state, params).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/resend-verification",
    responses(
        (status = 200, description = "Verification code issued", body = ApiResponse<ResendVerificationResponse>),
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn resend_verification(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ResendVerificationResponse>>> {
    let resp = auth_service::resend_verification(&state, &user).await?;
    Ok(Json(resp))
}
