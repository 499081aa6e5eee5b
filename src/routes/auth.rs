use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
    routing::post,
};

use crate::{
    dto::auth::{
        AuthResponse, LoginRequest, PasswordResetConfirm, PasswordResetRequest,
        PasswordResetRequestResponse, RegisterRequest,
    },
    error::AppResult,
    middleware::auth::{REFRESH_COOKIE_NAME, SESSION_COOKIE_NAME, build_auth_cookie},
    response::ApiResponse,
    services::auth_service,
    state::AppState,
    token::REFRESH_TOKEN_HOURS,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/password-reset/request", post(request_password_reset))
        .route("/password-reset/confirm", post(reset_password))
}

/// Client address and device fingerprint from the forwarding headers; both
/// feed the session row.
pub fn client_meta(headers: &HeaderMap) -> (String, String) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .unwrap_or("")
        .to_string();

    let device = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    (ip, device)
}

fn set_session_cookies(response: &mut Response, refresh_token: &str, session_id: &str) {
    let max_age = REFRESH_TOKEN_HOURS * 3600;
    for cookie in [
        build_auth_cookie(REFRESH_COOKIE_NAME, refresh_token, max_age),
        build_auth_cookie(SESSION_COOKIE_NAME, session_id, max_age),
    ] {
        if let Ok(value) = cookie.parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Register user", body = ApiResponse<AuthResponse>),
        (status = 409, description = "Email already taken"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Response> {
    let (ip, device) = client_meta(&headers);
    let resp = auth_service::register_user(&state, payload, &ip, &device).await?;

    let refresh_token = resp.data.as_ref().map(|d| d.refresh_token.clone());
    let session_id = resp.data.as_ref().map(|d| d.session.id.to_string());

    let mut response = Json(resp).into_response();
    if let (Some(token), Some(session)) = (refresh_token, session_id) {
        set_session_cookies(&mut response, &token, &session);
    }
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Response> {
    let (ip, device) = client_meta(&headers);
    let resp = auth_service::login_user(&state, payload, &ip, &device).await?;

    let refresh_token = resp.data.as_ref().map(|d| d.refresh_token.clone());
    let session_id = resp.data.as_ref().map(|d| d.session.id.to_string());

    let mut response = Json(resp).into_response();
    if let (Some(token), Some(session)) = (refresh_token, session_id) {
        set_session_cookies(&mut response, &token, &session);
    }
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/request",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset token issued when the account exists", body = ApiResponse<PasswordResetRequestResponse>),
    ),
    tag = "Auth"
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> AppResult<Json<ApiResponse<PasswordResetRequestResponse>>> {
    let resp = auth_service::request_password_reset(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/confirm",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Invalid or expired reset token"),
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::reset_password(&state, payload).await?;
    Ok(Json(resp))
}
