use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{error::AppError, state::AppState, token::Claims};

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";
pub const SESSION_COOKIE_NAME: &str = "session";
pub const NEW_ACCESS_TOKEN_HEADER: &str = "new-access-token";

/// Authenticated caller, injected into request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_email_verified: bool,
    /// The access token this request authenticated with (logout deletes the
    /// session row by it).
    pub token: String,
}

impl AuthUser {
    fn from_claims(claims: &Claims, token: String) -> Result<Self, AppError> {
        Ok(Self {
            user_id: claims.user_id()?,
            name: claims.name.clone(),
            email: claims.email.clone(),
            role: claims.role.clone(),
            is_email_verified: claims.is_email_verified,
            token,
        })
    }
}

/// Gate for `/api/v1` routes: accepts a bearer access token, falling back to
/// the refresh-token cookie. The cookie path mints a fresh access token and
/// returns it in the `New-Access-Token` response header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // An invalid or expired bearer token falls through to the cookie path.
    if let Some(token) = bearer_token(&request) {
        if let Ok(claims) = state.keys.verify(&token) {
            let user = AuthUser::from_claims(&claims, token)?;
            request.extensions_mut().insert(user);
            return Ok(next.run(request).await);
        }
    }

    let cookie_header = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Auth("No valid tokens found".into()))?;

    let refresh_token = extract_cookie_value(&cookie_header, REFRESH_COOKIE_NAME)
        .ok_or_else(|| AppError::Auth("No valid tokens found".into()))?;

    let claims = state
        .keys
        .verify(&refresh_token)
        .map_err(|_| AppError::Auth("Invalid refresh token".into()))?;

    let new_access_token = state.keys.resign_access(&claims)?;
    let user = AuthUser::from_claims(&claims, new_access_token.clone())?;
    request.extensions_mut().insert(user);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&new_access_token) {
        response
            .headers_mut()
            .insert(NEW_ACCESS_TOKEN_HEADER, value);
    }
    Ok(response)
}

fn bearer_token(request: &Request) -> Option<String> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Auth("Missing authentication".into()))
    }
}

pub fn extract_cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        (key == name).then(|| value.to_string())
    })
}

pub fn build_auth_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!("{name}={value}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax")
}

pub fn build_clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_is_extracted_by_name() {
        let header = "session=abc123; refresh_token=tok.en.val; theme=dark";
        assert_eq!(
            extract_cookie_value(header, REFRESH_COOKIE_NAME).as_deref(),
            Some("tok.en.val")
        );
        assert_eq!(
            extract_cookie_value(header, SESSION_COOKIE_NAME).as_deref(),
            Some("abc123")
        );
        assert!(extract_cookie_value(header, "missing").is_none());
    }

    #[test]
    fn auth_cookie_is_http_only() {
        let cookie = build_auth_cookie(REFRESH_COOKIE_NAME, "tok", 3600);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(build_clear_cookie(SESSION_COOKIE_NAME).contains("Max-Age=0"));
    }
}
