use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use password_hash::rand_core::OsRng;
use rand::Rng;
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{
        AuthResponse, LoginRequest, PasswordResetConfirm, PasswordResetRequest,
        PasswordResetRequestResponse, RefreshTokenResponse, RegisterRequest,
        ResendVerificationResponse, SessionInfo, SessionList, VerifyEmailParams,
        VerifyEmailResponse,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Session, User},
    response::ApiResponse,
    state::AppState,
};

/// Single-use token discriminator; one convention at insert and verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    EmailVerification,
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::EmailVerification => "email_verification",
            TokenKind::PasswordReset => "password_reset",
        }
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_verify_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

/// One active session per (user, device); a repeat login from the same device
/// refreshes the existing row in place.
async fn upsert_session(
    state: &AppState,
    user_id: Uuid,
    access_token: &str,
    refresh_token: &str,
    ip_address: &str,
    device_info: &str,
) -> AppResult<Session> {
    let session: Session = sqlx::query_as(
        r#"
        INSERT INTO sessions (
            id, user_id, access_token, refresh_token,
            ip_address, device_info, is_active, expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, TRUE, NOW() + INTERVAL '7 days')
        ON CONFLICT (user_id, device_info) DO UPDATE
        SET access_token = EXCLUDED.access_token,
            refresh_token = EXCLUDED.refresh_token,
            ip_address = EXCLUDED.ip_address,
            is_active = TRUE,
            expires_at = EXCLUDED.expires_at,
            last_activity_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(access_token)
    .bind(refresh_token)
    .bind(ip_address)
    .bind(device_info)
    .fetch_one(&state.pool)
    .await?;
    Ok(session)
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
    ip_address: &str,
    device_info: &str,
) -> AppResult<ApiResponse<AuthResponse>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, 'user')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.as_str())
    .bind(payload.email.as_str())
    .bind(password_hash)
    .fetch_one(&state.pool)
    .await?;

    let access_token = state.keys.sign_access(&user)?;
    let refresh_token = state.keys.sign_refresh(&user)?;
    let session = upsert_session(
        state,
        user.id,
        &access_token,
        &refresh_token,
        ip_address,
        device_info,
    )
    .await?;

    if let Err(err) = audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let resp = AuthResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        access_token,
        refresh_token,
        session: SessionInfo::from(&session),
    };

    Ok(ApiResponse::success("Created user successfully", resp, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
    ip_address: &str,
    device_info: &str,
) -> AppResult<ApiResponse<AuthResponse>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    // No email-vs-password distinction in the failure.
    let user = user.ok_or_else(|| AppError::Auth("Invalid email or password".into()))?;
    if !verify_password(&user.password_hash, &payload.password)? {
        return Err(AppError::Auth("Invalid email or password".into()));
    }

    let access_token = state.keys.sign_access(&user)?;
    let refresh_token = state.keys.sign_refresh(&user)?;
    let session = upsert_session(
        state,
        user.id,
        &access_token,
        &refresh_token,
        ip_address,
        device_info,
    )
    .await?;

    if let Err(err) = sqlx::query(
        "UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1",
    )
    .bind(user.id)
    .execute(&state.pool)
    .await
    {
        tracing::warn!(error = %err, "failed to update last login");
    }

    if let Err(err) = audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "session_id": session.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let resp = AuthResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        access_token,
        refresh_token,
        session: SessionInfo::from(&session),
    };

    Ok(ApiResponse::success("Logged in", resp, None))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let profile: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;
    let profile = profile.ok_or(AppError::NotFound("user"))?;
    Ok(ApiResponse::success(
        "User retrieved successfully",
        profile,
        None,
    ))
}

pub async fn logout(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    sqlx::query("DELETE FROM sessions WHERE access_token = $1 AND user_id = $2")
        .bind(user.token.as_str())
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({ "success": true }),
        None,
    ))
}

/// The presented refresh token must equal the stored one for the session;
/// a mismatch is a hard failure, never a retry.
pub async fn refresh_token(
    state: &AppState,
    session_id: Uuid,
    presented: &str,
) -> AppResult<ApiResponse<RefreshTokenResponse>> {
    let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
        .bind(session_id)
        .fetch_optional(&state.pool)
        .await?;
    let session = session.ok_or_else(|| AppError::Auth("Invalid session".into()))?;

    if session.refresh_token != presented {
        return Err(AppError::Auth("Invalid refresh token".into()));
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(session.user_id)
        .fetch_optional(&state.pool)
        .await?;
    let user = user.ok_or(AppError::NotFound("user"))?;

    let access_token = state.keys.sign_access(&user)?;
    sqlx::query("UPDATE sessions SET access_token = $1, last_activity_at = NOW() WHERE id = $2")
        .bind(access_token.as_str())
        .bind(session.id)
        .execute(&state.pool)
        .await?;

    let resp = RefreshTokenResponse {
        access_token,
        refresh_token: presented.to_string(),
        expires_at: Utc::now() + Duration::hours(crate::token::ACCESS_TOKEN_HOURS),
    };

    Ok(ApiResponse::success("Token refreshed", resp, None))
}

pub async fn list_sessions(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SessionList>> {
    let sessions: Vec<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE user_id = $1 ORDER BY last_activity_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let sessions = sessions.iter().map(SessionInfo::from).collect();
    Ok(ApiResponse::success("OK", SessionList { sessions }, None))
}

pub async fn revoke_session(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND user_id = $2")
        .bind(session_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("session"));
    }

    Ok(ApiResponse::success(
        "Session revoked",
        serde_json::json!({ "success": true }),
        None,
    ))
}

/// Issues a fresh email-verification code. Delivery is out of scope: the code
/// is logged and echoed, as the original response already did.
pub async fn resend_verification(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ResendVerificationResponse>> {
    let verify_code = generate_verify_code();
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::hours(1);

    sqlx::query(
        r#"
        INSERT INTO verification_tokens (token, user_id, verify_code, token_type, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(token.as_str())
    .bind(user.user_id)
    .bind(verify_code.as_str())
    .bind(TokenKind::EmailVerification.as_str())
    .bind(expires_at)
    .execute(&state.pool)
    .await?;

    tracing::info!(user_id = %user.user_id, code = %verify_code, "verification code issued");

    let resp = ResendVerificationResponse {
        verification_token: token,
        verify_code,
        expires_at,
    };
    Ok(ApiResponse::success("Verification code issued", resp, None))
}

/// Consumes the token exactly once: the user flag and the used flag flip in
/// the same transaction.
pub async fn verify_email(
    state: &AppState,
    params: VerifyEmailParams,
) -> AppResult<ApiResponse<VerifyEmailResponse>> {
    let mut tx = state.pool.begin().await?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT user_id
        FROM verification_tokens
        WHERE token = $1
          AND verify_code = $2
          AND token_type = $3
          AND is_used = FALSE
          AND expires_at > NOW()
        FOR UPDATE
        "#,
    )
    .bind(params.token.as_str())
    .bind(params.code.as_str())
    .bind(TokenKind::EmailVerification.as_str())
    .fetch_optional(&mut *tx)
    .await?;
    let (user_id,) =
        row.ok_or_else(|| AppError::Auth("Invalid or expired verification token".into()))?;

    sqlx::query("UPDATE users SET is_email_verified = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE verification_tokens SET is_used = TRUE WHERE token = $1")
        .bind(params.token.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(ApiResponse::success(
        "Email verified successfully",
        VerifyEmailResponse {
            success: true,
            user_id,
        },
        None,
    ))
}

/// Unknown emails report `success: false` without an error.
pub async fn request_password_reset(
    state: &AppState,
    payload: PasswordResetRequest,
) -> AppResult<ApiResponse<PasswordResetRequestResponse>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let Some(user) = user else {
        return Ok(ApiResponse::success(
            "Password reset requested",
            PasswordResetRequestResponse {
                success: false,
                reset_token: None,
                expires_at: None,
            },
            None,
        ));
    };

    let reset_token = state.keys.sign(&user, 1)?;
    let expires_at = Utc::now() + Duration::hours(1);

    sqlx::query(
        r#"
        INSERT INTO verification_tokens (token, user_id, token_type, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(reset_token.as_str())
    .bind(user.id)
    .bind(TokenKind::PasswordReset.as_str())
    .bind(expires_at)
    .execute(&state.pool)
    .await?;

    tracing::info!(user_id = %user.id, "password reset token issued");

    Ok(ApiResponse::success(
        "Password reset requested",
        PasswordResetRequestResponse {
            success: true,
            reset_token: Some(reset_token),
            expires_at: Some(expires_at),
        },
        None,
    ))
}

pub async fn reset_password(
    state: &AppState,
    payload: PasswordResetConfirm,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.new_password.is_empty() {
        return Err(AppError::Validation("new password is required".to_string()));
    }

    let mut tx = state.pool.begin().await?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT user_id
        FROM verification_tokens
        WHERE token = $1
          AND token_type = $2
          AND is_used = FALSE
          AND expires_at > NOW()
        FOR UPDATE
        "#,
    )
    .bind(payload.token.as_str())
    .bind(TokenKind::PasswordReset.as_str())
    .fetch_optional(&mut *tx)
    .await?;
    let (user_id,) = row.ok_or_else(|| AppError::Auth("Invalid or expired reset token".into()))?;

    let password_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE verification_tokens SET is_used = TRUE WHERE token = $1")
        .bind(payload.token.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if let Err(err) = audit::record(
        &state.pool,
        Some(user_id),
        "password_reset",
        Some("users"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Password successfully reset",
        serde_json::json!({ "success": true }),
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password(&hash, "hunter2").unwrap());
        assert!(!verify_password(&hash, "hunter3").unwrap());
    }

    #[test]
    fn verify_code_is_six_digits() {
        for _ in 0..32 {
            let code = generate_verify_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn token_kinds_use_one_convention() {
        assert_eq!(TokenKind::EmailVerification.as_str(), "email_verification");
        assert_eq!(TokenKind::PasswordReset.as_str(), "password_reset");
    }
}
