use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::Session;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session row without its tokens, safe to echo to the client.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfo {
    pub id: Uuid,
    pub device_info: String,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            device_info: session.device_info.clone(),
            ip_address: session.ip_address.clone(),
            created_at: session.created_at,
            last_activity_at: session.last_activity_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub access_token: String,
    pub refresh_token: String,
    pub session: SessionInfo,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RefreshTokenRequest {
    /// Falls back to the `refresh_token` cookie when absent.
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RevokeSessionRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionList {
    pub sessions: Vec<SessionInfo>,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct VerifyEmailParams {
    pub token: String,
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyEmailResponse {
    pub success: bool,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResendVerificationResponse {
    pub verification_token: String,
    pub verify_code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PasswordResetRequestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}
