use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const ACCESS_TOKEN_HOURS: i64 = 24;
pub const REFRESH_TOKEN_HOURS: i64 = 24 * 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_email_verified: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth("Invalid user id in token".into()))
    }
}

/// Stateless token issuer. Built once from the configured secret and shared
/// through `AppState`; independent of storage.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn sign(&self, user: &crate::models::User, ttl_hours: i64) -> AppResult<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(Duration::hours(ttl_hours))
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            is_email_verified: user.is_email_verified,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub fn sign_access(&self, user: &crate::models::User) -> AppResult<String> {
        self.sign(user, ACCESS_TOKEN_HOURS)
    }

    pub fn sign_refresh(&self, user: &crate::models::User) -> AppResult<String> {
        self.sign(user, REFRESH_TOKEN_HOURS)
    }

    /// Mint a fresh access token from already-verified claims (cookie-based
    /// re-auth path).
    pub fn resign_access(&self, claims: &Claims) -> AppResult<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(Duration::hours(ACCESS_TOKEN_HOURS))
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let fresh = Claims {
            iat: now.timestamp(),
            exp: exp.timestamp(),
            ..claims.clone()
        };

        encode(&Header::default(), &fresh, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::Auth("Invalid or expired token".into()))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> crate::models::User {
        crate::models::User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "x".into(),
            picture: None,
            role: "user".into(),
            is_active: true,
            is_email_verified: false,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let keys = TokenKeys::new("test-secret");
        let user = test_user();
        let token = keys.sign_access(&user).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email, user.email);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let user = test_user();
        let token = TokenKeys::new("secret-a").sign_access(&user).unwrap();
        assert!(TokenKeys::new("secret-b").verify(&token).is_err());
    }
}
