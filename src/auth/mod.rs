use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHasher, SaltString,
    },
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::Role;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Which table the token subject lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub kind: PrincipalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(sub: Uuid, kind: PrincipalKind, role: Option<Role>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            kind,
            role,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn for_admin(admin_id: Uuid) -> Self {
        Self::new(admin_id, PrincipalKind::Admin, None)
    }

    pub fn for_user(user_id: Uuid, role: Role) -> Self {
        Self::new(user_id, PrincipalKind::User, Some(role))
    }
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    encode_jwt(claims, &config::config().security.jwt_secret)
}

pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    decode_jwt(token, &config::config().security.jwt_secret)
}

pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// False for a wrong password and for an unparseable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Password reset token: the raw value goes to the account owner, only the digest is stored.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub token: String,
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        let minutes = config::config().security.password_reset_expiry_minutes;
        Self {
            digest: digest_reset_token(&token),
            token,
            expires_at: now + Duration::minutes(minutes),
        }
    }

    pub fn link(&self, client_url: &str) -> String {
        format!("{}/reset-password/{}", client_url.trim_end_matches('/'), self.token)
    }
}

pub fn digest_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Counts failed sign-ins and locks the account once the threshold is hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockoutPolicy {
    pub max_attempts: i32,
    pub lockout: Duration,
}

impl LockoutPolicy {
    pub fn from_config() -> Self {
        let security = &config::config().security;
        Self {
            max_attempts: security.max_login_attempts,
            lockout: Duration::minutes(security.lockout_minutes),
        }
    }

    /// When a lock taken at `now` runs out.
    pub fn lock_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lockout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn jwt_round_trip() {
        let id = Uuid::new_v4();
        let claims = Claims {
            sub: id,
            kind: PrincipalKind::User,
            role: Some(Role::Manager),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = encode_jwt(&claims, SECRET).unwrap();
        let decoded = decode_jwt(&token, SECRET).unwrap();
        assert_eq!(decoded, claims);

        assert!(matches!(decode_jwt(&token, "other-secret"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(encode_jwt(&claims, ""), Err(AuthError::MissingSecret)));
    }

    #[test]
    fn expired_jwt_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            kind: PrincipalKind::Admin,
            role: None,
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iat: (Utc::now() - Duration::hours(3)).timestamp(),
        };
        let token = encode_jwt(&claims, SECRET).unwrap();
        assert!(decode_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("Campus#2024").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Campus#2024", &hash));
        assert!(!verify_password("campus#2024", &hash));
        assert!(!verify_password("Campus#2024", "not-a-hash"));
    }

    #[test]
    fn reset_token_digest_is_stable() {
        let token = ResetToken::generate(Utc::now());
        assert_eq!(token.token.len(), 64);
        assert_eq!(token.digest, digest_reset_token(&token.token));
        assert_ne!(token.digest, token.token);
        assert_eq!(
            ResetToken { token: "abc".into(), digest: String::new(), expires_at: Utc::now() }.link("http://localhost:3000/"),
            "http://localhost:3000/reset-password/abc"
        );
    }

    #[test]
    fn lock_lasts_the_configured_window() {
        let policy = LockoutPolicy { max_attempts: 5, lockout: Duration::minutes(120) };
        let now = Utc::now();
        assert_eq!(policy.lock_expiry(now), now + Duration::minutes(120));
    }
}
