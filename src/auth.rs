//! Password hashing, bearer tokens, and the request extractors that gate
//! the authenticated route groups.

use argon2::Argon2;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::ApiError;
use crate::types::Role;

/// Lifetime of an issued bearer token.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Hash a password with argon2id and a fresh salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash. A malformed stored hash
/// counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Generate a 64-hex-char password-reset token from 32 random bytes.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// JWT claims carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id (employee or admin).
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for an authenticated identity.
    pub fn issue(&self, id: &str, email: &str, role: Role) -> anyhow::Result<String> {
        let claims = Claims {
            sub: id.to_string(),
            email: email.to_string(),
            role,
            exp: chrono::Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Decode and validate a token, including its expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::invalid_token())
    }
}

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header. Extraction fails with 401 when the header is missing or the
/// token does not verify.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(ApiError::missing_token)?;

        let claims = state.keys.verify(token)?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// An authenticated caller that must hold the admin role. Extraction fails
/// with 403 for any other role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn reset_tokens_are_long_and_distinct() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn issued_token_verifies_with_same_keys() {
        let keys = AuthKeys::new("test-secret");
        let token = keys
            .issue("emp-1", "e@example.com", Role::Employee)
            .unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "emp-1");
        assert_eq!(claims.email, "e@example.com");
        assert_eq!(claims.role, Role::Employee);
    }

    #[test]
    fn token_fails_with_different_secret() {
        let keys = AuthKeys::new("secret-a");
        let other = AuthKeys::new("secret-b");
        let token = keys.issue("emp-1", "e@example.com", Role::Admin).unwrap();

        assert!(other.verify(&token).is_err());
    }
}
