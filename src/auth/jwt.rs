//! JWT token handling
//!
//! Tokens embed the user id, username and role claim and are signed with a
//! symmetric key (HMAC-SHA256). There is no refresh or revocation mechanism:
//! a changed `is_admin` flag only takes effect once the holder's current
//! token expires and a new one is issued.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Role claim value for administrators.
pub const ROLE_ADMIN: &str = "Admin";
/// Role claim value for regular users.
pub const ROLE_USER: &str = "User";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in days
    pub expiration_days: i64,
    /// Issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "super-secret-key-change-in-production".to_string(),
            expiration_days: 7,
            issuer: "user-api".to_string(),
        }
    }
}

/// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Username
    pub username: String,
    /// Role claim ("Admin" or "User")
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    /// Create new claims for a user
    pub fn new(user_id: &str, username: &str, is_admin: bool, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::days(config.expiration_days);

        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: if is_admin { ROLE_ADMIN } else { ROLE_USER }.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Check if the role claim grants admin access
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Create a JWT token for a user
pub fn create_token(
    user_id: &str,
    username: &str,
    is_admin: bool,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(user_id, username, is_admin, config);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify and decode a JWT token
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}
