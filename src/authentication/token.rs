use crate::domain::{Role, UserId};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("The token has expired.")]
    Expired,
    #[error("The token is invalid.")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("Failed to sign the token.")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies HS256 bearer tokens.
///
/// Tokens are never stored: a token is valid while its signature checks out
/// and its expiry is in the future. There is no revocation.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &Secret<String>, ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, TokenError> {
        self.issue_at(user_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Expiry is checked here, against `now`, with no leeway.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(TokenError::Invalid)?
            .claims;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
