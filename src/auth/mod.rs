use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::access::Identity;

pub const JWT_SECRET_ENV_VAR: &str = "JWT_SECRET";

/// Session claims issued by the login flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub access: String,
    pub company: String,
    #[serde(default)]
    pub store: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, access: &str, company: &str, store: Option<&str>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            user_id,
            access: access.to_string(),
            company: company.to_string(),
            store: store.map(str::to_string),
            exp,
            iat: now.timestamp(),
        }
    }

    /// Decode the raw claim strings into a typed identity
    pub fn into_identity(self) -> Identity {
        Identity::from_session(self.user_id, Some(&self.access), &self.company, self.store.as_deref())
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Missing JWT secret: {0} is not set")]
    MissingSecret(&'static str),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// Signing and verification keys, built once from the configured secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn from_env() -> Result<Self, JwtError> {
        let secret = std::env::var(JWT_SECRET_ENV_VAR)
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(JwtError::MissingSecret(JWT_SECRET_ENV_VAR))?;
        Ok(Self::new(secret.as_bytes()))
    }

    pub fn generate(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}
