use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum JwtError {
    #[error("token encode failed")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("token decode/validation failed")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

/// Session claims. The same token backs the browser session cookie and
/// `Authorization: Bearer` API access.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Claims {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

#[derive(Clone)]
pub(crate) struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl JwtService {
    const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;
    const LEEWAY_SECONDS: u64 = 10;

    pub(crate) fn new(secret: &str, ttl_seconds: i64) -> Self {
        let ttl_seconds = if ttl_seconds > 0 {
            ttl_seconds
        } else {
            Self::DEFAULT_TTL_SECONDS
        };

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub(crate) fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub(crate) fn generate_token(&self, user_id: i64, username: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            username: username.into(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encode)
    }

    pub(crate) fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = Self::LEEWAY_SECONDS;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::Decode)
    }
}
