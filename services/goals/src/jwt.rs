//! Signed session tokens
//!
//! Sessions are HS256 JWTs keyed with the configured session secret. The
//! claims carry the logged-in user and the queued flash notices; `exp`
//! bounds how long a session cookie stays valid.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error,
};
use serde::{Deserialize, Serialize};

use crate::session::{Flash, SessionData};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Logged-in user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
    /// Pending notices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds,
        }
    }

    /// Sign a session
    pub fn sign(&self, session: &SessionData) -> Result<String, Error> {
        self.sign_at(session, Utc::now().timestamp().max(0) as u64)
    }

    fn sign_at(&self, session: &SessionData, issued_at: u64) -> Result<String, Error> {
        let claims = Claims {
            uid: session.user_id,
            flashes: session.flashes.clone(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_seconds),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Validate a token and return the session it carries
    pub fn verify(&self, token: &str) -> Result<SessionData, Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        Ok(SessionData {
            user_id: token_data.claims.uid,
            flashes: token_data.claims.flashes,
        })
    }
}
