//! Short-lived EdDSA bearer tokens for the QWeather API.
//!
//! QWeather authenticates every request with a JWT signed by the project's
//! Ed25519 key. Tokens are minted per request and never reused.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{CLOCK_SKEW_SECS, TOKEN_TTL_SECS};

/// Signing algorithm required by QWeather (Ed25519 keys)
const JWT_ALGORITHM: Algorithm = Algorithm::EdDSA;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("failed to parse Ed25519 private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("system clock is before the Unix epoch")]
    Clock,
}

/// JWT payload sent to QWeather
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Project id
    pub sub: String,
    /// Issued at, already shifted back by the clock-skew allowance
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

impl Claims {
    fn issued_at(subject: &str, now: u64) -> Self {
        let iat = now.saturating_sub(CLOCK_SKEW_SECS);
        Self {
            sub: subject.to_string(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
        }
    }
}

/// Key material used to mint bearer tokens
#[derive(Clone)]
pub struct Credentials {
    private_key_pem: String,
    key_id: String,
    project_id: String,
}

impl Credentials {
    /// Literal `\n` sequences in the PEM are turned into newlines, so a key
    /// passed on a single command line still parses.
    pub fn new(
        private_key_pem: impl Into<String>,
        key_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            private_key_pem: private_key_pem.into().replace("\\n", "\n"),
            key_id: key_id.into(),
            project_id: project_id.into(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Mints a fresh token stamped with the current time.
    pub fn mint(&self) -> Result<String, SigningError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| SigningError::Clock)?
            .as_secs();
        self.mint_at(now)
    }

    /// Mints a token as if the current time were `now` (Unix seconds).
    ///
    /// The key is parsed on every call; nothing is cached between tokens.
    pub fn mint_at(&self, now: u64) -> Result<String, SigningError> {
        let key = EncodingKey::from_ed_pem(self.private_key_pem.as_bytes())
            .map_err(SigningError::InvalidKey)?;

        let mut header = Header::new(JWT_ALGORITHM);
        header.kid = Some(self.key_id.clone());

        let claims = Claims::issued_at(&self.project_id, now);
        encode(&header, &claims, &key).map_err(SigningError::Encode)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key_pem", &"<redacted>")
            .field("key_id", &self.key_id)
            .field("project_id", &self.project_id)
            .finish()
    }
}
