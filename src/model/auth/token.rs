use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::principal::{PrincipalId, Role};

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
}

/// The claim set carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    pub subject: PrincipalId,
    pub email: String,
    pub role: Role,
    #[serde(rename = "iat", with = "ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256-signed, time-bounded tokens with a single
/// process-wide secret. Replacing the secret invalidates every token issued
/// under the old one.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `verify` itself, without leeway.
        validation.validate_exp = false;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// The lifetime given to tokens by [`Self::issue`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token with the default lifetime.
    pub fn issue(&self, subject: PrincipalId, email: &str, role: Role) -> String {
        self.issue_with_ttl(subject, email, role, self.ttl)
    }

    /// Issue a token that expires `ttl` from now.
    pub fn issue_with_ttl(
        &self,
        subject: PrincipalId,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> String {
        let issued_at = Utc::now();
        let claims = Claims {
            subject,
            email: email.to_string(),
            role,
            issued_at,
            expires_at: issued_at + ttl,
        };
        // Infallible: HS256 over claims that always serialise.
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key).unwrap()
    }

    /// Check the signature and expiry of a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::InvalidToken)?
            .claims;
        if Utc::now() >= claims.expires_at {
            return Err(TokenError::TokenExpired);
        }
        Ok(claims)
    }
}
