//! HS256 token issuance and verification.
//!
//! Verification never panics: every failure is reported as one of the four
//! [`TokenError`] kinds.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use crate::{JwtClaims, Subject, TokenValidationError, validate_claims};

/// Default session lifetime: 7 days.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Upper bound accepted for a configured TTL (one year).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Why a token was refused.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token payload has an invalid shape")]
    InvalidPayloadShape,
}

impl TokenError {
    /// Stable machine-readable code for API responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "token_malformed",
            TokenError::Expired => "token_expired",
            TokenError::BadSignature => "token_bad_signature",
            TokenError::InvalidPayloadShape => "token_invalid_payload",
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct SigningError(String);

/// Verification half of the token service, object-safe for injection.
pub trait TokenVerifier: Send + Sync {
    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;

    fn verify(&self, token: &str) -> Result<JwtClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }
}

/// Stateless HS256 token service keyed by a process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        // Expiry is checked by `validate_claims` against an injectable clock,
        // so the library's own clock-based checks stay off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn with_default_ttl(secret: &[u8]) -> Self {
        Self::new(secret, Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &Subject) -> Result<String, SigningError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &Subject, now: DateTime<Utc>) -> Result<String, SigningError> {
        let claims = JwtClaims::for_subject(subject, now, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SigningError(e.to_string()))
    }

    /// Decode the payload without checking signature or expiry.
    ///
    /// For display/inspection only. Never authorize on the result.
    pub fn decode_unsafe(token: &str) -> Option<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<JwtClaims>(token.trim(), &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims)
    }
}

impl TokenVerifier for TokenService {
    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let token = token.trim();
        if token.split('.').count() != 3 || token.split('.').any(str::is_empty) {
            return Err(TokenError::Malformed);
        }
        // A readable header is a precondition; after this point JSON failures
        // can only come from the payload.
        if jsonwebtoken::decode_header(token).is_err() {
            return Err(TokenError::Malformed);
        }

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| map_jwt_error(e.kind()))?;

        validate_claims(&data.claims, now).map_err(|e| match e {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                TokenError::InvalidPayloadShape
            }
        })?;

        Ok(data.claims)
    }
}

fn map_jwt_error(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => TokenError::InvalidPayloadShape,
        _ => TokenError::Malformed,
    }
}
