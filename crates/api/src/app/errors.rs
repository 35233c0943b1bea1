//! Error taxonomy of the HTTP surface.
//!
//! | kind | status | codes |
//! |------|--------|-------|
//! | unauthenticated | 401 | `missing_token`, `token_*`, `invalid_credentials`, `unknown_account` |
//! | forbidden | 403 | `forbidden`, `account_disabled` |
//! | not found | 404 | `not_found` |
//! | validation | 400 | `validation_error`, `invariant_violation`, claim workflow codes |
//! | conflict | 409 | `email_taken` |
//! | internal | 500 | `internal_error` |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use lostfound_auth::{AuthzError, PasswordError, TokenError};
use lostfound_claims::ClaimError;
use lostfound_core::DomainError;
use lostfound_infra::{StoreError, WorkflowError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("{0}")]
    Token(TokenError),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account no longer exists")]
    UnknownAccount,

    #[error("account is deactivated or banned")]
    AccountDisabled,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvariantViolation(String),

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error(transparent)]
    Claim(#[from] ClaimError),

    /// Detail is logged, never returned to the client.
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(detail: impl core::fmt::Display) -> Self {
        Self::Internal(detail.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken
            | ApiError::Token(_)
            | ApiError::InvalidCredentials
            | ApiError::UnknownAccount => StatusCode::UNAUTHORIZED,
            ApiError::AccountDisabled | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::InvariantViolation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Claim(e) => claim_status(e),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingToken => "missing_token",
            ApiError::Token(kind) => kind.code(),
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::UnknownAccount => "unknown_account",
            ApiError::AccountDisabled => "account_disabled",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::InvariantViolation(_) => "invariant_violation",
            ApiError::Conflict { code, .. } => *code,
            ApiError::Claim(e) => e.code(),
            ApiError::Internal(_) => "internal_error",
        }
    }
}

/// Claim workflow conflicts are reported as 400 on the HTTP surface.
fn claim_status(err: &ClaimError) -> StatusCode {
    match err {
        ClaimError::ItemNotFound | ClaimError::ClaimNotFound => StatusCode::NOT_FOUND,
        ClaimError::Forbidden => StatusCode::FORBIDDEN,
        ClaimError::NoLongerAvailable
        | ClaimError::CannotClaimOwn
        | ClaimError::AlreadyClaimed
        | ClaimError::NotPending
        | ClaimError::Validation(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }
        json_error(self.status(), self.code(), self.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::Claim(e) => ApiError::Claim(e),
            WorkflowError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::internal(value)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::Validation(msg),
            DomainError::InvariantViolation(msg) => ApiError::InvariantViolation(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::AccountDisabled => ApiError::AccountDisabled,
            other => ApiError::forbidden(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(value: PasswordError) -> Self {
        ApiError::internal(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Validation(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::Validation(value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        ApiError::Validation(value.body_text())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path identifier, reporting a 400 on garbage.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}
