//! Request pipeline.
//!
//! A [`Pipeline`] is an ordered list of [`Gate`]s run before the handler. The
//! first failing gate short-circuits with its error response; gates that pass
//! may enrich the request extensions for later gates and the handler.
//!
//! ```text
//! request ─▶ BearerAuthGate ─▶ ActiveAccountGate | RoleGate(allowed) ─▶ handler
//!              │ SubjectContext   │ AccountContext
//!              └─ 401             └─ 401 / 403
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use lostfound_auth::{Role, TokenService, TokenVerifier, require_role};
use lostfound_core::UserId;
use lostfound_infra::UserStore;

use crate::app::errors::ApiError;
use crate::context::{AccountContext, SubjectContext};

#[async_trait::async_trait]
pub trait Gate: Send + Sync {
    async fn check(&self, req: &mut Request<Body>) -> Result<(), ApiError>;
}

#[derive(Clone, Default)]
pub struct Pipeline {
    gates: Vec<Arc<dyn Gate>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    pub async fn run(&self, req: &mut Request<Body>) -> Result<(), ApiError> {
        for gate in &self.gates {
            gate.check(req).await?;
        }
        Ok(())
    }
}

/// Axum adapter: `from_fn_with_state(pipeline, pipeline_middleware)`.
pub async fn pipeline_middleware(State(pipeline): State<Pipeline>, mut req: Request<Body>, next: Next) -> Response {
    if let Err(err) = pipeline.run(&mut req).await {
        return err.into_response();
    }
    next.run(req).await
}

/// Verifies the bearer token and injects [`SubjectContext`].
#[derive(Clone)]
pub struct BearerAuthGate {
    tokens: Arc<dyn TokenVerifier>,
}

impl BearerAuthGate {
    pub fn new(tokens: Arc<dyn TokenVerifier>) -> Self {
        Self { tokens }
    }
}

#[async_trait::async_trait]
impl Gate for BearerAuthGate {
    async fn check(&self, req: &mut Request<Body>) -> Result<(), ApiError> {
        let token = extract_bearer(req.headers())?;

        let claims = self.tokens.verify(token).map_err(|kind| {
            // Unverified payload, for the log line only.
            let hint = TokenService::decode_unsafe(token).map(|c| c.id.to_string());
            tracing::info!(reason = kind.code(), subject_hint = ?hint, "token rejected");
            ApiError::Token(kind)
        })?;

        req.extensions_mut().insert(SubjectContext::new(claims.subject()));
        Ok(())
    }
}

/// Fresh account lookup by the token subject; banned or deactivated accounts
/// are refused even with an unexpired token. Must run after [`BearerAuthGate`].
#[derive(Clone)]
pub struct ActiveAccountGate {
    users: Arc<dyn UserStore>,
}

impl ActiveAccountGate {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl Gate for ActiveAccountGate {
    async fn check(&self, req: &mut Request<Body>) -> Result<(), ApiError> {
        // `Body` is not `Sync`: keep the request borrow out of the await.
        let user_id = subject_id(req)?;
        let account = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(ApiError::UnknownAccount)?;

        if !account.is_enabled() {
            tracing::info!(user_id = %account.id, "disabled account rejected");
            return Err(ApiError::AccountDisabled);
        }

        req.extensions_mut().insert(AccountContext::new(account));
        Ok(())
    }
}

/// Fresh account lookup by the token subject, then a role check against the
/// stored record. Must run after [`BearerAuthGate`].
#[derive(Clone)]
pub struct RoleGate {
    users: Arc<dyn UserStore>,
    allowed: &'static [Role],
}

impl RoleGate {
    pub fn new(users: Arc<dyn UserStore>, allowed: &'static [Role]) -> Self {
        Self { users, allowed }
    }
}

#[async_trait::async_trait]
impl Gate for RoleGate {
    async fn check(&self, req: &mut Request<Body>) -> Result<(), ApiError> {
        let user_id = subject_id(req)?;
        let account = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| ApiError::forbidden("account not found"))?;

        if let Err(denied) = require_role(&account, self.allowed) {
            tracing::warn!(user_id = %account.id, reason = %denied, "role gate denied request");
            return Err(denied.into());
        }

        req.extensions_mut().insert(AccountContext::new(account));
        Ok(())
    }
}

fn subject_id(req: &Request<Body>) -> Result<UserId, ApiError> {
    req.extensions()
        .get::<SubjectContext>()
        .map(SubjectContext::user_id)
        .ok_or(ApiError::MissingToken)
}

pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(ApiError::MissingToken)?;

    let header = header.to_str().map_err(|_| ApiError::MissingToken)?;

    let header = header.strip_prefix("Bearer ").ok_or(ApiError::MissingToken)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }

    Ok(token)
}
