//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, token service, password hasher, claims workflow
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Extension, Router};

use lostfound_auth::{Role, TokenVerifier};

use crate::middleware::{ActiveAccountGate, BearerAuthGate, Pipeline, RoleGate, pipeline_middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Each route group gets its own gate pipeline via `route_layer`, so
/// unmatched paths still fall through to a plain 404.
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let tokens: Arc<dyn TokenVerifier> = Arc::new(services.tokens.clone());
    let authenticated = Pipeline::new()
        .gate(BearerAuthGate::new(tokens.clone()))
        .gate(ActiveAccountGate::new(services.users.clone()));
    let role_gated = |allowed: &'static [Role]| {
        Pipeline::new()
            .gate(BearerAuthGate::new(tokens.clone()))
            .gate(RoleGate::new(services.users.clone(), allowed))
    };

    let admin_context = role_gated(Role::ADMIN_CONTEXT);
    let moderation = role_gated(Role::MODERATION);
    let user_management = role_gated(Role::USER_MANAGEMENT);

    Router::new()
        .merge(routes::public())
        .merge(routes::authenticated().route_layer(from_fn_with_state(authenticated, pipeline_middleware)))
        .merge(routes::admin_context().route_layer(from_fn_with_state(admin_context, pipeline_middleware)))
        .merge(routes::moderation().route_layer(from_fn_with_state(moderation, pipeline_middleware)))
        .merge(
            routes::user_management().route_layer(from_fn_with_state(user_management, pipeline_middleware)),
        )
        .layer(Extension(services))
}
