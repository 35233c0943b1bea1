//! Route groups. Each group is mounted behind its own gate pipeline in
//! [`crate::app::build_app`], so paths must not overlap between groups.

use axum::{routing::get, Router};

pub mod admin;
pub mod auth;
pub mod claims;
pub mod items;
pub mod system;

/// No gates.
pub fn public() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(auth::public_router())
}

/// Bearer token plus an enabled stored account.
pub fn authenticated() -> Router {
    Router::new()
        .merge(auth::router())
        .nest("/claims", claims::router())
        .nest("/items", items::router())
}

/// Bearer token plus an admin-context role on the stored account.
pub fn admin_context() -> Router {
    admin::admin_context_router()
}

pub fn moderation() -> Router {
    admin::moderation_router()
}

pub fn user_management() -> Router {
    admin::user_management_router()
}
