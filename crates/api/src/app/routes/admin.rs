//! Admin surface. Every handler here runs behind a `RoleGate`, so the
//! caller's freshly loaded account is available as [`AccountContext`].

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use lostfound_auth::permissions::{REPORTS_READ, USERS_BAN, USERS_READ};
use lostfound_auth::{Role, UserAccount, UserProfile, permissions_for_role, require_permission};
use lostfound_core::UserId;

use crate::app::dto::{AdminVerifyResponse, ReportsSummary, RoleChangeRequest};
use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;
use crate::context::AccountContext;

pub fn admin_context_router() -> Router {
    Router::new()
        .route("/admin/auth/verify", get(verify))
        .route("/admin/reports/summary", get(reports_summary))
}

pub fn moderation_router() -> Router {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/ban", post(ban_user))
        .route("/admin/users/:id/unban", post(unban_user))
}

pub fn user_management_router() -> Router {
    Router::new()
        .route("/admin/users/:id/role", patch(change_role))
        .route("/admin/users/:id/deactivate", post(deactivate_user))
        .route("/admin/users/:id/activate", post(activate_user))
}

pub async fn verify(Extension(account): Extension<AccountContext>) -> Result<Response, ApiError> {
    let account = account.account();
    let permissions = permissions_for_role(account.role);
    Ok(Json(AdminVerifyResponse::new(account.profile(), &permissions)).into_response())
}

pub async fn reports_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
) -> Result<Response, ApiError> {
    require_permission(account.account(), &REPORTS_READ)?;

    let users = services.users.count_users().await?;
    let lost = services.items.count_lost_items().await?;
    let found = services.items.count_found_items().await?;
    let claims = services.claim_store.count_claims().await?;
    Ok(Json(ReportsSummary::new(users, lost, found, claims)).into_response())
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
) -> Result<Response, ApiError> {
    require_permission(account.account(), &USERS_READ)?;

    let users = services
        .users
        .list_users()
        .await?
        .iter()
        .map(UserProfile::from)
        .collect::<Vec<_>>();
    Ok(Json(json!({ "users": users })).into_response())
}

pub async fn ban_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    set_banned(&services, &account, &id, true).await
}

pub async fn unban_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    set_banned(&services, &account, &id, false).await
}

pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let role: Role = body
        .role
        .parse()
        .map_err(|e: lostfound_auth::roles::UnknownRole| ApiError::validation(e.to_string()))?;

    let mut target = load_user(&services, &id).await?;
    target.change_role(account.user_id(), role, Utc::now())?;
    services.users.update_user(&target).await?;
    tracing::info!(user_id = %target.id, actor_id = %account.user_id(), role = %role, "role changed");
    Ok(Json(json!({ "user": target.profile() })).into_response())
}

pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    set_active(&services, &account, &id, false).await
}

pub async fn activate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(account): Extension<AccountContext>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    set_active(&services, &account, &id, true).await
}

async fn set_banned(
    services: &AppServices,
    account: &AccountContext,
    raw_id: &str,
    banned: bool,
) -> Result<Response, ApiError> {
    require_permission(account.account(), &USERS_BAN)?;

    let mut target = load_user(services, raw_id).await?;
    target.set_banned(account.user_id(), banned, Utc::now())?;
    services.users.update_user(&target).await?;
    tracing::info!(user_id = %target.id, actor_id = %account.user_id(), banned, "ban status changed");
    Ok(Json(json!({ "user": target.profile() })).into_response())
}

async fn set_active(
    services: &AppServices,
    account: &AccountContext,
    raw_id: &str,
    active: bool,
) -> Result<Response, ApiError> {
    let mut target = load_user(services, raw_id).await?;
    target.set_active(account.user_id(), active, Utc::now())?;
    services.users.update_user(&target).await?;
    tracing::info!(user_id = %target.id, actor_id = %account.user_id(), active, "activation changed");
    Ok(Json(json!({ "user": target.profile() })).into_response())
}

async fn load_user(services: &AppServices, raw_id: &str) -> Result<UserAccount, ApiError> {
    let id = errors::parse_id::<UserId>(raw_id)?;
    services
        .users
        .find_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))
}
