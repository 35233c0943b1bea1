use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use lostfound_core::{ItemId, UserId};
use lostfound_infra::FoundItemFilter;
use lostfound_items::{FoundItem, FoundItemStatus, ItemReport, LostItem, LostItemStatus};

use crate::app::dto::{FoundItemsQuery, StatusRequest};
use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;
use crate::context::SubjectContext;

pub fn router() -> Router {
    Router::new()
        .route("/found", get(list_found).post(report_found))
        .route("/found/:id", get(get_found))
        .route("/found/:id/returned", patch(mark_returned))
        .route("/found/:id/claims", get(claims_for_item))
        .route("/lost", get(list_lost).post(report_lost))
        .route("/lost/:id", get(get_lost))
        .route("/lost/:id/status", patch(update_lost_status))
}

// -------------------------
// Found items
// -------------------------

pub async fn report_found(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    body: Result<Json<ItemReport>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let item = FoundItem::report(subject.user_id(), body, Utc::now())?;
    let item = services.items.insert_found_item(item).await?;
    tracing::info!(item_id = %item.id, owner_id = %item.owner_id, "found item reported");
    Ok((StatusCode::CREATED, Json(json!({ "item": item }))).into_response())
}

pub async fn list_found(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<FoundItemsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<FoundItemStatus>)
        .transpose()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let filter = FoundItemFilter {
        status,
        category: query.category,
    };

    let items = services.items.list_found_items(&filter).await?;
    Ok(Json(json!({ "items": items })).into_response())
}

pub async fn get_found(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let item = load_found(&services, &id).await?;
    Ok(Json(json!({ "item": item })).into_response())
}

/// claimed → returned, by the reporter or an admin.
pub async fn mark_returned(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let mut item = load_found(&services, &id).await?;
    ensure_owner_or_admin(&services, item.owner_id, &subject).await?;

    item.mark_returned(Utc::now())?;
    services.items.update_found_item(&item).await?;
    tracing::info!(item_id = %item.id, actor_id = %subject.user_id(), "found item returned");
    Ok(Json(json!({ "item": item })).into_response())
}

pub async fn claims_for_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let item_id = errors::parse_id::<ItemId>(&id)?;
    let claims = services
        .claims
        .list_claims_for_item(item_id, subject.user_id())
        .await?;
    Ok(Json(json!({ "claims": claims })).into_response())
}

// -------------------------
// Lost items
// -------------------------

pub async fn report_lost(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    body: Result<Json<ItemReport>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let item = LostItem::report(subject.user_id(), body, Utc::now())?;
    let item = services.items.insert_lost_item(item).await?;
    tracing::info!(item_id = %item.id, owner_id = %item.owner_id, "lost item reported");
    Ok((StatusCode::CREATED, Json(json!({ "item": item }))).into_response())
}

pub async fn list_lost(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    let items = services.items.list_lost_items().await?;
    Ok(Json(json!({ "items": items })).into_response())
}

pub async fn get_lost(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let item = load_lost(&services, &id).await?;
    Ok(Json(json!({ "item": item })).into_response())
}

pub async fn update_lost_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let next: LostItemStatus = body
        .status
        .parse()
        .map_err(|e: lostfound_items::UnknownStatus| ApiError::validation(e.to_string()))?;

    let mut item = load_lost(&services, &id).await?;
    ensure_owner_or_admin(&services, item.owner_id, &subject).await?;

    item.set_status(next, Utc::now())?;
    services.items.update_lost_item(&item).await?;
    tracing::info!(item_id = %item.id, status = %item.status, "lost item status changed");
    Ok(Json(json!({ "item": item })).into_response())
}

// -------------------------
// Helpers
// -------------------------

async fn load_found(services: &AppServices, raw_id: &str) -> Result<FoundItem, ApiError> {
    let id = errors::parse_id::<ItemId>(raw_id)?;
    services
        .items
        .find_found_item(id)
        .await?
        .ok_or(ApiError::NotFound("found item"))
}

async fn load_lost(services: &AppServices, raw_id: &str) -> Result<LostItem, ApiError> {
    let id = errors::parse_id::<ItemId>(raw_id)?;
    services
        .items
        .find_lost_item(id)
        .await?
        .ok_or(ApiError::NotFound("lost item"))
}

async fn ensure_owner_or_admin(
    services: &AppServices,
    owner_id: UserId,
    subject: &SubjectContext,
) -> Result<(), ApiError> {
    if owner_id == subject.user_id() || services.is_admin(subject.user_id()).await? {
        return Ok(());
    }
    Err(ApiError::forbidden("only the reporter or an admin can update this item"))
}
