use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use lostfound_claims::ClaimResolution;
use lostfound_core::ClaimId;

use crate::app::dto::{ClaimsQuery, CreateClaimRequest, UpdateClaimRequest};
use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;
use crate::context::SubjectContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_claims).post(create_claim))
        .route("/:id", get(get_claim).patch(update_claim).delete(delete_claim))
}

pub async fn create_claim(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    body: Result<Json<CreateClaimRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let found_item_id = body
        .found_item_id
        .ok_or_else(|| ApiError::validation("found_item_id is required"))?;

    let claim = services
        .claims
        .create_claim(subject.user_id(), found_item_id, body.details.as_deref().unwrap_or(""))
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "claim": claim }))).into_response())
}

/// `?type=made` (default) lists the caller's claims; `?type=received` lists
/// claims on items the caller reported.
pub async fn list_claims(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    query: Result<Query<ClaimsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let claims = match query.kind.as_deref() {
        None | Some("made") => services.claims.list_claims_made(subject.user_id()).await?,
        Some("received") => services.claims.list_claims_received(subject.user_id()).await?,
        Some(other) => {
            return Err(ApiError::validation(format!(
                "type must be 'made' or 'received', got '{other}'"
            )));
        }
    };
    Ok(Json(json!({ "claims": claims })).into_response())
}

pub async fn get_claim(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let claim_id = errors::parse_id::<ClaimId>(&id)?;
    let claim = services.claims.get_claim(claim_id, subject.user_id()).await?;
    Ok(Json(json!({ "claim": claim })).into_response())
}

pub async fn update_claim(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<UpdateClaimRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let claim_id = errors::parse_id::<ClaimId>(&id)?;
    let resolution = ClaimResolution::parse(&body.status)?;

    let claim = services
        .claims
        .update_claim_status(claim_id, subject.user_id(), resolution)
        .await?;
    Ok(Json(json!({ "claim": claim })).into_response())
}

pub async fn delete_claim(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let claim_id = errors::parse_id::<ClaimId>(&id)?;
    services.claims.delete_claim(claim_id, subject.user_id()).await?;
    Ok(Json(json!({ "deleted": claim_id })).into_response())
}
