use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use lostfound_auth::{NewAccount, UserAccount, normalize_email, validate_email, validate_password};
use lostfound_infra::StoreError;

use crate::app::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{AccountContext, SubjectContext};

pub fn public_router() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
}

pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let email = normalize_email(&body.email);
    if services.users.find_user_by_email(&email).await?.is_some() {
        return Err(email_taken());
    }

    let password_hash = services.hash_password(body.password).await?;
    let account = UserAccount::register(
        NewAccount {
            email,
            name: body.name,
            password_hash,
        },
        Utc::now(),
    )?;

    // Two registrations can race past the lookup above; the unique index decides.
    let account = services.users.insert_user(account).await.map_err(|e| match e {
        StoreError::UniqueViolation(_) => email_taken(),
        other => other.into(),
    })?;
    tracing::info!(user_id = %account.id, "account registered");

    let token = services.issue_token(&account)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: account.profile(),
        }),
    )
        .into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let email = normalize_email(&body.email);

    let Some(account) = services.users.find_user_by_email(&email).await? else {
        services.verify_unknown_account(body.password).await?;
        tracing::info!("login rejected: unknown email");
        return Err(ApiError::InvalidCredentials);
    };
    if !services
        .verify_password(body.password, account.password_hash.clone())
        .await?
    {
        tracing::info!(user_id = %account.id, "login rejected: bad password");
        return Err(ApiError::InvalidCredentials);
    }
    if !account.is_enabled() {
        tracing::info!(user_id = %account.id, "login rejected: account disabled");
        return Err(ApiError::AccountDisabled);
    }

    let token = services.issue_token(&account)?;
    Ok(Json(AuthResponse {
        token,
        user: account.profile(),
    })
    .into_response())
}

pub async fn me(Extension(account): Extension<AccountContext>) -> Result<Response, ApiError> {
    Ok(Json(json!({ "user": account.account().profile() })).into_response())
}

/// Re-issue a token carrying the account's current email and role.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(subject): Extension<SubjectContext>,
    Extension(account): Extension<AccountContext>,
) -> Result<Response, ApiError> {
    let account = account.account();
    if account.role != subject.token_role() {
        tracing::info!(user_id = %account.id, role = %account.role, "token role refreshed");
    }

    let token = services.issue_token(account)?;
    Ok(Json(AuthResponse {
        token,
        user: account.profile(),
    })
    .into_response())
}

fn email_taken() -> ApiError {
    ApiError::Conflict {
        code: "email_taken",
        message: "email is already registered".to_string(),
    }
}
