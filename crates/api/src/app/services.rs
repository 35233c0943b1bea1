//! Service wiring: stores, token service, password hasher, claims workflow.
//!
//! Built once at startup and shared with handlers as `Extension<Arc<AppServices>>`.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;

use lostfound_auth::{Argon2Hasher, NewAccount, PasswordHasher, Role, TokenService, UserAccount, normalize_email};
use lostfound_core::UserId;
use lostfound_infra::{
    ClaimStore, ClaimsWorkflow, InMemoryStore, ItemStore, PostgresStore, UserStore, ensure_schema,
};

use crate::app::errors::ApiError;
use crate::config::ApiConfig;

#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub items: Arc<dyn ItemStore>,
    pub claim_store: Arc<dyn ClaimStore>,
    pub claims: ClaimsWorkflow,
    pub tokens: TokenService,
    pub hasher: Arc<dyn PasswordHasher>,
    /// Hash checked for logins with an unknown email, made on first use.
    dummy_hash: Arc<OnceCell<String>>,
}

impl AppServices {
    /// Wire every repository to the same backend.
    pub fn new<S>(store: Arc<S>, tokens: TokenService, hasher: Arc<dyn PasswordHasher>) -> Self
    where
        S: UserStore + ItemStore + ClaimStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let items: Arc<dyn ItemStore> = store.clone();
        let claim_store: Arc<dyn ClaimStore> = store;
        Self {
            claims: ClaimsWorkflow::new(users.clone(), items.clone(), claim_store.clone()),
            users,
            items,
            claim_store,
            tokens,
            hasher,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn in_memory(tokens: TokenService) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), tokens, Arc::new(Argon2Hasher::new()))
    }

    pub fn issue_token(&self, account: &UserAccount) -> Result<String, ApiError> {
        self.tokens.issue(&account.subject()).map_err(ApiError::internal)
    }

    /// Argon2 is CPU-bound; keep it off the async workers.
    pub async fn hash_password(&self, password: String) -> Result<String, ApiError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(ApiError::internal)?
            .map_err(ApiError::from)
    }

    pub async fn verify_password(&self, password: String, hash: String) -> Result<bool, ApiError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(ApiError::internal)?
            .map_err(ApiError::from)
    }

    /// Spend one verification for an email with no account, so the response
    /// time matches a wrong password.
    pub async fn verify_unknown_account(&self, password: String) -> Result<(), ApiError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash_password("lostfound-unknown-account".to_string()))
            .await?
            .clone();
        self.verify_password(password, hash).await.map(|_| ())
    }

    /// Fresh check used for owner-or-admin decisions outside the admin routes.
    pub async fn is_admin(&self, user_id: UserId) -> Result<bool, ApiError> {
        Ok(self
            .users
            .find_user(user_id)
            .await?
            .is_some_and(|u| u.is_enabled() && u.role.is_admin()))
    }

    /// Create an admin account unless the email is already registered.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<(), ApiError> {
        if self.users.find_user_by_email(&normalize_email(email)).await?.is_some() {
            return Ok(());
        }
        let password_hash = self.hash_password(password.to_string()).await?;
        let mut account = UserAccount::register(
            NewAccount {
                email: email.to_string(),
                name: "Administrator".to_string(),
                password_hash,
            },
            Utc::now(),
        )?;
        account.role = Role::Admin;
        account.verified = true;
        let account = self.users.insert_user(account).await?;
        tracing::info!(user_id = %account.id, "bootstrap admin created");
        Ok(())
    }
}

/// Build services from configuration: PostgreSQL when `DATABASE_URL` is set,
/// in-memory otherwise.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl);
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());

    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .context("failed to connect to Postgres")?;
            ensure_schema(&pool).await.context("failed to ensure database schema")?;
            tracing::info!("using PostgreSQL store");
            Ok(AppServices::new(Arc::new(PostgresStore::new(pool)), tokens, hasher))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            Ok(AppServices::new(Arc::new(InMemoryStore::new()), tokens, hasher))
        }
    }
}
