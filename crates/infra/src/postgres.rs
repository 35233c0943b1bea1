//! PostgreSQL backend.
//!
//! ## Error mapping
//!
//! | SQLx error | code | StoreError |
//! |------------|------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (other) | any | `Backend` |
//! | PoolClosed / Io / other | n/a | `Backend` |
//!
//! Claim uniqueness is enforced by the `claims_item_claimant_uniq` index, never
//! by an application-side check. Approvals lock the found item row first
//! (`FOR UPDATE`) and claim inserts take a share lock on it (`FOR SHARE`), so
//! approvals and inserts on the same item serialize.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use lostfound_auth::{Role, UserAccount};
use lostfound_claims::{Claim, ClaimStatus};
use lostfound_core::{ClaimId, ItemId, UserId};
use lostfound_items::{FoundItem, FoundItemStatus, ItemReport, LostItem, LostItemStatus};

use crate::store::{
    ClaimCounts, ClaimStore, FoundItemCounts, FoundItemFilter, ItemStore, LostItemCounts, StoreError, StoreResult,
    UserStore,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'student',
        verified BOOLEAN NOT NULL DEFAULT FALSE,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        banned BOOLEAN NOT NULL DEFAULT FALSE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS found_items (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        location TEXT NOT NULL,
        date DATE NOT NULL,
        contact_info TEXT,
        status TEXT NOT NULL DEFAULT 'available',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lost_items (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        location TEXT NOT NULL,
        date DATE NOT NULL,
        contact_info TEXT,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS claims (
        id UUID PRIMARY KEY,
        found_item_id UUID NOT NULL REFERENCES found_items(id) ON DELETE CASCADE,
        claimant_id UUID NOT NULL REFERENCES users(id),
        status TEXT NOT NULL DEFAULT 'pending',
        details TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS claims_item_claimant_uniq ON claims (found_item_id, claimant_id)",
    "CREATE INDEX IF NOT EXISTS claims_claimant_idx ON claims (claimant_id)",
    "CREATE INDEX IF NOT EXISTS found_items_status_idx ON found_items (status)",
];

/// Create tables and indexes if missing. Idempotent; run once at startup.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

const USER_COLUMNS: &str =
    "id, email, name, role, verified, active, banned, password_hash, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, owner_id, title, description, category, location, date, contact_info, status, created_at, updated_at";
const CLAIM_COLUMNS: &str = "id, found_item_id, claimant_id, status, details, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.verified)
        .bind(user.active)
        .bind(user.banned)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;
        row.map(|r| decode::<UserRow, UserAccount>(&r)).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.map(|r| decode::<UserRow, UserAccount>(&r)).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update_user(&self, user: &UserAccount) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, name = $3, role = $4, verified = $5, active = $6, banned = $7,
                password_hash = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.verified)
        .bind(user.active)
        .bind(user.banned)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> StoreResult<Vec<UserAccount>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(decode::<UserRow, UserAccount>).collect()
    }

    #[instrument(skip(self), err)]
    async fn count_users(&self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users", e))?;
        read_count(&row)
    }
}

#[async_trait::async_trait]
impl ItemStore for PostgresStore {
    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn insert_found_item(&self, item: FoundItem) -> StoreResult<FoundItem> {
        insert_item(
            &self.pool,
            "found_items",
            item.id,
            item.owner_id,
            &item.report,
            item.status.as_str(),
            item.created_at,
            item.updated_at,
        )
        .await
        .map_err(|e| map_sqlx_error("insert_found_item", e))?;
        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn find_found_item(&self, id: ItemId) -> StoreResult<Option<FoundItem>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM found_items WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_found_item", e))?;
        row.map(|r| decode::<ItemRow, FoundItem>(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_found_items(&self, filter: &FoundItemFilter) -> StoreResult<Vec<FoundItem>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM found_items
            WHERE ($1::text IS NULL OR status = $1)
                AND ($2::text IS NULL OR lower(category) = lower($2))
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.category.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_found_items", e))?;
        rows.iter().map(decode::<ItemRow, FoundItem>).collect()
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn update_found_item(&self, item: &FoundItem) -> StoreResult<()> {
        let rows = update_item(
            &self.pool,
            "found_items",
            item.id,
            &item.report,
            item.status.as_str(),
            item.updated_at,
        )
        .await
        .map_err(|e| map_sqlx_error("update_found_item", e))?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("found item {}", item.id)));
        }
        Ok(())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn insert_lost_item(&self, item: LostItem) -> StoreResult<LostItem> {
        insert_item(
            &self.pool,
            "lost_items",
            item.id,
            item.owner_id,
            &item.report,
            item.status.as_str(),
            item.created_at,
            item.updated_at,
        )
        .await
        .map_err(|e| map_sqlx_error("insert_lost_item", e))?;
        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn find_lost_item(&self, id: ItemId) -> StoreResult<Option<LostItem>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM lost_items WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_lost_item", e))?;
        row.map(|r| decode::<ItemRow, LostItem>(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_lost_items(&self) -> StoreResult<Vec<LostItem>> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM lost_items ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_lost_items", e))?;
        rows.iter().map(decode::<ItemRow, LostItem>).collect()
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn update_lost_item(&self, item: &LostItem) -> StoreResult<()> {
        let rows = update_item(
            &self.pool,
            "lost_items",
            item.id,
            &item.report,
            item.status.as_str(),
            item.updated_at,
        )
        .await
        .map_err(|e| map_sqlx_error("update_lost_item", e))?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("lost item {}", item.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn count_found_items(&self) -> StoreResult<FoundItemCounts> {
        let mut counts = FoundItemCounts::default();
        for (status, n) in count_by_status(&self.pool, "found_items").await? {
            match status.parse::<FoundItemStatus>().map_err(|e| StoreError::Backend(e.to_string()))? {
                FoundItemStatus::Available => counts.available = n,
                FoundItemStatus::Claimed => counts.claimed = n,
                FoundItemStatus::Returned => counts.returned = n,
            }
        }
        Ok(counts)
    }

    #[instrument(skip(self), err)]
    async fn count_lost_items(&self) -> StoreResult<LostItemCounts> {
        let mut counts = LostItemCounts::default();
        for (status, n) in count_by_status(&self.pool, "lost_items").await? {
            match status.parse::<LostItemStatus>().map_err(|e| StoreError::Backend(e.to_string()))? {
                LostItemStatus::Active => counts.active = n,
                LostItemStatus::Found => counts.found = n,
                LostItemStatus::Closed => counts.closed = n,
            }
        }
        Ok(counts)
    }
}

#[async_trait::async_trait]
impl ClaimStore for PostgresStore {
    #[instrument(skip(self), fields(claim_id = %id), err)]
    async fn find_claim(&self, id: ClaimId) -> StoreResult<Option<Claim>> {
        let row = sqlx::query(&format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_claim", e))?;
        row.map(|r| decode::<ClaimRow, Claim>(&r)).transpose()
    }

    #[instrument(skip(self), fields(item_id = %found_item_id, claimant_id = %claimant_id), err)]
    async fn find_claim_by_pair(&self, found_item_id: ItemId, claimant_id: UserId) -> StoreResult<Option<Claim>> {
        let row = sqlx::query(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE found_item_id = $1 AND claimant_id = $2"
        ))
        .bind(*found_item_id.as_uuid())
        .bind(*claimant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_claim_by_pair", e))?;
        row.map(|r| decode::<ClaimRow, Claim>(&r)).transpose()
    }

    #[instrument(
        skip(self, claim),
        fields(claim_id = %claim.id, item_id = %claim.found_item_id, claimant_id = %claim.claimant_id),
        err
    )]
    async fn insert_claim(&self, claim: Claim) -> StoreResult<Claim> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // FOR SHARE conflicts with the approval's FOR UPDATE: an insert racing an
        // approval either waits and then sees `claimed`, or commits first and is
        // caught by the approval's sibling cascade.
        let item_status: Option<String> = sqlx::query("SELECT status FROM found_items WHERE id = $1 FOR SHARE")
            .bind(*claim.found_item_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("share_found_item", e))?
            .map(|row| row.try_get("status"))
            .transpose()
            .map_err(|e| map_sqlx_error("share_found_item", e))?;

        if item_status.as_deref() != Some(FoundItemStatus::Available.as_str()) {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::StaleState(format!(
                "found item {} is not available",
                claim.found_item_id
            )));
        }

        // The unique index rejects a second claim for the same pair even when
        // two inserts race.
        sqlx::query(&format!(
            "INSERT INTO claims ({CLAIM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(*claim.id.as_uuid())
        .bind(*claim.found_item_id.as_uuid())
        .bind(*claim.claimant_id.as_uuid())
        .bind(claim.status.as_str())
        .bind(&claim.details)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_claim", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(claim)
    }

    #[instrument(skip(self, now), fields(claim_id = %id), err)]
    async fn approve_claim(&self, id: ClaimId, now: DateTime<Utc>) -> StoreResult<Claim> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let item_id: Uuid = sqlx::query("SELECT found_item_id FROM claims WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("approve_claim", e))?
            .ok_or_else(|| StoreError::NotFound(format!("claim {id}")))?
            .try_get("found_item_id")
            .map_err(|e| map_sqlx_error("approve_claim", e))?;

        let item_status: Option<String> = sqlx::query("SELECT status FROM found_items WHERE id = $1 FOR UPDATE")
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_found_item", e))?
            .map(|row| row.try_get("status"))
            .transpose()
            .map_err(|e| map_sqlx_error("lock_found_item", e))?;

        let claim_status: String = sqlx::query("SELECT status FROM claims WHERE id = $1 FOR UPDATE")
            .bind(*id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_claim", e))?
            .try_get("status")
            .map_err(|e| map_sqlx_error("lock_claim", e))?;

        if item_status.as_deref() != Some(FoundItemStatus::Available.as_str())
            || claim_status != ClaimStatus::Pending.as_str()
        {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::StaleState(format!("claim {id} can no longer be approved")));
        }

        sqlx::query("UPDATE found_items SET status = 'claimed', updated_at = $2 WHERE id = $1")
            .bind(item_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("claim_found_item", e))?;

        let row = sqlx::query(&format!(
            "UPDATE claims SET status = 'approved', updated_at = $2 WHERE id = $1 RETURNING {CLAIM_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("approve_claim", e))?;
        let approved = decode::<ClaimRow, Claim>(&row)?;

        let cascaded = sqlx::query(
            r#"
            UPDATE claims
            SET status = 'rejected', updated_at = $3
            WHERE found_item_id = $1 AND id <> $2 AND status = 'pending'
            "#,
        )
        .bind(item_id)
        .bind(*id.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("reject_sibling_claims", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::debug!(rejected = cascaded.rows_affected(), "sibling claims rejected");
        Ok(approved)
    }

    #[instrument(skip(self, now), fields(claim_id = %id), err)]
    async fn reject_claim(&self, id: ClaimId, now: DateTime<Utc>) -> StoreResult<Claim> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE claims SET status = 'rejected', updated_at = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(*id.as_uuid())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("reject_claim", e))?;

        match row {
            Some(row) => decode::<ClaimRow, Claim>(&row),
            None => Err(self.missing_or_stale(id).await),
        }
    }

    #[instrument(skip(self), fields(claim_id = %id), err)]
    async fn delete_pending_claim(&self, id: ClaimId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM claims WHERE id = $1 AND status = 'pending'")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_pending_claim", e))?;
        if result.rows_affected() == 0 {
            return Err(self.missing_or_stale(id).await);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(claimant_id = %claimant_id), err)]
    async fn list_claims_by_claimant(&self, claimant_id: UserId) -> StoreResult<Vec<Claim>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE claimant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(*claimant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_claims_by_claimant", e))?;
        rows.iter().map(decode::<ClaimRow, Claim>).collect()
    }

    #[instrument(skip(self), fields(owner_id = %owner_id), err)]
    async fn list_claims_for_owner(&self, owner_id: UserId) -> StoreResult<Vec<Claim>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.found_item_id, c.claimant_id, c.status, c.details, c.created_at, c.updated_at
            FROM claims c
            JOIN found_items f ON f.id = c.found_item_id
            WHERE f.owner_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(*owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_claims_for_owner", e))?;
        rows.iter().map(decode::<ClaimRow, Claim>).collect()
    }

    #[instrument(skip(self), fields(item_id = %found_item_id), err)]
    async fn list_claims_for_item(&self, found_item_id: ItemId) -> StoreResult<Vec<Claim>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE found_item_id = $1 ORDER BY created_at DESC"
        ))
        .bind(*found_item_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_claims_for_item", e))?;
        rows.iter().map(decode::<ClaimRow, Claim>).collect()
    }

    #[instrument(skip(self), err)]
    async fn count_claims(&self) -> StoreResult<ClaimCounts> {
        let mut counts = ClaimCounts::default();
        for (status, n) in count_by_status(&self.pool, "claims").await? {
            match status.parse::<ClaimStatus>().map_err(|e| StoreError::Backend(e.to_string()))? {
                ClaimStatus::Pending => counts.pending = n,
                ClaimStatus::Approved => counts.approved = n,
                ClaimStatus::Rejected => counts.rejected = n,
            }
        }
        Ok(counts)
    }
}

impl PostgresStore {
    /// Classify a conditional claim write that touched no rows.
    async fn missing_or_stale(&self, id: ClaimId) -> StoreError {
        match self.find_claim(id).await {
            Ok(Some(claim)) => StoreError::StaleState(format!("claim {id} is {}", claim.status)),
            Ok(None) => StoreError::NotFound(format!("claim {id}")),
            Err(e) => e,
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn insert_item(
    pool: &PgPool,
    table: &str,
    id: ItemId,
    owner_id: UserId,
    report: &ItemReport,
    status: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO {table} ({ITEM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
    ))
    .bind(*id.as_uuid())
    .bind(*owner_id.as_uuid())
    .bind(&report.title)
    .bind(&report.description)
    .bind(&report.category)
    .bind(&report.location)
    .bind(report.date)
    .bind(report.contact_info.as_deref())
    .bind(status)
    .bind(created_at)
    .bind(updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

async fn update_item(
    pool: &PgPool,
    table: &str,
    id: ItemId,
    report: &ItemReport,
    status: &str,
    updated_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&format!(
        r#"
        UPDATE {table}
        SET title = $2, description = $3, category = $4, location = $5, date = $6,
            contact_info = $7, status = $8, updated_at = $9
        WHERE id = $1
        "#
    ))
    .bind(*id.as_uuid())
    .bind(&report.title)
    .bind(&report.description)
    .bind(&report.category)
    .bind(&report.location)
    .bind(report.date)
    .bind(report.contact_info.as_deref())
    .bind(status)
    .bind(updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

async fn count_by_status(pool: &PgPool, table: &str) -> StoreResult<Vec<(String, u64)>> {
    let rows = sqlx::query(&format!("SELECT status, COUNT(*) AS n FROM {table} GROUP BY status"))
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error("count_by_status", e))?;
    rows.iter()
        .map(|row| {
            let status: String = row.try_get("status").map_err(|e| map_sqlx_error("count_by_status", e))?;
            Ok((status, read_count(row)?))
        })
        .collect()
}

fn read_count(row: &PgRow) -> StoreResult<u64> {
    let n: i64 = row.try_get("n").map_err(|e| map_sqlx_error("read_count", e))?;
    Ok(u64::try_from(n).unwrap_or_default())
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        other => StoreError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}

// SQLx row types

fn decode<R, T>(row: &PgRow) -> StoreResult<T>
where
    R: for<'r> FromRow<'r, PgRow> + TryInto<T, Error = StoreError>,
{
    R::from_row(row)
        .map_err(|e| StoreError::Backend(format!("failed to decode row: {e}")))?
        .try_into()
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    verified: bool,
    active: bool,
    banned: bool,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            role: row.try_get("role")?,
            verified: row.try_get("verified")?,
            active: row.try_get("active")?,
            banned: row.try_get("banned")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<UserRow> for UserAccount {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(|e| StoreError::Backend(format!("{e}")))?;
        Ok(UserAccount {
            id: UserId::from_uuid(row.id),
            email: row.email,
            name: row.name,
            role,
            verified: row.verified,
            active: row.active,
            banned: row.banned,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct ItemRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    category: String,
    location: String,
    date: NaiveDate,
    contact_info: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            location: row.try_get("location")?,
            date: row.try_get("date")?,
            contact_info: row.try_get("contact_info")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl ItemRow {
    fn report(&self) -> ItemReport {
        ItemReport {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            location: self.location.clone(),
            date: self.date,
            contact_info: self.contact_info.clone(),
        }
    }
}

impl TryFrom<ItemRow> for FoundItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(FoundItem {
            id: ItemId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            report: row.report(),
            status: row.status.parse().map_err(|e| StoreError::Backend(format!("{e}")))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ItemRow> for LostItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(LostItem {
            id: ItemId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            report: row.report(),
            status: row.status.parse().map_err(|e| StoreError::Backend(format!("{e}")))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct ClaimRow {
    id: Uuid,
    found_item_id: Uuid,
    claimant_id: Uuid,
    status: String,
    details: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ClaimRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ClaimRow {
            id: row.try_get("id")?,
            found_item_id: row.try_get("found_item_id")?,
            claimant_id: row.try_get("claimant_id")?,
            status: row.try_get("status")?,
            details: row.try_get("details")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ClaimRow> for Claim {
    type Error = StoreError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        Ok(Claim {
            id: ClaimId::from_uuid(row.id),
            found_item_id: ItemId::from_uuid(row.found_item_id),
            claimant_id: UserId::from_uuid(row.claimant_id),
            status: row.status.parse().map_err(|e| StoreError::Backend(format!("{e}")))?,
            details: row.details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
