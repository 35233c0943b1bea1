use serde::{Deserialize, Serialize};

use lostfound_auth::{Permission, UserProfile};
use lostfound_core::ItemId;
use lostfound_infra::{ClaimCounts, FoundItemCounts, LostItemCounts};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    pub found_item_id: Option<ItemId>,
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClaimRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClaimsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FoundItemsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct AdminVerifyResponse {
    pub user: UserProfile,
    pub permissions: Vec<String>,
}

impl AdminVerifyResponse {
    pub fn new(user: UserProfile, permissions: &[Permission]) -> Self {
        Self {
            user,
            permissions: permissions.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LostItemsSummary {
    pub total: u64,
    #[serde(flatten)]
    pub by_status: LostItemCounts,
}

#[derive(Debug, Serialize)]
pub struct FoundItemsSummary {
    pub total: u64,
    #[serde(flatten)]
    pub by_status: FoundItemCounts,
}

#[derive(Debug, Serialize)]
pub struct ClaimsSummary {
    pub total: u64,
    #[serde(flatten)]
    pub by_status: ClaimCounts,
}

#[derive(Debug, Serialize)]
pub struct ReportsSummary {
    pub users: u64,
    pub lost_items: LostItemsSummary,
    pub found_items: FoundItemsSummary,
    pub claims: ClaimsSummary,
}

impl ReportsSummary {
    pub fn new(users: u64, lost: LostItemCounts, found: FoundItemCounts, claims: ClaimCounts) -> Self {
        Self {
            users,
            lost_items: LostItemsSummary {
                total: lost.active + lost.found + lost.closed,
                by_status: lost,
            },
            found_items: FoundItemsSummary {
                total: found.available + found.claimed + found.returned,
                by_status: found,
            },
            claims: ClaimsSummary {
                total: claims.pending + claims.approved + claims.rejected,
                by_status: claims,
            },
        }
    }
}
