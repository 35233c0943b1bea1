use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use lostfound_core::{DomainError, DomainResult, ItemId, UserId};

use crate::{FoundItemStatus, LostItemStatus};

const MAX_TITLE_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// User-submitted report fields shared by lost and found items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub location: String,
    /// Day the item was lost or found.
    pub date: NaiveDate,
    #[serde(default)]
    pub contact_info: Option<String>,
}

impl ItemReport {
    /// Validate and normalize (trim) the report.
    pub fn validated(self) -> DomainResult<Self> {
        let title = self.title.trim().to_string();
        let category = self.category.trim().to_lowercase();
        let location = self.location.trim().to_string();
        let description = self.description.trim().to_string();

        if title.is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::validation(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        if category.is_empty() {
            return Err(DomainError::validation("category is required"));
        }
        if location.is_empty() {
            return Err(DomainError::validation("location is required"));
        }

        Ok(Self {
            title,
            description,
            category,
            location,
            date: self.date,
            contact_info: self
                .contact_info
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}

/// An item someone found on campus and handed in / reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundItem {
    pub id: ItemId,
    pub owner_id: UserId,
    #[serde(flatten)]
    pub report: ItemReport,
    pub status: FoundItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FoundItem {
    pub fn report(owner_id: UserId, report: ItemReport, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: ItemId::new(),
            owner_id,
            report: report.validated()?,
            status: FoundItemStatus::Available,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_available(&self) -> bool {
        self.status == FoundItemStatus::Available
    }

    /// claimed → returned (hand-over completed).
    pub fn mark_returned(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != FoundItemStatus::Claimed {
            return Err(DomainError::invariant(format!(
                "only claimed items can be returned (status is {})",
                self.status
            )));
        }
        self.status = FoundItemStatus::Returned;
        self.updated_at = now;
        Ok(())
    }
}

/// An item someone reported as lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostItem {
    pub id: ItemId,
    pub owner_id: UserId,
    #[serde(flatten)]
    pub report: ItemReport,
    pub status: LostItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LostItem {
    pub fn report(owner_id: UserId, report: ItemReport, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: ItemId::new(),
            owner_id,
            report: report.validated()?,
            status: LostItemStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_status(&mut self, next: LostItemStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "cannot move lost item from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ItemReport {
        ItemReport {
            title: "  Blue backpack ".into(),
            description: "North Face, laptop sleeve".into(),
            category: " Bags ".into(),
            location: "Library 2F".into(),
            date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            contact_info: Some("   ".into()),
        }
    }

    #[test]
    fn report_is_trimmed_and_normalized() {
        let item = FoundItem::report(UserId::new(), report(), Utc::now()).unwrap();
        assert_eq!(item.report.title, "Blue backpack");
        assert_eq!(item.report.category, "bags");
        assert_eq!(item.report.contact_info, None);
        assert!(item.is_available());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let mut r = report();
        r.title = " ".into();
        assert!(r.validated().is_err());

        let mut r = report();
        r.location = String::new();
        assert!(r.validated().is_err());

        let mut r = report();
        r.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(r.validated().is_err());
    }

    #[test]
    fn only_claimed_found_items_can_be_returned() {
        let mut item = FoundItem::report(UserId::new(), report(), Utc::now()).unwrap();
        assert!(item.mark_returned(Utc::now()).is_err());
        item.status = FoundItemStatus::Claimed;
        item.mark_returned(Utc::now()).unwrap();
        assert_eq!(item.status, FoundItemStatus::Returned);
    }

    #[test]
    fn lost_item_transitions() {
        let mut item = LostItem::report(UserId::new(), report(), Utc::now()).unwrap();
        item.set_status(LostItemStatus::Found, Utc::now()).unwrap();
        assert!(item.set_status(LostItemStatus::Active, Utc::now()).is_err());
        item.set_status(LostItemStatus::Closed, Utc::now()).unwrap();
        assert!(item.set_status(LostItemStatus::Found, Utc::now()).is_err());
    }

    #[test]
    fn found_item_serializes_flat() {
        let item = FoundItem::report(UserId::new(), report(), Utc::now()).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["title"], "Blue backpack");
        assert_eq!(json["status"], "available");
        assert_eq!(json["date"], "2026-09-14");
    }
}
