use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::actor::{Actor, ActorRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    Shortlisted,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under-review",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Closed records accept no further workflow transitions from any driver.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Withdrawn
        )
    }

    /// Statuses the automated driver is allowed to pick up.
    pub fn is_bot_eligible(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Submitted
                | ApplicationStatus::UnderReview
                | ApplicationStatus::Shortlisted
        )
    }
}

impl sqlx::postgres::PgHasArrayType for ApplicationStatus {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_application_status")
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under-review" => Ok(ApplicationStatus::UnderReview),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => Err(format!("unknown application status: {}", other)),
        }
    }
}

/// One row of the append-only status ledger. Entries are created once and
/// never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: ApplicationStatus,
    pub changed_by: Option<Uuid>,
    pub changed_by_name: String,
    pub changed_by_role: ActorRole,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StatusHistoryEntry {
    pub fn new(status: ApplicationStatus, actor: &Actor, comment: Option<String>) -> Self {
        Self {
            status,
            changed_by: actor.id,
            changed_by_name: actor.name.clone(),
            changed_by_role: actor.role,
            comment,
            timestamp: Utc::now(),
        }
    }

    /// The entry synthesized when a record is created, so history is never
    /// empty.
    pub fn initial() -> Self {
        Self::new(
            ApplicationStatus::Submitted,
            &Actor::system(),
            Some("Application received".to_string()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub status: ApplicationStatus,
    pub status_history: Json<Vec<StatusHistoryEntry>>,
    pub notes: Option<String>,
    pub bot_processed_at: Option<DateTime<Utc>>,
    pub bot_processed_count: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Fresh record in `submitted` with the synthesized first history entry.
    pub fn new(
        job_id: Uuid,
        applicant_id: Uuid,
        applicant_name: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            applicant_id,
            applicant_name: applicant_name.into(),
            status: ApplicationStatus::Submitted,
            status_history: Json(vec![StatusHistoryEntry::initial()]),
            notes,
            bot_processed_at: None,
            bot_processed_count: 0,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn history(&self) -> &[StatusHistoryEntry] {
        &self.status_history.0
    }

    pub fn last_history_entry(&self) -> Option<&StatusHistoryEntry> {
        self.status_history.0.last()
    }
}
