use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::actor::Actor;

/// Closed set of auditable actions. Persisted as SCREAMING_SNAKE text so the
/// audit collection stays readable without this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    ApplicationCreated,
    ApplicationStatusUpdated,
    ApplicationCommentUpdated,
    ApplicationWithdrawn,
    ApplicationViewed,
    BotProcessTriggered,
    AutomationEnabled,
    AutomationDisabled,
    JobCreated,
    JobUpdated,
    JobDeleted,
    UserLogin,
    ProfileUpdated,
    DashboardViewed,
    Unclassified,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ApplicationCreated => "APPLICATION_CREATED",
            AuditAction::ApplicationStatusUpdated => "APPLICATION_STATUS_UPDATED",
            AuditAction::ApplicationCommentUpdated => "APPLICATION_COMMENT_UPDATED",
            AuditAction::ApplicationWithdrawn => "APPLICATION_WITHDRAWN",
            AuditAction::ApplicationViewed => "APPLICATION_VIEWED",
            AuditAction::BotProcessTriggered => "BOT_PROCESS_TRIGGERED",
            AuditAction::AutomationEnabled => "AUTOMATION_ENABLED",
            AuditAction::AutomationDisabled => "AUTOMATION_DISABLED",
            AuditAction::JobCreated => "JOB_CREATED",
            AuditAction::JobUpdated => "JOB_UPDATED",
            AuditAction::JobDeleted => "JOB_DELETED",
            AuditAction::UserLogin => "USER_LOGIN",
            AuditAction::ProfileUpdated => "PROFILE_UPDATED",
            AuditAction::DashboardViewed => "DASHBOARD_VIEWED",
            AuditAction::Unclassified => "UNCLASSIFIED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable activity record. References its subject only by id/name
/// snapshot, so it survives deletion of the subject.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub actor_name: String,
    pub actor_role: String,
    pub action: String,
    pub description: String,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    pub origin_address: Option<sqlx::types::ipnetwork::IpNetwork>,
    pub metadata: Option<JsonValue>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert shape handed to the recorder.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor: Actor,
    pub action: AuditAction,
    pub description: String,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub target_name: Option<String>,
    pub origin_address: Option<sqlx::types::ipnetwork::IpNetwork>,
    pub metadata: Option<JsonValue>,
}

impl NewAuditEntry {
    pub fn new(actor: Actor, action: AuditAction, description: impl Into<String>) -> Self {
        Self {
            actor,
            action,
            description: description.into(),
            target_type: None,
            target_id: None,
            target_name: None,
            origin_address: None,
            metadata: None,
        }
    }

    pub fn target(
        mut self,
        target_type: impl Into<String>,
        target_id: impl Into<String>,
        target_name: Option<String>,
    ) -> Self {
        self.target_type = Some(target_type.into());
        self.target_id = Some(target_id.into());
        self.target_name = target_name;
        self
    }

    pub fn metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::actor::ActorRole;
    use serde_json::json;

    #[test]
    fn transition_events_carry_previous_and_new_status() {
        let actor = Actor::new(None, "Auto Bot Mimic", ActorRole::BotMimic);
        let entry = NewAuditEntry::new(
            actor,
            AuditAction::ApplicationStatusUpdated,
            "Auto Bot Mimic advanced an application",
        )
        .target("application", "some-id", Some("Sam Applicant".to_string()))
        .metadata(json!({
            "previous_status": "under-review",
            "new_status": "shortlisted",
        }));

        assert_eq!(entry.action.as_str(), "APPLICATION_STATUS_UPDATED");
        assert_eq!(entry.target_type.as_deref(), Some("application"));
        let metadata = entry.metadata.unwrap();
        assert_eq!(metadata["previous_status"], "under-review");
        assert_eq!(metadata["new_status"], "shortlisted");
    }
}
