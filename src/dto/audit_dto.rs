use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::audit_entry::AuditEntry;
use crate::services::audit_service::{AuditList, AuditStats};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuditListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub action: Option<String>,
    pub target_type: Option<String>,
    pub actor_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<AuditList> for AuditListResponse {
    fn from(value: AuditList) -> Self {
        Self {
            items: value.items,
            total: value.total,
            page: value.page,
            per_page: value.per_page,
            total_pages: value.total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStatsResponse {
    pub total: i64,
    pub last_24h: i64,
    pub by_action: Vec<ActionCount>,
}

impl From<AuditStats> for AuditStatsResponse {
    fn from(value: AuditStats) -> Self {
        Self {
            total: value.total,
            last_24h: value.last_24h,
            by_action: value
                .by_action
                .into_iter()
                .map(|(action, count)| ActionCount { action, count })
                .collect(),
        }
    }
}
