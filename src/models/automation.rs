use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Singleton settings row gating the scheduled sweep. Database-backed so a
/// toggle survives restarts and is visible to every instance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AutomationSettings {
    pub enabled: bool,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
}
