use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const JOB_TYPE_TECHNICAL: &str = "technical";

/// Job postings are owned by the posting system; this service only reads
/// them to resolve titles and the technical-track flag.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub job_type: String,
    pub created_at: Option<DateTime<Utc>>,
}
