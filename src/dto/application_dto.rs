use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Application, ApplicationStatus, StatusHistoryEntry};
use crate::services::application_service::ApplicationList;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateApplicationPayload {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    #[validate(length(min = 1))]
    pub applicant_name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentPayload {
    #[validate(length(min = 1))]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawPayload {
    pub applicant_id: Uuid,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub status: ApplicationStatus,
    pub status_history: Vec<StatusHistoryEntry>,
    pub notes: Option<String>,
    pub bot_processed_at: Option<DateTime<Utc>>,
    pub bot_processed_count: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Application> for ApplicationResponse {
    fn from(value: Application) -> Self {
        Self {
            id: value.id,
            job_id: value.job_id,
            applicant_id: value.applicant_id,
            applicant_name: value.applicant_name,
            status: value.status,
            status_history: value.status_history.0,
            notes: value.notes,
            bot_processed_at: value.bot_processed_at,
            bot_processed_count: value.bot_processed_count,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<ApplicationList> for ApplicationListResponse {
    fn from(value: ApplicationList) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            total: value.total,
            page: value.page,
            per_page: value.per_page,
            total_pages: value.total_pages,
        }
    }
}
