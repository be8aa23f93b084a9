use crate::dto::application_dto::ApplicationListQuery;
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::application::{Application, ApplicationStatus, StatusHistoryEntry};
use crate::models::audit_entry::{AuditAction, NewAuditEntry};
use crate::models::job::Job;
use crate::services::audit_service::AuditService;
use crate::workflow::transition::{self, TransitionEffect};
use serde_json::json;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, applicant_name, status, \
     status_history, notes, bot_processed_at, bot_processed_count, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ApplicationList {
    pub items: Vec<Application>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    audit: AuditService,
}

impl ApplicationService {
    pub fn new(pool: PgPool, audit: AuditService) -> Self {
        Self { pool, audit }
    }

    pub async fn create(
        &self,
        job: &Job,
        applicant_id: Uuid,
        applicant_name: String,
        notes: Option<String>,
    ) -> Result<Application> {
        let app = Application::new(job.id, applicant_id, applicant_name, notes);
        let inserted = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications
                (id, job_id, applicant_id, applicant_name, status, status_history, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(app.id)
        .bind(app.job_id)
        .bind(app.applicant_id)
        .bind(&app.applicant_name)
        .bind(app.status)
        .bind(&app.status_history)
        .bind(&app.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::BadRequest(
                "This applicant has already applied to this job".to_string(),
            ),
            other => Error::from(other),
        })?;

        self.audit
            .record(
                NewAuditEntry::new(
                    Actor::applicant(inserted.applicant_id, inserted.applicant_name.clone()),
                    AuditAction::ApplicationCreated,
                    format!(
                        "{} applied for {}",
                        inserted.applicant_name, job.title
                    ),
                )
                .target(
                    "application",
                    inserted.id.to_string(),
                    Some(inserted.applicant_name.clone()),
                )
                .metadata(json!({
                    "job_id": job.id,
                    "job_title": job.title,
                    "job_type": job.job_type,
                })),
            )
            .await;

        Ok(inserted)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Application>> {
        let app = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(app)
    }

    async fn get_required(&self, id: Uuid) -> Result<Application> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))
    }

    pub async fn list(&self, query: &ApplicationListQuery) -> Result<ApplicationList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(25).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM applications WHERE 1=1");
        if let Some(status) = query.status {
            count_qb.push(" AND status = ");
            count_qb.push_bind(status);
        }
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM applications WHERE 1=1",
            APPLICATION_COLUMNS
        ));
        if let Some(status) = query.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }
        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(per_page);
        qb.push(" OFFSET ");
        qb.push_bind(offset);
        let items = qb
            .build_query_as::<Application>()
            .fetch_all(&self.pool)
            .await?;

        let total_pages = (total + per_page - 1) / per_page;
        Ok(ApplicationList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Admin-issued status change. Same-status requests fold into a
    /// comment-only update.
    pub async fn apply_status(
        &self,
        id: Uuid,
        actor: &Actor,
        new_status: ApplicationStatus,
        comment: Option<String>,
    ) -> Result<Application> {
        let mut app = self.get_required(id).await?;
        let previous = app.status;

        match transition::apply_manual(&mut app, new_status, actor, comment.clone())? {
            TransitionEffect::CommentOnly => {
                if let Some(comment) = comment {
                    self.set_comment(id, comment).await
                } else {
                    Ok(app)
                }
            }
            TransitionEffect::Transitioned(entry) => {
                let updated = self.persist_transition(id, new_status, &entry, false).await?;
                self.audit
                    .record(
                        NewAuditEntry::new(
                            actor.clone(),
                            AuditAction::ApplicationStatusUpdated,
                            format!(
                                "{} moved the application of {} from {} to {}",
                                actor.name, updated.applicant_name, previous, new_status
                            ),
                        )
                        .target(
                            "application",
                            updated.id.to_string(),
                            Some(updated.applicant_name.clone()),
                        )
                        .metadata(json!({
                            "previous_status": previous.as_str(),
                            "new_status": new_status.as_str(),
                            "comment": entry.comment,
                            "automated": false,
                        })),
                    )
                    .await;
                Ok(updated)
            }
        }
    }

    /// Notes are metadata, not workflow: always legal, terminal or not.
    pub async fn set_comment(&self, id: Uuid, comment: String) -> Result<Application> {
        let app = sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET notes = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(comment)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        Ok(app)
    }

    pub async fn withdraw(
        &self,
        id: Uuid,
        applicant_id: Uuid,
        comment: Option<String>,
    ) -> Result<Application> {
        let mut app = self.get_required(id).await?;
        if app.applicant_id != applicant_id {
            return Err(Error::Unauthorized(
                "Only the owning applicant may withdraw an application".to_string(),
            ));
        }
        let previous = app.status;
        let actor = Actor::applicant(applicant_id, app.applicant_name.clone());
        let entry = transition::apply_withdrawal(&mut app, &actor, comment)?;
        let updated = self
            .persist_transition(id, ApplicationStatus::Withdrawn, &entry, false)
            .await?;

        self.audit
            .record(
                NewAuditEntry::new(
                    actor,
                    AuditAction::ApplicationWithdrawn,
                    format!(
                        "{} withdrew their application",
                        updated.applicant_name
                    ),
                )
                .target(
                    "application",
                    updated.id.to_string(),
                    Some(updated.applicant_name.clone()),
                )
                .metadata(json!({
                    "previous_status": previous.as_str(),
                    "new_status": ApplicationStatus::Withdrawn.as_str(),
                })),
            )
            .await;

        Ok(updated)
    }

    /// One atomic write: status plus history append, optionally touching the
    /// bot markers. Shared by the manual and automated drivers.
    pub async fn persist_transition(
        &self,
        id: Uuid,
        new_status: ApplicationStatus,
        entry: &StatusHistoryEntry,
        touch_bot_marker: bool,
    ) -> Result<Application> {
        let app = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = $2,
                status_history = status_history || $3,
                bot_processed_at = CASE WHEN $4 THEN NOW() ELSE bot_processed_at END,
                bot_processed_count = bot_processed_count + CASE WHEN $4 THEN 1 ELSE 0 END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(new_status)
        .bind(Json(entry))
        .bind(touch_bot_marker)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        Ok(app)
    }

    pub async fn status_counts(&self) -> Result<HashMap<String, i64>> {
        let rows: Vec<(ApplicationStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM applications GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(status, count)| (status.as_str().to_string(), count))
            .collect())
    }
}
