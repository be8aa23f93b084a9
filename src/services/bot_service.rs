use crate::config::get_config;
use crate::dto::bot_dto::{BatchOutcome, ProcessDetail, ProcessOutcome};
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::application::{Application, ApplicationStatus};
use crate::models::audit_entry::{AuditAction, NewAuditEntry};
use crate::models::job::JOB_TYPE_TECHNICAL;
use crate::services::application_service::ApplicationService;
use crate::services::audit_service::AuditService;
use crate::services::automation_service::AutomationService;
use crate::workflow::policy::{RandomSource, ThreadRngSource, TransitionPolicy};
use crate::workflow::transition;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

const APPLICATION_COLUMNS: &str = "a.id, a.job_id, a.applicant_id, a.applicant_name, a.status, \
     a.status_history, a.notes, a.bot_processed_at, a.bot_processed_count, a.created_at, a.updated_at";

/// Canned rationale attached to automated transitions, keyed by the status
/// the record lands in. Picked by rotation, not randomness: the policy is
/// the only random draw in the system.
fn rationale(outcome: ApplicationStatus, rotation: i32) -> &'static str {
    let pool: &[&str] = match outcome {
        ApplicationStatus::UnderReview => &[
            "Initial screening looks fine, moving into review.",
            "Profile meets the basic requirements, starting review.",
            "Queued for reviewer attention.",
        ],
        ApplicationStatus::Shortlisted => &[
            "Strong technical background, adding to the shortlist.",
            "Experience matches the role, shortlisting.",
            "Good fit on paper, shortlisted for interviews.",
        ],
        ApplicationStatus::Accepted => &[
            "Interview feedback was positive, extending an offer.",
            "Final review cleared, marking as accepted.",
        ],
        ApplicationStatus::Rejected => &[
            "Competition for this role was strong, closing the application.",
            "Profile does not match the current requirements.",
            "Not moving forward at this time.",
        ],
        ApplicationStatus::Submitted | ApplicationStatus::Withdrawn => &["Automated update."],
    };
    pool[rotation.unsigned_abs() as usize % pool.len()]
}

/// The automated "mimic" driver: a recurring sweep plus on-demand
/// single/batch triggers, all funneled through the same transition path as
/// manual admin changes.
#[derive(Clone)]
pub struct BotService {
    pool: PgPool,
    applications: ApplicationService,
    automation: AutomationService,
    audit: AuditService,
    scheduler: Arc<Mutex<Option<JobScheduler>>>,
}

impl BotService {
    pub fn new(
        pool: PgPool,
        applications: ApplicationService,
        automation: AutomationService,
        audit: AuditService,
    ) -> Self {
        Self {
            pool,
            applications,
            automation,
            audit,
            scheduler: Arc::new(Mutex::new(None)),
        }
    }

    /// Advance one already-loaded application, if the policy has anywhere to
    /// take it. Returns the previous status and the updated record.
    async fn advance_application(
        &self,
        app: Application,
        actor: &Actor,
        rng: &mut dyn RandomSource,
    ) -> Result<Option<(ApplicationStatus, Application)>> {
        if !app.status.is_bot_eligible() {
            return Ok(None);
        }
        let Some(next) = TransitionPolicy::decide(app.status, rng) else {
            return Ok(None);
        };

        let mut app = app;
        let previous = app.status;
        let comment = rationale(next, app.bot_processed_count);
        let entry =
            transition::append_transition(&mut app, next, actor, Some(comment.to_string()));
        let updated = self
            .applications
            .persist_transition(app.id, next, &entry, true)
            .await?;

        self.audit
            .record(
                NewAuditEntry::new(
                    actor.clone(),
                    AuditAction::ApplicationStatusUpdated,
                    format!(
                        "{} advanced the application of {} from {} to {}",
                        actor.name, updated.applicant_name, previous, next
                    ),
                )
                .target(
                    "application",
                    updated.id.to_string(),
                    Some(updated.applicant_name.clone()),
                )
                .metadata(json!({
                    "previous_status": previous.as_str(),
                    "new_status": next.as_str(),
                    "comment": comment,
                    "automated": true,
                })),
            )
            .await;

        Ok(Some((previous, updated)))
    }

    /// On-demand advance of one application, caller-attributed.
    pub async fn process_single(&self, id: Uuid, actor: &Actor) -> Result<Application> {
        let app = self
            .applications
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;

        let job_type: Option<String> =
            sqlx::query_scalar("SELECT job_type FROM jobs WHERE id = $1")
                .bind(app.job_id)
                .fetch_optional(&self.pool)
                .await?;
        if job_type.as_deref() != Some(JOB_TYPE_TECHNICAL) {
            return Err(Error::NoEligibleTransition(
                "Application is not on a technical-track job".to_string(),
            ));
        }

        let mut rng = ThreadRngSource;
        match self.advance_application(app, actor, &mut rng).await? {
            Some((_, updated)) => Ok(updated),
            None => Err(Error::NoEligibleTransition(
                "Application status cannot be advanced automatically".to_string(),
            )),
        }
    }

    /// On-demand batch advance. Per-item failure is partial failure: the
    /// call itself always succeeds and reports itemized results.
    pub async fn process_batch(
        &self,
        status_filter: Option<ApplicationStatus>,
        limit: Option<i64>,
        actor: &Actor,
    ) -> Result<BatchOutcome> {
        let config = get_config();
        let limit = limit.unwrap_or(config.bot_batch_size).clamp(1, 50);
        let pacing = Duration::from_millis(config.bot_pacing_ms);

        let candidates = self.select_eligible(status_filter, limit).await?;
        let mut rng = ThreadRngSource;
        let mut outcome = BatchOutcome::default();

        for app in candidates {
            let id = app.id;
            let before = app.status;
            match self.advance_application(app, actor, &mut rng).await {
                Ok(Some((previous, updated))) => {
                    outcome.absorb(ProcessDetail {
                        application_id: id,
                        outcome: ProcessOutcome::Processed,
                        previous_status: Some(previous),
                        new_status: Some(updated.status),
                        error: None,
                    });
                }
                Ok(None) => {
                    outcome.absorb(ProcessDetail {
                        application_id: id,
                        outcome: ProcessOutcome::Skipped,
                        previous_status: Some(before),
                        new_status: None,
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(application_id = %id, error = ?e, "bot failed to advance application");
                    outcome.absorb(ProcessDetail {
                        application_id: id,
                        outcome: ProcessOutcome::Failed,
                        previous_status: Some(before),
                        new_status: None,
                        error: Some(e.to_string()),
                    });
                }
            }
            // Emulate human pacing between records.
            tokio::time::sleep(pacing).await;
        }

        Ok(outcome)
    }

    /// One scheduled sweep. Reads the persisted gate fresh every time; no
    /// process-local caching, so toggles apply within one interval.
    pub async fn tick(&self) {
        let settings = match self.automation.get().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(error = ?e, "bot tick could not read automation settings");
                return;
            }
        };
        if !settings.enabled {
            return;
        }

        let batch_size = get_config().bot_batch_size;
        match self
            .process_batch(None, Some(batch_size), &Actor::bot_unattended())
            .await
        {
            Ok(outcome) => {
                if outcome.processed + outcome.failed + outcome.skipped > 0 {
                    tracing::info!(
                        processed = outcome.processed,
                        failed = outcome.failed,
                        skipped = outcome.skipped,
                        "bot sweep finished"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = ?e, "bot sweep failed");
            }
        }
    }

    async fn select_eligible(
        &self,
        status_filter: Option<ApplicationStatus>,
        limit: i64,
    ) -> Result<Vec<Application>> {
        let statuses: Vec<ApplicationStatus> = match status_filter {
            Some(status) if status.is_bot_eligible() => vec![status],
            Some(_) => return Ok(Vec::new()),
            None => vec![
                ApplicationStatus::Submitted,
                ApplicationStatus::UnderReview,
                ApplicationStatus::Shortlisted,
            ],
        };

        let apps = sqlx::query_as::<_, Application>(&format!(
            r#"
            SELECT {}
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE j.job_type = $1 AND a.status = ANY($2)
            ORDER BY a.bot_processed_at ASC NULLS FIRST, a.created_at ASC
            LIMIT $3
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(JOB_TYPE_TECHNICAL)
        .bind(&statuses)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(apps)
    }

    /// Start the recurring sweep. Calling twice is a no-op; the loop stays
    /// alive for the process lifetime and the persisted flag decides whether
    /// a tick does anything.
    pub async fn start_scheduler(&self) -> Result<()> {
        let mut guard = self.scheduler.lock().await;
        if guard.is_some() {
            tracing::debug!("bot scheduler already running");
            return Ok(());
        }

        let tick_seconds = get_config().bot_tick_seconds;
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| Error::Internal(format!("scheduler init failed: {}", e)))?;

        let service = self.clone();
        let job = Job::new_repeated_async(Duration::from_secs(tick_seconds), move |_id, _lock| {
            let service = service.clone();
            Box::pin(async move {
                service.tick().await;
            })
        })
        .map_err(|e| Error::Internal(format!("scheduler job setup failed: {}", e)))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| Error::Internal(format!("scheduler add failed: {}", e)))?;
        scheduler
            .start()
            .await
            .map_err(|e| Error::Internal(format!("scheduler start failed: {}", e)))?;

        *guard = Some(scheduler);
        tracing::info!(interval_seconds = tick_seconds, "bot scheduler started");
        Ok(())
    }

    /// Cancel the recurring sweep. Used at process shutdown only; pausing is
    /// the persisted enable flag, not scheduler teardown.
    pub async fn stop_scheduler(&self) -> Result<()> {
        let mut guard = self.scheduler.lock().await;
        if let Some(mut scheduler) = guard.take() {
            scheduler
                .shutdown()
                .await
                .map_err(|e| Error::Internal(format!("scheduler shutdown failed: {}", e)))?;
            tracing::info!("bot scheduler stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rationale_rotates_through_the_pool() {
        let first = rationale(ApplicationStatus::Shortlisted, 0);
        let second = rationale(ApplicationStatus::Shortlisted, 1);
        let wrapped = rationale(ApplicationStatus::Shortlisted, 3);
        assert_ne!(first, second);
        assert_eq!(first, wrapped);
    }

    #[test]
    fn every_outcome_has_a_rationale() {
        for status in ApplicationStatus::ALL {
            assert!(!rationale(status, 0).is_empty());
        }
    }
}
