use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::application::ApplicationStatus;
use crate::models::automation::AutomationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessOutcome {
    Processed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDetail {
    pub application_id: Uuid,
    pub outcome: ProcessOutcome,
    pub previous_status: Option<ApplicationStatus>,
    pub new_status: Option<ApplicationStatus>,
    pub error: Option<String>,
}

/// Itemized result of a batch run. One failing item never fails the batch;
/// it is counted here instead.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchOutcome {
    pub processed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub details: Vec<ProcessDetail>,
}

impl BatchOutcome {
    pub fn absorb(&mut self, detail: ProcessDetail) {
        match detail.outcome {
            ProcessOutcome::Processed => self.processed += 1,
            ProcessOutcome::Failed => self.failed += 1,
            ProcessOutcome::Skipped => self.skipped += 1,
        }
        self.details.push(detail);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProcessBatchPayload {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationStatusResponse {
    pub enabled: bool,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl From<AutomationSettings> for AutomationStatusResponse {
    fn from(value: AutomationSettings) -> Self {
        Self {
            enabled: value.enabled,
            last_modified_by: value.last_modified_by,
            last_modified_at: value.last_modified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(outcome: ProcessOutcome, error: Option<&str>) -> ProcessDetail {
        ProcessDetail {
            application_id: Uuid::new_v4(),
            outcome,
            previous_status: Some(ApplicationStatus::UnderReview),
            new_status: match outcome {
                ProcessOutcome::Processed => Some(ApplicationStatus::Shortlisted),
                _ => None,
            },
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn one_failure_in_ten_is_counted_not_fatal() {
        let mut outcome = BatchOutcome::default();
        for _ in 0..9 {
            outcome.absorb(detail(ProcessOutcome::Processed, None));
        }
        outcome.absorb(detail(ProcessOutcome::Failed, Some("connection reset")));

        assert_eq!(outcome.processed, 9);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.details.len(), 10);
        let failed: Vec<_> = outcome
            .details
            .iter()
            .filter(|d| d.outcome == ProcessOutcome::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].new_status.is_none());
    }

    #[test]
    fn skipped_items_are_reported_separately() {
        let mut outcome = BatchOutcome::default();
        outcome.absorb(detail(ProcessOutcome::Processed, None));
        outcome.absorb(detail(ProcessOutcome::Skipped, None));
        assert_eq!((outcome.processed, outcome.failed, outcome.skipped), (1, 0, 1));
    }
}
