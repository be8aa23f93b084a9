use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::application::{Application, ApplicationStatus, StatusHistoryEntry};
use crate::workflow::policy::TransitionPolicy;

/// Outcome of applying a requested status against a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Status changed and a history entry was appended.
    Transitioned(StatusHistoryEntry),
    /// Same-status request; only the comment is taken, history untouched.
    CommentOnly,
}

/// Statuses an administrator may move a record to from `status`. Matches the
/// automated table, with one addition: a rejected application can be pulled
/// back into review. `accepted` and `withdrawn` stay closed for everyone.
pub fn manual_candidates(status: ApplicationStatus) -> &'static [ApplicationStatus] {
    match status {
        ApplicationStatus::Rejected => &[ApplicationStatus::UnderReview],
        other => TransitionPolicy::candidates(other),
    }
}

/// The single history-append path. Both drivers go through here so manual
/// and automated transitions cannot drift apart.
pub fn append_transition(
    application: &mut Application,
    new_status: ApplicationStatus,
    actor: &Actor,
    comment: Option<String>,
) -> StatusHistoryEntry {
    let entry = StatusHistoryEntry::new(new_status, actor, comment);
    application.status_history.0.push(entry.clone());
    application.status = new_status;
    entry
}

/// Admin-issued status change. Same-status requests are idempotent
/// comment-only updates; terminal records refuse any actual change.
pub fn apply_manual(
    application: &mut Application,
    new_status: ApplicationStatus,
    actor: &Actor,
    comment: Option<String>,
) -> Result<TransitionEffect> {
    if new_status == ApplicationStatus::Withdrawn {
        return Err(Error::InvalidTransition(
            "withdrawal is an applicant operation, not an admin status change".to_string(),
        ));
    }
    if new_status == application.status {
        return Ok(TransitionEffect::CommentOnly);
    }
    if application.status.is_terminal() {
        return Err(Error::TerminalState(format!(
            "application is {} and accepts no further status changes",
            application.status
        )));
    }
    if !manual_candidates(application.status).contains(&new_status) {
        return Err(Error::InvalidTransition(format!(
            "cannot move from {} to {}",
            application.status, new_status
        )));
    }
    let entry = append_transition(application, new_status, actor, comment);
    Ok(TransitionEffect::Transitioned(entry))
}

/// Applicant-issued withdrawal. Legal from any non-terminal status.
pub fn apply_withdrawal(
    application: &mut Application,
    actor: &Actor,
    comment: Option<String>,
) -> Result<StatusHistoryEntry> {
    if application.status.is_terminal() {
        return Err(Error::TerminalState(format!(
            "application is {} and can no longer be withdrawn",
            application.status
        )));
    }
    Ok(append_transition(
        application,
        ApplicationStatus::Withdrawn,
        actor,
        comment,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::actor::ActorRole;
    use uuid::Uuid;

    fn admin() -> Actor {
        Actor::new(Some(Uuid::new_v4()), "Jordan Admin", ActorRole::Admin)
    }

    fn app_in(status: ApplicationStatus) -> Application {
        let mut app = Application::new(Uuid::new_v4(), Uuid::new_v4(), "Sam Applicant", None);
        if status != ApplicationStatus::Submitted {
            append_transition(&mut app, status, &Actor::system(), None);
        }
        app
    }

    #[test]
    fn new_application_has_exactly_one_system_entry() {
        let app = Application::new(Uuid::new_v4(), Uuid::new_v4(), "Sam Applicant", None);
        assert_eq!(app.status, ApplicationStatus::Submitted);
        assert_eq!(app.history().len(), 1);
        let first = &app.history()[0];
        assert_eq!(first.status, ApplicationStatus::Submitted);
        assert_eq!(first.changed_by_role, ActorRole::System);
    }

    #[test]
    fn submitted_cannot_jump_to_shortlisted() {
        let mut app = app_in(ApplicationStatus::Submitted);
        let err = apply_manual(
            &mut app,
            ApplicationStatus::Shortlisted,
            &admin(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert_eq!(app.status, ApplicationStatus::Submitted);
        assert_eq!(app.history().len(), 1);
    }

    #[test]
    fn each_transition_appends_exactly_one_entry() {
        let mut app = app_in(ApplicationStatus::Submitted);
        let before = app.history().len();
        let effect =
            apply_manual(&mut app, ApplicationStatus::UnderReview, &admin(), None).unwrap();
        assert!(matches!(effect, TransitionEffect::Transitioned(_)));
        assert_eq!(app.history().len(), before + 1);
        assert_eq!(app.status, ApplicationStatus::UnderReview);
        assert_eq!(
            app.last_history_entry().map(|e| e.status),
            Some(ApplicationStatus::UnderReview)
        );
    }

    #[test]
    fn same_status_is_comment_only() {
        let mut app = app_in(ApplicationStatus::UnderReview);
        let before = app.history().len();
        let effect = apply_manual(
            &mut app,
            ApplicationStatus::UnderReview,
            &admin(),
            Some("still reviewing".to_string()),
        )
        .unwrap();
        assert_eq!(effect, TransitionEffect::CommentOnly);
        assert_eq!(app.history().len(), before);
    }

    #[test]
    fn accepted_is_terminal_for_admins() {
        let mut app = app_in(ApplicationStatus::Accepted);
        let err =
            apply_manual(&mut app, ApplicationStatus::Rejected, &admin(), None).unwrap_err();
        assert!(matches!(err, Error::TerminalState(_)));
    }

    #[test]
    fn rejected_can_be_reopened_but_not_accepted_directly() {
        let mut app = app_in(ApplicationStatus::Rejected);
        let err =
            apply_manual(&mut app, ApplicationStatus::Accepted, &admin(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));

        let effect =
            apply_manual(&mut app, ApplicationStatus::UnderReview, &admin(), None).unwrap();
        assert!(matches!(effect, TransitionEffect::Transitioned(_)));
        assert_eq!(app.status, ApplicationStatus::UnderReview);
    }

    #[test]
    fn withdrawal_is_not_an_admin_status() {
        let mut app = app_in(ApplicationStatus::UnderReview);
        let err =
            apply_manual(&mut app, ApplicationStatus::Withdrawn, &admin(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[test]
    fn withdrawal_succeeds_from_active_status_and_is_terminal_after() {
        let mut app = app_in(ApplicationStatus::Shortlisted);
        let applicant = Actor::applicant(app.applicant_id, "Sam Applicant");
        let entry = apply_withdrawal(&mut app, &applicant, None).unwrap();
        assert_eq!(entry.status, ApplicationStatus::Withdrawn);
        assert_eq!(app.status, ApplicationStatus::Withdrawn);

        let err = apply_withdrawal(&mut app, &applicant, None).unwrap_err();
        assert!(matches!(err, Error::TerminalState(_)));
    }

    #[test]
    fn history_order_is_preserved_across_transitions() {
        let mut app = app_in(ApplicationStatus::Submitted);
        apply_manual(&mut app, ApplicationStatus::UnderReview, &admin(), None).unwrap();
        apply_manual(&mut app, ApplicationStatus::Shortlisted, &admin(), None).unwrap();
        apply_manual(&mut app, ApplicationStatus::Accepted, &admin(), None).unwrap();
        let statuses: Vec<_> = app.history().iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                ApplicationStatus::Submitted,
                ApplicationStatus::UnderReview,
                ApplicationStatus::Shortlisted,
                ApplicationStatus::Accepted,
            ]
        );
    }
}
