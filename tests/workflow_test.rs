use apptrack_backend::error::Error;
use apptrack_backend::models::actor::{Actor, ActorRole};
use apptrack_backend::models::application::{Application, ApplicationStatus};
use apptrack_backend::workflow::policy::{RandomSource, TransitionPolicy};
use apptrack_backend::workflow::transition::{self, TransitionEffect};
use uuid::Uuid;

struct FixedDraws {
    draws: Vec<f64>,
    next: usize,
}

impl FixedDraws {
    fn new(draws: &[f64]) -> Self {
        Self {
            draws: draws.to_vec(),
            next: 0,
        }
    }
}

impl RandomSource for FixedDraws {
    fn next_f64(&mut self) -> f64 {
        let value = self.draws[self.next % self.draws.len()];
        self.next += 1;
        value
    }
}

fn admin() -> Actor {
    Actor::new(Some(Uuid::new_v4()), "Riley Admin", ActorRole::Admin)
}

fn fresh_application() -> Application {
    Application::new(Uuid::new_v4(), Uuid::new_v4(), "Alex Candidate", None)
}

fn application_in(status: ApplicationStatus) -> Application {
    let mut app = fresh_application();
    let path: &[ApplicationStatus] = match status {
        ApplicationStatus::Submitted => &[],
        ApplicationStatus::UnderReview => &[ApplicationStatus::UnderReview],
        ApplicationStatus::Shortlisted => &[
            ApplicationStatus::UnderReview,
            ApplicationStatus::Shortlisted,
        ],
        ApplicationStatus::Accepted => &[
            ApplicationStatus::UnderReview,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Accepted,
        ],
        ApplicationStatus::Rejected => &[
            ApplicationStatus::UnderReview,
            ApplicationStatus::Rejected,
        ],
        ApplicationStatus::Withdrawn => &[],
    };
    for step in path {
        transition::apply_manual(&mut app, *step, &admin(), None).unwrap();
    }
    app
}

#[test]
fn submitted_has_a_single_forced_next_status() {
    // Automated driver.
    let mut rng = FixedDraws::new(&[0.99]);
    assert_eq!(
        TransitionPolicy::decide(ApplicationStatus::Submitted, &mut rng),
        Some(ApplicationStatus::UnderReview)
    );

    // Manual driver: everything except under-review is refused.
    for target in [
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ] {
        let mut app = application_in(ApplicationStatus::Submitted);
        let err = transition::apply_manual(&mut app, target, &admin(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)), "{target} should be refused");
    }
    let mut app = application_in(ApplicationStatus::Submitted);
    transition::apply_manual(&mut app, ApplicationStatus::UnderReview, &admin(), None).unwrap();
    assert_eq!(app.status, ApplicationStatus::UnderReview);
}

#[test]
fn shortlisted_draw_below_threshold_rejects_with_bot_attribution() {
    let mut app = application_in(ApplicationStatus::Shortlisted);
    let history_before = app.history().len();

    let mut rng = FixedDraws::new(&[0.10]);
    let next = TransitionPolicy::decide(app.status, &mut rng).unwrap();
    assert_eq!(next, ApplicationStatus::Rejected);

    let bot = Actor::bot_unattended();
    transition::append_transition(&mut app, next, &bot, Some("Not moving forward.".into()));

    assert_eq!(app.status, ApplicationStatus::Rejected);
    assert_eq!(app.history().len(), history_before + 1);
    let last = app.last_history_entry().unwrap();
    assert_eq!(last.changed_by_role, ActorRole::BotMimic);
    assert_eq!(last.changed_by_name, "Auto Bot Mimic");
    assert!(last.changed_by.is_none());
}

#[test]
fn accepted_records_are_closed_to_both_drivers() {
    let mut app = application_in(ApplicationStatus::Accepted);
    let history_before = app.history().len();

    // Automated: policy has nowhere to take it.
    let mut rng = FixedDraws::new(&[0.5]);
    assert_eq!(TransitionPolicy::decide(app.status, &mut rng), None);
    assert!(!app.status.is_bot_eligible());

    // Manual: refused as terminal.
    let err = transition::apply_manual(&mut app, ApplicationStatus::UnderReview, &admin(), None)
        .unwrap_err();
    assert!(matches!(err, Error::TerminalState(_)));
    assert_eq!(app.history().len(), history_before);
}

#[test]
fn history_grows_by_exactly_one_per_transition() {
    let mut app = fresh_application();
    assert_eq!(app.history().len(), 1);

    for (i, step) in [
        ApplicationStatus::UnderReview,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Accepted,
    ]
    .into_iter()
    .enumerate()
    {
        transition::apply_manual(&mut app, step, &admin(), None).unwrap();
        assert_eq!(app.history().len(), i + 2);
        assert_eq!(app.last_history_entry().unwrap().status, app.status);
    }
}

#[test]
fn same_status_request_keeps_history_but_takes_the_comment() {
    let mut app = application_in(ApplicationStatus::UnderReview);
    let history_before = app.history().len();
    let effect = transition::apply_manual(
        &mut app,
        ApplicationStatus::UnderReview,
        &admin(),
        Some("second look scheduled".into()),
    )
    .unwrap();
    assert_eq!(effect, TransitionEffect::CommentOnly);
    assert_eq!(app.history().len(), history_before);
    assert_eq!(app.status, ApplicationStatus::UnderReview);
}

#[test]
fn withdrawn_applications_cannot_be_advanced_by_anyone() {
    let mut app = application_in(ApplicationStatus::UnderReview);
    let applicant = Actor::applicant(app.applicant_id, app.applicant_name.clone());
    transition::apply_withdrawal(&mut app, &applicant, Some("Accepted another offer".into()))
        .unwrap();
    assert_eq!(app.status, ApplicationStatus::Withdrawn);

    let mut rng = FixedDraws::new(&[0.5]);
    assert_eq!(TransitionPolicy::decide(app.status, &mut rng), None);

    let err = transition::apply_manual(&mut app, ApplicationStatus::UnderReview, &admin(), None)
        .unwrap_err();
    assert!(matches!(err, Error::TerminalState(_)));
}

#[test]
fn under_review_branches_on_the_20_percent_threshold() {
    let mut low = FixedDraws::new(&[0.1999]);
    assert_eq!(
        TransitionPolicy::decide(ApplicationStatus::UnderReview, &mut low),
        Some(ApplicationStatus::Rejected)
    );
    let mut high = FixedDraws::new(&[0.20]);
    assert_eq!(
        TransitionPolicy::decide(ApplicationStatus::UnderReview, &mut high),
        Some(ApplicationStatus::Shortlisted)
    );
}

#[test]
fn rejected_reopens_to_review_then_follows_the_normal_path() {
    let mut app = application_in(ApplicationStatus::Rejected);
    transition::apply_manual(&mut app, ApplicationStatus::UnderReview, &admin(), None).unwrap();
    transition::apply_manual(&mut app, ApplicationStatus::Shortlisted, &admin(), None).unwrap();
    transition::apply_manual(&mut app, ApplicationStatus::Accepted, &admin(), None).unwrap();
    assert_eq!(app.status, ApplicationStatus::Accepted);

    let statuses: Vec<_> = app.history().iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            ApplicationStatus::Submitted,
            ApplicationStatus::UnderReview,
            ApplicationStatus::Rejected,
            ApplicationStatus::UnderReview,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Accepted,
        ]
    );
}
