use rand::Rng;

use crate::models::application::ApplicationStatus;

pub const REJECTION_WEIGHT_UNDER_REVIEW: f64 = 0.20;
pub const REJECTION_WEIGHT_SHORTLISTED: f64 = 0.15;

/// Injectable randomness. The transition policy is the only consumer of
/// randomness in the whole service; tests swap in deterministic sources.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send {
    /// Uniform draw in [0, 1).
    fn next_f64(&mut self) -> f64;
}

pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen()
    }
}

/// The fixed transition table. Pure decisions, no state, no side effects.
pub struct TransitionPolicy;

impl TransitionPolicy {
    /// Statuses the automated driver may move a record to from `status`.
    pub fn candidates(status: ApplicationStatus) -> &'static [ApplicationStatus] {
        match status {
            ApplicationStatus::Submitted => &[ApplicationStatus::UnderReview],
            ApplicationStatus::UnderReview => {
                &[ApplicationStatus::Shortlisted, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Shortlisted => {
                &[ApplicationStatus::Accepted, ApplicationStatus::Rejected]
            }
            ApplicationStatus::Accepted
            | ApplicationStatus::Rejected
            | ApplicationStatus::Withdrawn => &[],
        }
    }

    pub fn rejection_weight(status: ApplicationStatus) -> Option<f64> {
        match status {
            ApplicationStatus::UnderReview => Some(REJECTION_WEIGHT_UNDER_REVIEW),
            ApplicationStatus::Shortlisted => Some(REJECTION_WEIGHT_SHORTLISTED),
            _ => None,
        }
    }

    /// Pick the next status for an automated advance. A single candidate is
    /// returned deterministically; with two, a draw strictly below the
    /// rejection weight selects the rejected branch.
    pub fn decide(
        status: ApplicationStatus,
        rng: &mut dyn RandomSource,
    ) -> Option<ApplicationStatus> {
        match status {
            ApplicationStatus::Submitted => Some(ApplicationStatus::UnderReview),
            ApplicationStatus::UnderReview => Some(Self::weighted(
                ApplicationStatus::Shortlisted,
                REJECTION_WEIGHT_UNDER_REVIEW,
                rng,
            )),
            ApplicationStatus::Shortlisted => Some(Self::weighted(
                ApplicationStatus::Accepted,
                REJECTION_WEIGHT_SHORTLISTED,
                rng,
            )),
            _ => None,
        }
    }

    fn weighted(
        forward: ApplicationStatus,
        rejection_weight: f64,
        rng: &mut dyn RandomSource,
    ) -> ApplicationStatus {
        if rng.next_f64() < rejection_weight {
            ApplicationStatus::Rejected
        } else {
            forward
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    struct SeededSource(StdRng);

    impl RandomSource for SeededSource {
        fn next_f64(&mut self) -> f64 {
            self.0.gen()
        }
    }

    #[test]
    fn submitted_only_moves_to_under_review() {
        assert_eq!(
            TransitionPolicy::candidates(ApplicationStatus::Submitted),
            &[ApplicationStatus::UnderReview]
        );
        let mut rng = MockRandomSource::new();
        // Deterministic branch, the source must not be consulted.
        rng.expect_next_f64().times(0);
        assert_eq!(
            TransitionPolicy::decide(ApplicationStatus::Submitted, &mut rng),
            Some(ApplicationStatus::UnderReview)
        );
    }

    #[test]
    fn terminal_statuses_have_no_candidates() {
        for status in [
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ] {
            assert!(TransitionPolicy::candidates(status).is_empty());
            let mut rng = MockRandomSource::new();
            rng.expect_next_f64().times(0);
            assert_eq!(TransitionPolicy::decide(status, &mut rng), None);
        }
    }

    #[test]
    fn shortlisted_draw_below_weight_rejects() {
        let mut rng = MockRandomSource::new();
        rng.expect_next_f64().times(1).return_const(0.10);
        assert_eq!(
            TransitionPolicy::decide(ApplicationStatus::Shortlisted, &mut rng),
            Some(ApplicationStatus::Rejected)
        );
    }

    #[test]
    fn shortlisted_draw_at_or_above_weight_accepts() {
        let mut rng = MockRandomSource::new();
        rng.expect_next_f64().times(1).return_const(0.15);
        assert_eq!(
            TransitionPolicy::decide(ApplicationStatus::Shortlisted, &mut rng),
            Some(ApplicationStatus::Accepted)
        );
    }

    #[test]
    fn under_review_draw_below_weight_rejects() {
        let mut rng = MockRandomSource::new();
        rng.expect_next_f64().times(1).return_const(0.199);
        assert_eq!(
            TransitionPolicy::decide(ApplicationStatus::UnderReview, &mut rng),
            Some(ApplicationStatus::Rejected)
        );
    }

    #[test]
    fn under_review_rejection_rate_converges() {
        let mut rng = SeededSource(StdRng::seed_from_u64(42));
        let trials = 10_000;
        let mut rejected = 0;
        for _ in 0..trials {
            if TransitionPolicy::decide(ApplicationStatus::UnderReview, &mut rng)
                == Some(ApplicationStatus::Rejected)
            {
                rejected += 1;
            }
        }
        let rate = rejected as f64 / trials as f64;
        assert!(
            (rate - REJECTION_WEIGHT_UNDER_REVIEW).abs() < 0.02,
            "empirical rejection rate {} too far from {}",
            rate,
            REJECTION_WEIGHT_UNDER_REVIEW
        );
    }

    #[test]
    fn shortlisted_rejection_rate_converges() {
        let mut rng = SeededSource(StdRng::seed_from_u64(7));
        let trials = 10_000;
        let mut rejected = 0;
        for _ in 0..trials {
            if TransitionPolicy::decide(ApplicationStatus::Shortlisted, &mut rng)
                == Some(ApplicationStatus::Rejected)
            {
                rejected += 1;
            }
        }
        let rate = rejected as f64 / trials as f64;
        assert!(
            (rate - REJECTION_WEIGHT_SHORTLISTED).abs() < 0.02,
            "empirical rejection rate {} too far from {}",
            rate,
            REJECTION_WEIGHT_SHORTLISTED
        );
    }
}
