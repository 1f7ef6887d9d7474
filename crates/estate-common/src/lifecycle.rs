//! Interaction lifecycle.
//!
//! ```text
//!             start            complete
//!   pending ───────> in_progress ───────> completed
//!      │  ╲              │   ▲
//!      │   ╲ pause       │   │ resume
//!      │    ╲            ▼   │
//!      │     ╲──────> paused ─────────> ended
//!      │                                   ▲
//!      └────────── complete / end ─────────┘
//! ```
//!
//! `completed` and `ended` are terminal. Re-applying the current status is a
//! no-op. Open interactions (`pending`, `in_progress`) that have not been
//! touched for longer than the overdue threshold are reported as overdue.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::enums::InteractionStatus;

/// Days without an update after which an open interaction counts as overdue.
pub const DEFAULT_OVERDUE_DAYS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot {action} an interaction that is {from}")]
pub struct TransitionError {
    pub action: &'static str,
    pub from: InteractionStatus,
    pub to: InteractionStatus,
}

impl InteractionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Ended)
    }

    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    pub fn can_transition_to(self, next: InteractionStatus) -> bool {
        use InteractionStatus::*;

        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, InProgress | Completed | Paused | Ended)
                | (InProgress, Completed | Paused | Ended)
                | (Paused, InProgress | Ended)
        )
    }

    /// Move to `next`, or explain why the move is not allowed.
    pub fn transition(self, next: InteractionStatus) -> Result<InteractionStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                action: "move to",
                from: self,
                to: next,
            })
        }
    }
}

/// A named lifecycle request against a single interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleAction {
    Start,
    Complete,
    Pause { reason: String },
    Resume,
    End { reason: String },
}

impl LifecycleAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Pause { .. } => "pause",
            Self::Resume => "resume",
            Self::End { .. } => "end",
        }
    }

    pub fn target(&self) -> InteractionStatus {
        match self {
            Self::Start | Self::Resume => InteractionStatus::InProgress,
            Self::Complete => InteractionStatus::Completed,
            Self::Pause { .. } => InteractionStatus::Paused,
            Self::End { .. } => InteractionStatus::Ended,
        }
    }

    /// Resolve the status this action leads to from `current`.
    ///
    /// `start` only applies to work that has not been paused, and `resume`
    /// only applies to paused work; everything else follows the transition
    /// table.
    pub fn apply(&self, current: InteractionStatus) -> Result<InteractionStatus, TransitionError> {
        let target = self.target();
        let allowed = match self {
            Self::Start => current.is_open(),
            Self::Resume => current == InteractionStatus::Paused,
            _ => current.can_transition_to(target),
        };
        if allowed {
            Ok(target)
        } else {
            Err(TransitionError {
                action: self.name(),
                from: current,
                to: target,
            })
        }
    }
}

/// The instant before which an open interaction's last update makes it overdue.
/// Saturates at the earliest representable instant for huge thresholds.
pub fn overdue_cutoff(now: DateTime<Utc>, threshold_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(threshold_days))
        .and_then(|days| now.checked_sub_signed(days))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn is_overdue(
    status: InteractionStatus,
    updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
    threshold_days: u32,
) -> bool {
    status.is_open() && updated_at < overdue_cutoff(now, threshold_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use InteractionStatus::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transition_table() {
        let allowed = [
            (Pending, InProgress),
            (Pending, Completed),
            (Pending, Paused),
            (Pending, Ended),
            (InProgress, Completed),
            (InProgress, Paused),
            (InProgress, Ended),
            (Paused, InProgress),
            (Paused, Ended),
        ];
        for from in InteractionStatus::ALL {
            for to in InteractionStatus::ALL {
                let expected = from == to || allowed.contains(&(*from, *to));
                assert_eq!(
                    from.can_transition_to(*to),
                    expected,
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_cannot_reopen() {
        assert!(Completed.is_terminal());
        assert!(Ended.is_terminal());
        let err = Completed.transition(InProgress).unwrap_err();
        assert_eq!(err.from, Completed);
        assert_eq!(err.to, InProgress);
        assert!(Ended.transition(Paused).is_err());
    }

    #[test]
    fn test_paused_cannot_complete_directly() {
        assert!(Paused.transition(Completed).is_err());
        assert_eq!(
            LifecycleAction::Resume.apply(Paused).unwrap(),
            InProgress
        );
    }

    #[test]
    fn test_resume_requires_paused() {
        let err = LifecycleAction::Resume.apply(Pending).unwrap_err();
        assert_eq!(err.action, "resume");
        assert_eq!(err.to_string(), "Cannot resume an interaction that is pending");
    }

    #[test]
    fn test_start_rejects_paused_and_terminal() {
        assert_eq!(LifecycleAction::Start.apply(Pending).unwrap(), InProgress);
        assert_eq!(LifecycleAction::Start.apply(InProgress).unwrap(), InProgress);
        assert!(LifecycleAction::Start.apply(Paused).is_err());
        assert!(LifecycleAction::Start.apply(Completed).is_err());
    }

    #[test]
    fn test_pause_and_end_targets() {
        let pause = LifecycleAction::Pause {
            reason: "customer travelling".into(),
        };
        assert_eq!(pause.apply(InProgress).unwrap(), Paused);
        let end = LifecycleAction::End {
            reason: "bought elsewhere".into(),
        };
        assert_eq!(end.apply(Paused).unwrap(), Ended);
        assert!(end.apply(Completed).is_err());
    }

    #[test]
    fn test_overdue_only_for_open_interactions() {
        let now = Utc::now();
        let stale = now - Duration::days(21);
        let fresh = now - Duration::days(19);

        assert!(is_overdue(Pending, stale, now, DEFAULT_OVERDUE_DAYS));
        assert!(is_overdue(InProgress, stale, now, DEFAULT_OVERDUE_DAYS));
        assert!(!is_overdue(Pending, fresh, now, DEFAULT_OVERDUE_DAYS));
        assert!(!is_overdue(Paused, stale, now, DEFAULT_OVERDUE_DAYS));
        assert!(!is_overdue(Completed, stale, now, DEFAULT_OVERDUE_DAYS));
        assert!(!is_overdue(Ended, stale, now, DEFAULT_OVERDUE_DAYS));
    }

    #[test]
    fn test_overdue_boundary_is_strict() {
        let now = Utc::now();
        let exactly = overdue_cutoff(now, 20);
        assert!(!is_overdue(Pending, exactly, now, 20));
        assert!(is_overdue(Pending, exactly - Duration::seconds(1), now, 20));
    }

    #[test]
    fn test_huge_threshold_saturates() {
        let now = Utc::now();
        assert_eq!(overdue_cutoff(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
        assert!(!is_overdue(Pending, now - Duration::days(365 * 100), now, 100_000_000));
    }
}
