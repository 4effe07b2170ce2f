use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Teacher,
}

/// Lifecycle of a year-transition log. Progression is monotonic except for
/// the explicit rollback exit out of `InProgress` or `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "transitionstatus", rename_all = "snake_case")]
pub(crate) enum TransitionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    RolledBack,
}

impl TransitionStatus {
    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::RolledBack)
    }

    pub(crate) fn can_advance_to(self, next: TransitionStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::InProgress) => true,
            (Self::InProgress, Self::Completed) => true,
            (Self::InProgress, Self::Failed) => true,
            (Self::InProgress, Self::RolledBack) => true,
            (Self::Completed, Self::RolledBack) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "attendancestatus", rename_all = "lowercase")]
pub(crate) enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[cfg(test)]
mod tests {
    use super::TransitionStatus;

    #[test]
    fn forward_transitions_are_legal() {
        assert!(TransitionStatus::Pending.can_advance_to(TransitionStatus::InProgress));
        assert!(TransitionStatus::InProgress.can_advance_to(TransitionStatus::Completed));
        assert!(TransitionStatus::InProgress.can_advance_to(TransitionStatus::Failed));
    }

    #[test]
    fn rollback_is_the_only_backward_exit() {
        assert!(TransitionStatus::InProgress.can_advance_to(TransitionStatus::RolledBack));
        assert!(TransitionStatus::Completed.can_advance_to(TransitionStatus::RolledBack));
        assert!(!TransitionStatus::Completed.can_advance_to(TransitionStatus::InProgress));
        assert!(!TransitionStatus::Completed.can_advance_to(TransitionStatus::Pending));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for next in [
            TransitionStatus::Pending,
            TransitionStatus::InProgress,
            TransitionStatus::Completed,
            TransitionStatus::Failed,
            TransitionStatus::RolledBack,
        ] {
            assert!(!TransitionStatus::Failed.can_advance_to(next));
            assert!(!TransitionStatus::RolledBack.can_advance_to(next));
        }
    }

    #[test]
    fn skipping_pending_is_illegal() {
        assert!(!TransitionStatus::Pending.can_advance_to(TransitionStatus::Completed));
        assert!(!TransitionStatus::Pending.can_advance_to(TransitionStatus::RolledBack));
    }
}
