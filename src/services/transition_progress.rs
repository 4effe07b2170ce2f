use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::YearTransitionLog;
use crate::db::types::TransitionStatus;

/// Read model derived from a year-transition log. The tracker itself never
/// mutates the log; it only computes what the workflow screens need to gate
/// their actions on.
#[derive(Debug, Serialize)]
pub(crate) struct TransitionView {
    pub(crate) id: String,
    pub(crate) from_year: i32,
    pub(crate) to_year: i32,
    pub(crate) status: TransitionStatus,
    pub(crate) classes_created: bool,
    pub(crate) total_students: i32,
    pub(crate) assigned_students: i32,
    pub(crate) assignment_progress: u8,
    pub(crate) confirmed: bool,
    pub(crate) executed: bool,
    pub(crate) can_execute: bool,
    pub(crate) error_message: Option<String>,
    pub(crate) started_at: Option<String>,
    pub(crate) completed_at: Option<String>,
}

impl TransitionView {
    pub(crate) fn from_log(log: YearTransitionLog) -> Self {
        let assignment_progress =
            assignment_progress(log.assigned_students, log.total_students);
        let confirmed = log.confirmed_at.is_some();
        let executed = log.executed_at.is_some();
        let can_execute =
            confirmed && log.classes_created && !executed && !log.status.is_terminal();

        Self {
            id: log.id,
            from_year: log.from_year,
            to_year: log.to_year,
            status: log.status,
            classes_created: log.classes_created,
            total_students: log.total_students,
            assigned_students: log.assigned_students,
            assignment_progress,
            confirmed,
            executed,
            can_execute,
            error_message: log.error_message,
            started_at: log.started_at.map(format_primitive),
            completed_at: log.completed_at.map(format_primitive),
        }
    }
}

/// Percentage of students with a proposed next-year assignment, rounded and
/// clamped to [0, 100]. Zero when there is nothing to assign.
pub(crate) fn assignment_progress(assigned: i32, total: i32) -> u8 {
    if total <= 0 {
        return 0;
    }

    let ratio = f64::from(assigned.max(0)) / f64::from(total);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
