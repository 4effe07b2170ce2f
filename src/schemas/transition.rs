use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionCreate {
    #[serde(alias = "fromYear")]
    pub(crate) from_year: i32,
    #[serde(alias = "toYear")]
    pub(crate) to_year: i32,
}

/// Proposed next-year placements, applied incrementally. Re-sending a student
/// replaces their earlier proposal.
#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentsRequest {
    pub(crate) assignments: Vec<AssignmentEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentEntry {
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
}
