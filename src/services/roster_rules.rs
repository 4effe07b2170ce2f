use crate::db::models::Student;

/// Grade at which a student can no longer be promoted and must graduate.
pub(crate) const GRADUATION_GRADE: i32 = 6;

/// Literal phrase required to enable a bulk delete. A single fixed string;
/// deliberately not parameterized by selection count.
pub(crate) const DELETE_CONFIRMATION_PHRASE: &str = "permanently delete the selected students";

/// Outcome of splitting a selection into promotable students and those that
/// have to be graduated instead.
#[derive(Debug)]
pub(crate) struct PromotionPartition {
    pub(crate) promotable: Vec<String>,
    pub(crate) excluded: Vec<String>,
}

pub(crate) fn partition_promotable(students: &[Student]) -> PromotionPartition {
    let mut promotable = Vec::new();
    let mut excluded = Vec::new();

    for student in students {
        if promoted_grade(student.grade).is_some() {
            promotable.push(student.id.clone());
        } else {
            excluded.push(student.id.clone());
        }
    }

    PromotionPartition { promotable, excluded }
}

/// Grade after a single promotion step, or `None` for students at or past
/// graduation grade (promotion is never applied to them).
pub(crate) fn promoted_grade(grade: i32) -> Option<i32> {
    if (0..GRADUATION_GRADE).contains(&grade) {
        Some(grade + 1)
    } else {
        None
    }
}

/// Exact match only; surrounding whitespace does not count as confirmation.
pub(crate) fn delete_confirmed(input: &str) -> bool {
    input == DELETE_CONFIRMATION_PHRASE
}

pub(crate) fn holding_class_name(department: &str) -> String {
    format!("{department} Unassigned")
}
