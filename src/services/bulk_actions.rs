use serde::Serialize;

use crate::db::models::Student;
use crate::services::roster_rules::GRADUATION_GRADE;

/// Commands the bulk action bar may surface for a selection. Each is a pure
/// trigger; invoking one opens the matching confirmation step, never a
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum BulkCommand {
    MoveToClass,
    TransferDepartment,
    PromoteGrade,
    Graduate,
    Delete,
}

/// Commands available for the given selection. An empty selection yields no
/// commands at all; graduate appears only when the selection contains a
/// student at graduation grade.
pub(crate) fn available_commands(students: &[Student]) -> Vec<BulkCommand> {
    if students.is_empty() {
        return Vec::new();
    }

    let mut commands = vec![
        BulkCommand::MoveToClass,
        BulkCommand::TransferDepartment,
        BulkCommand::PromoteGrade,
    ];

    if students.iter().any(|student| student.grade >= GRADUATION_GRADE) {
        commands.push(BulkCommand::Graduate);
    }

    commands.push(BulkCommand::Delete);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn student(id: &str, grade: i32) -> Student {
        let now = primitive_now_utc();
        Student {
            id: id.to_string(),
            name: format!("Student {id}"),
            grade,
            class_id: "class-1".to_string(),
            is_active: true,
            graduation_year: None,
            birthday: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_selection_yields_nothing() {
        assert!(available_commands(&[]).is_empty());
    }

    #[test]
    fn graduate_hidden_without_graduation_grade_students() {
        let commands = available_commands(&[student("a", 4), student("b", 5)]);
        assert!(!commands.contains(&BulkCommand::Graduate));
        assert!(commands.contains(&BulkCommand::MoveToClass));
        assert!(commands.contains(&BulkCommand::TransferDepartment));
        assert!(commands.contains(&BulkCommand::PromoteGrade));
        assert!(commands.contains(&BulkCommand::Delete));
    }

    #[test]
    fn graduate_shown_when_selection_has_grade_six() {
        let commands = available_commands(&[student("a", 4), student("b", 6)]);
        assert!(commands.contains(&BulkCommand::Graduate));
    }
}
