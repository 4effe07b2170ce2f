use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Student;
use crate::services::bulk_actions::BulkCommand;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentCreate {
    #[validate(length(min = 1, max = 200))]
    pub(crate) name: String,
    #[validate(range(min = 0, max = 6))]
    pub(crate) grade: i32,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
    #[serde(default)]
    pub(crate) birthday: Option<Date>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 6))]
    pub(crate) grade: Option<i32>,
    #[serde(default)]
    #[serde(alias = "classId")]
    pub(crate) class_id: Option<String>,
    #[serde(default)]
    pub(crate) birthday: Option<Date>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) grade: i32,
    pub(crate) class_id: String,
    pub(crate) is_active: bool,
    pub(crate) graduation_year: Option<i32>,
    pub(crate) birthday: Option<Date>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl StudentResponse {
    pub(crate) fn from_db(student: Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            grade: student.grade,
            class_id: student.class_id,
            is_active: student.is_active,
            graduation_year: student.graduation_year,
            birthday: student.birthday,
            created_at: format_primitive(student.created_at),
            updated_at: format_primitive(student.updated_at),
        }
    }
}

/// Shared shape of every bulk request: the ids the caller has selected.
#[derive(Debug, Deserialize)]
pub(crate) struct BulkSelection {
    #[serde(alias = "studentIds")]
    pub(crate) student_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkCommandsResponse {
    pub(crate) commands: Vec<BulkCommand>,
    pub(crate) selected: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkMoveRequest {
    #[serde(alias = "studentIds")]
    pub(crate) student_ids: Vec<String>,
    #[serde(alias = "classId")]
    pub(crate) class_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkTransferRequest {
    #[serde(alias = "studentIds")]
    pub(crate) student_ids: Vec<String>,
    pub(crate) department: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkPromoteRequest {
    #[serde(alias = "studentIds")]
    pub(crate) student_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkPromoteResponse {
    pub(crate) promoted: usize,
    pub(crate) excluded: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkGraduateRequest {
    #[serde(alias = "studentIds")]
    pub(crate) student_ids: Vec<String>,
    #[serde(alias = "graduationYear")]
    pub(crate) graduation_year: i32,
    #[serde(default)]
    #[serde(alias = "targetClassId")]
    pub(crate) target_class_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkDeleteRequest {
    #[serde(alias = "studentIds")]
    pub(crate) student_ids: Vec<String>,
    pub(crate) confirmation: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkResultResponse {
    pub(crate) affected: u64,
}
