use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Class, ClassWithCount};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassCreate {
    #[validate(length(min = 1, max = 120))]
    pub(crate) name: String,
    #[validate(length(min = 1, max = 120))]
    pub(crate) department: String,
    pub(crate) year: i32,
    #[serde(default)]
    #[serde(alias = "mainTeacherId")]
    pub(crate) main_teacher_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 120))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 120))]
    pub(crate) department: Option<String>,
    #[serde(default)]
    #[serde(alias = "mainTeacherId")]
    pub(crate) main_teacher_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) department: String,
    pub(crate) year: i32,
    pub(crate) main_teacher_id: Option<String>,
    pub(crate) is_holding: bool,
    pub(crate) is_active: bool,
    pub(crate) student_count: Option<i64>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ClassResponse {
    pub(crate) fn from_db(class: Class) -> Self {
        Self {
            id: class.id,
            name: class.name,
            department: class.department,
            year: class.year,
            main_teacher_id: class.main_teacher_id,
            is_holding: class.is_holding,
            is_active: class.is_active,
            student_count: None,
            created_at: format_primitive(class.created_at),
            updated_at: format_primitive(class.updated_at),
        }
    }

    pub(crate) fn from_counted(class: ClassWithCount) -> Self {
        Self {
            id: class.id,
            name: class.name,
            department: class.department,
            year: class.year,
            main_teacher_id: class.main_teacher_id,
            is_holding: class.is_holding,
            is_active: class.is_active,
            student_count: Some(class.student_count),
            created_at: format_primitive(class.created_at),
            updated_at: format_primitive(class.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DepartmentListResponse {
    pub(crate) departments: Vec<String>,
}
