use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{AttendanceStatus, TransitionStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Class {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) department: String,
    pub(crate) year: i32,
    pub(crate) main_teacher_id: Option<String>,
    pub(crate) is_holding: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Class row joined with its active-student count for listings.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ClassWithCount {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) department: String,
    pub(crate) year: i32,
    pub(crate) main_teacher_id: Option<String>,
    pub(crate) is_holding: bool,
    pub(crate) is_active: bool,
    pub(crate) student_count: i64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) grade: i32,
    pub(crate) class_id: String,
    pub(crate) is_active: bool,
    pub(crate) graduation_year: Option<i32>,
    pub(crate) birthday: Option<Date>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AttendanceRecord {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) class_id: String,
    pub(crate) attended_on: Date,
    pub(crate) status: AttendanceStatus,
    pub(crate) note: Option<String>,
    pub(crate) recorded_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct VisitationNote {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) visited_on: Date,
    pub(crate) note: String,
    pub(crate) visited_by: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct YearTransitionLog {
    pub(crate) id: String,
    pub(crate) from_year: i32,
    pub(crate) to_year: i32,
    pub(crate) status: TransitionStatus,
    pub(crate) classes_created: bool,
    pub(crate) total_students: i32,
    pub(crate) assigned_students: i32,
    pub(crate) confirmed_at: Option<PrimitiveDateTime>,
    pub(crate) executed_at: Option<PrimitiveDateTime>,
    pub(crate) started_at: Option<PrimitiveDateTime>,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) error_message: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TransitionAssignment {
    pub(crate) id: String,
    pub(crate) transition_id: String,
    pub(crate) student_id: String,
    pub(crate) class_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserPreference {
    pub(crate) user_id: String,
    pub(crate) key: String,
    pub(crate) value: Json<serde_json::Value>,
    pub(crate) updated_at: PrimitiveDateTime,
}
