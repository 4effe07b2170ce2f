use serde::{Deserialize, Serialize};
use time::Date;

use crate::core::time::format_primitive;
use crate::db::models::AttendanceRecord;
use crate::db::types::AttendanceStatus;

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceSheetRequest {
    #[serde(alias = "attendedOn")]
    pub(crate) attended_on: Date,
    pub(crate) records: Vec<AttendanceSheetEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceSheetEntry {
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
    pub(crate) status: AttendanceStatus,
    #[serde(default)]
    pub(crate) note: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) class_id: String,
    pub(crate) attended_on: Date,
    pub(crate) status: AttendanceStatus,
    pub(crate) note: Option<String>,
    pub(crate) recorded_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AttendanceResponse {
    pub(crate) fn from_db(record: AttendanceRecord) -> Self {
        Self {
            id: record.id,
            student_id: record.student_id,
            class_id: record.class_id,
            attended_on: record.attended_on,
            status: record.status,
            note: record.note,
            recorded_by: record.recorded_by,
            created_at: format_primitive(record.created_at),
            updated_at: format_primitive(record.updated_at),
        }
    }
}
