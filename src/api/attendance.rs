use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::attendance::{AttendanceResponse, AttendanceSheetRequest};
use crate::services::query_cache::{self, Mutation};

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceDayQuery {
    pub(crate) date: time::Date,
}

/// Records one day's sheet for a class. Each entry upserts, so re-submitting
/// a corrected sheet overwrites the earlier marks for that day.
pub(crate) async fn record_sheet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(class_id): Path<String>,
    Json(payload): Json<AttendanceSheetRequest>,
) -> Result<Json<Vec<AttendanceResponse>>, ApiError> {
    if payload.records.is_empty() {
        return Err(ApiError::BadRequest("Attendance sheet is empty".to_string()));
    }

    let class = repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?;
    if class.is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    let mut saved = Vec::with_capacity(payload.records.len());
    let now = primitive_now_utc();

    for entry in &payload.records {
        let student = repositories::students::find_by_id(state.db(), &entry.student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student"))?
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Unknown student '{}'", entry.student_id))
            })?;
        if student.class_id != class_id {
            return Err(ApiError::BadRequest(format!(
                "Student '{}' is not in this class",
                student.name
            )));
        }

        let record = repositories::attendance::upsert(
            state.db(),
            repositories::attendance::UpsertAttendance {
                id: &Uuid::new_v4().to_string(),
                student_id: &entry.student_id,
                class_id: &class_id,
                attended_on: payload.attended_on,
                status: entry.status,
                note: entry.note.as_deref(),
                recorded_by: &user.id,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record attendance"))?;

        saved.push(AttendanceResponse::from_db(record));
    }

    query_cache::invalidate(state.redis(), Mutation::AttendanceWrite).await;

    Ok(Json(saved))
}

pub(crate) async fn class_day(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(class_id): Path<String>,
    Query(query): Query<AttendanceDayQuery>,
) -> Result<Json<Vec<AttendanceResponse>>, ApiError> {
    let records = repositories::attendance::list_for_class_date(state.db(), &class_id, query.date)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attendance"))?;

    Ok(Json(records.into_iter().map(AttendanceResponse::from_db).collect()))
}

pub(crate) async fn student_history(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<AttendanceResponse>>, ApiError> {
    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?;
    if student.is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let records = repositories::attendance::list_for_student(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attendance"))?;

    Ok(Json(records.into_iter().map(AttendanceResponse::from_db).collect()))
}
