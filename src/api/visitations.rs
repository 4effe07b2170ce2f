use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::visitation::{VisitationCreate, VisitationResponse};
use crate::services::query_cache::{self, Mutation};

pub(crate) async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(student_id): Path<String>,
    Json(payload): Json<VisitationCreate>,
) -> Result<(StatusCode, Json<VisitationResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?;
    if student.is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let note = repositories::visitations::create(
        state.db(),
        repositories::visitations::CreateVisitation {
            id: &Uuid::new_v4().to_string(),
            student_id: &student_id,
            visited_on: payload.visited_on,
            note: &payload.note,
            visited_by: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create visitation note"))?;

    query_cache::invalidate(state.redis(), Mutation::VisitationWrite).await;

    Ok((StatusCode::CREATED, Json(VisitationResponse::from_db(note))))
}

pub(crate) async fn list_for_student(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<VisitationResponse>>, ApiError> {
    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?;
    if student.is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let notes = repositories::visitations::list_for_student(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list visitation notes"))?;

    Ok(Json(notes.into_iter().map(VisitationResponse::from_db).collect()))
}
