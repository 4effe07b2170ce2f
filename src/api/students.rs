use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::attendance;
use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::{default_limit, PaginatedResponse};
use crate::api::visitations;
use crate::core::state::AppState;
use crate::core::time::{current_year, primitive_now_utc};
use crate::db::models::Student;
use crate::repositories;
use crate::schemas::student::{
    BulkCommandsResponse, BulkDeleteRequest, BulkGraduateRequest, BulkMoveRequest,
    BulkPromoteRequest, BulkPromoteResponse, BulkResultResponse, BulkSelection, BulkTransferRequest,
    StudentCreate, StudentResponse, StudentUpdate,
};
use crate::services::bulk_actions;
use crate::services::query_cache::{self, Mutation};
use crate::services::roster_rules;

#[derive(Debug, Deserialize)]
pub(crate) struct StudentListQuery {
    #[serde(default)]
    pub(crate) class_id: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[serde(default)]
    pub(crate) grade: Option<i32>,
    #[serde(default)]
    pub(crate) include_inactive: bool,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/:student_id", get(get_student).patch(update_student))
        .route("/:student_id/attendance", get(attendance::student_history))
        .route(
            "/:student_id/visitations",
            get(visitations::list_for_student).post(visitations::create_note),
        )
        .route("/bulk/commands", post(bulk_commands))
        .route("/bulk/move", post(bulk_move))
        .route("/bulk/transfer", post(bulk_transfer))
        .route("/bulk/promote", post(bulk_promote))
        .route("/bulk/graduate", post(bulk_graduate))
        .route("/bulk/delete", post(bulk_delete))
}

async fn list_students(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<PaginatedResponse<StudentResponse>>, ApiError> {
    let filter = repositories::students::StudentFilter {
        class_id: query.class_id,
        department: query.department,
        grade: query.grade,
        include_inactive: query.include_inactive,
        skip: query.skip.max(0),
        limit: query.limit.clamp(1, 500),
    };

    let students = repositories::students::list(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;
    let total_count = repositories::students::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    Ok(Json(PaginatedResponse {
        items: students.into_iter().map(StudentResponse::from_db).collect(),
        total_count,
        skip: filter.skip,
        limit: filter.limit,
    }))
}

async fn create_student(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(payload): Json<StudentCreate>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let class = repositories::classes::find_by_id(state.db(), &payload.class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?;
    if class.is_none() {
        return Err(ApiError::BadRequest("Class does not exist".to_string()));
    }

    let now = primitive_now_utc();
    let student = repositories::students::create(
        state.db(),
        repositories::students::CreateStudent {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            grade: payload.grade,
            class_id: &payload.class_id,
            birthday: payload.birthday,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create student"))?;

    query_cache::invalidate(state.redis(), Mutation::StudentWrite).await;

    Ok((StatusCode::CREATED, Json(StudentResponse::from_db(student))))
}

async fn get_student(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(student_id): Path<String>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(StudentResponse::from_db(student)))
}

async fn update_student(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(student_id): Path<String>,
    Json(payload): Json<StudentUpdate>,
) -> Result<Json<StudentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?;
    if existing.is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    if let Some(class_id) = &payload.class_id {
        let class = repositories::classes::find_by_id(state.db(), class_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load class"))?;
        if class.is_none() {
            return Err(ApiError::BadRequest("Class does not exist".to_string()));
        }
    }

    repositories::students::update(
        state.db(),
        &student_id,
        repositories::students::UpdateStudent {
            name: payload.name,
            grade: payload.grade,
            class_id: payload.class_id,
            birthday: payload.birthday,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update student"))?;

    let student = repositories::students::fetch_one_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to reload student"))?;

    query_cache::invalidate(state.redis(), Mutation::StudentWrite).await;

    Ok(Json(StudentResponse::from_db(student)))
}

/// Which bulk commands apply to the current selection. An empty selection has
/// no action bar at all, hence 204 with no body.
async fn bulk_commands(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(payload): Json<BulkSelection>,
) -> Result<Response, ApiError> {
    if payload.student_ids.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let students = load_selection(&state, &payload.student_ids).await?;
    let commands = bulk_actions::available_commands(&students);

    Ok(Json(BulkCommandsResponse { commands, selected: students.len() }).into_response())
}

async fn bulk_move(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<BulkMoveRequest>,
) -> Result<Json<BulkResultResponse>, ApiError> {
    let students = require_selection(&state, &payload.student_ids).await?;

    let class = repositories::classes::find_by_id(state.db(), &payload.class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load target class"))?
        .ok_or_else(|| ApiError::BadRequest("Target class does not exist".to_string()))?;
    if !class.is_active {
        return Err(ApiError::BadRequest("Target class is not active".to_string()));
    }

    let ids: Vec<String> = students.into_iter().map(|student| student.id).collect();
    let affected =
        repositories::students::move_to_class(state.db(), &ids, &class.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to move students"))?;

    query_cache::invalidate(state.redis(), Mutation::StudentBulkMove).await;

    Ok(Json(BulkResultResponse { affected }))
}

async fn bulk_transfer(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<BulkTransferRequest>,
) -> Result<Json<BulkResultResponse>, ApiError> {
    let department = payload.department.trim();
    if department.is_empty() {
        return Err(ApiError::BadRequest("Department is required".to_string()));
    }

    let students = require_selection(&state, &payload.student_ids).await?;

    for student in &students {
        let class = repositories::classes::fetch_one_by_id(state.db(), &student.class_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student class"))?;
        if class.department == department {
            return Err(ApiError::BadRequest(format!(
                "Student '{}' is already in department '{department}'",
                student.name
            )));
        }
    }

    let year = current_year();
    let holding = repositories::classes::get_or_create_holding(
        state.db(),
        &Uuid::new_v4().to_string(),
        department,
        year,
        &roster_rules::holding_class_name(department),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to resolve holding class"))?;

    let ids: Vec<String> = students.into_iter().map(|student| student.id).collect();
    let affected =
        repositories::students::move_to_class(state.db(), &ids, &holding.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to transfer students"))?;

    query_cache::invalidate(state.redis(), Mutation::StudentBulkTransfer).await;

    Ok(Json(BulkResultResponse { affected }))
}

/// Promotes every selected student below graduation grade by one grade.
/// Students already at graduation grade are reported back untouched; they can
/// only leave the roster through graduation.
async fn bulk_promote(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<BulkPromoteRequest>,
) -> Result<Json<BulkPromoteResponse>, ApiError> {
    let students = require_selection(&state, &payload.student_ids).await?;

    let partition = roster_rules::partition_promotable(&students);
    if partition.promotable.is_empty() {
        return Err(ApiError::BadRequest(
            "No selected student can be promoted; they are all at graduation grade".to_string(),
        ));
    }

    let promoted = repositories::students::promote_grades(
        state.db(),
        &partition.promotable,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to promote students"))?;

    query_cache::invalidate(state.redis(), Mutation::StudentBulkPromote).await;

    Ok(Json(BulkPromoteResponse { promoted: promoted as usize, excluded: partition.excluded }))
}

/// Graduates the whole selection regardless of grade. Graduation deactivates
/// students and records the year; it never deletes.
async fn bulk_graduate(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<BulkGraduateRequest>,
) -> Result<Json<BulkResultResponse>, ApiError> {
    let students = require_selection(&state, &payload.student_ids).await?;

    if let Some(class_id) = &payload.target_class_id {
        let class = repositories::classes::find_by_id(state.db(), class_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load target class"))?;
        if class.is_none() {
            return Err(ApiError::BadRequest("Target class does not exist".to_string()));
        }
    }

    let ids: Vec<String> = students.into_iter().map(|student| student.id).collect();
    let affected = repositories::students::graduate(
        state.db(),
        &ids,
        payload.graduation_year,
        payload.target_class_id.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to graduate students"))?;

    query_cache::invalidate(state.redis(), Mutation::StudentBulkGraduate).await;

    Ok(Json(BulkResultResponse { affected }))
}

async fn bulk_delete(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<BulkResultResponse>, ApiError> {
    if !roster_rules::delete_confirmed(&payload.confirmation) {
        return Err(ApiError::BadRequest(
            "Deletion requires the exact confirmation phrase".to_string(),
        ));
    }

    let students = require_selection(&state, &payload.student_ids).await?;

    let ids: Vec<String> = students.into_iter().map(|student| student.id).collect();
    let affected = repositories::students::delete_many(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete students"))?;

    query_cache::invalidate(state.redis(), Mutation::StudentBulkDelete).await;

    Ok(Json(BulkResultResponse { affected }))
}

async fn require_selection(
    state: &AppState,
    student_ids: &[String],
) -> Result<Vec<Student>, ApiError> {
    if student_ids.is_empty() {
        return Err(ApiError::BadRequest("Selection is empty".to_string()));
    }
    load_selection(state, student_ids).await
}

async fn load_selection(state: &AppState, student_ids: &[String]) -> Result<Vec<Student>, ApiError> {
    let students = repositories::students::fetch_by_ids(state.db(), student_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load selected students"))?;

    if students.len() != student_ids.len() {
        return Err(ApiError::BadRequest("Selection contains unknown students".to_string()));
    }

    Ok(students)
}

#[cfg(test)]
mod tests;
