use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::attendance;
use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::class::{ClassCreate, ClassResponse, ClassUpdate, DepartmentListResponse};
use crate::services::query_cache::{self, Mutation};

#[derive(Debug, Deserialize)]
pub(crate) struct ClassListQuery {
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[serde(default)]
    pub(crate) year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentQuery {
    #[serde(default)]
    pub(crate) year: Option<i32>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route(
            "/:class_id",
            get(get_class).patch(update_class).delete(delete_class),
        )
        .route(
            "/:class_id/attendance",
            get(attendance::class_day).post(attendance::record_sheet),
        )
}

async fn list_classes(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ClassListQuery>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    let classes = repositories::classes::list_with_counts(
        state.db(),
        repositories::classes::ClassFilter { department: query.department, year: query.year },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list classes"))?;

    Ok(Json(classes.into_iter().map(ClassResponse::from_counted).collect()))
}

async fn create_class(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<ClassCreate>,
) -> Result<(StatusCode, Json<ClassResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if let Some(teacher_id) = &payload.main_teacher_id {
        let teacher = repositories::users::find_by_id(state.db(), teacher_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load teacher"))?;
        if teacher.is_none() {
            return Err(ApiError::BadRequest("Main teacher does not exist".to_string()));
        }
    }

    let now = primitive_now_utc();
    let class = repositories::classes::create(
        state.db(),
        repositories::classes::CreateClass {
            id: &Uuid::new_v4().to_string(),
            name: &payload.name,
            department: &payload.department,
            year: payload.year,
            main_teacher_id: payload.main_teacher_id.as_deref(),
            is_holding: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create class"))?;

    query_cache::invalidate(state.redis(), Mutation::ClassWrite).await;

    Ok((StatusCode::CREATED, Json(ClassResponse::from_db(class))))
}

async fn get_class(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(class_id): Path<String>,
) -> Result<Json<ClassResponse>, ApiError> {
    let class = repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    Ok(Json(ClassResponse::from_db(class)))
}

async fn update_class(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(class_id): Path<String>,
    Json(payload): Json<ClassUpdate>,
) -> Result<Json<ClassResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::classes::find_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?;
    if existing.is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    repositories::classes::update(
        state.db(),
        &class_id,
        repositories::classes::UpdateClass {
            name: payload.name,
            department: payload.department,
            main_teacher_id: payload.main_teacher_id,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update class"))?;

    let class = repositories::classes::fetch_one_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to reload class"))?;

    query_cache::invalidate(state.redis(), Mutation::ClassWrite).await;

    Ok(Json(ClassResponse::from_db(class)))
}

async fn delete_class(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(class_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let filter = repositories::students::StudentFilter {
        class_id: Some(class_id.clone()),
        department: None,
        grade: None,
        include_inactive: true,
        skip: 0,
        limit: 1,
    };
    let remaining = repositories::students::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count class students"))?;
    if remaining > 0 {
        return Err(ApiError::Conflict("Class still has students assigned".to_string()));
    }

    let deleted = repositories::classes::delete(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete class"))?;
    if !deleted {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    query_cache::invalidate(state.redis(), Mutation::ClassWrite).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Department names are derived from classes, never stored standalone. The
/// listing is cached per year for a few minutes.
pub(crate) async fn departments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<DepartmentQuery>,
) -> Result<Json<DepartmentListResponse>, ApiError> {
    if let Some(cached) = query_cache::cached_departments(state.redis(), query.year).await {
        return Ok(Json(DepartmentListResponse { departments: cached }));
    }

    let departments = repositories::classes::list_departments(state.db(), query.year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list departments"))?;

    query_cache::store_departments(state.redis(), query.year, &departments).await;

    Ok(Json(DepartmentListResponse { departments }))
}

#[cfg(test)]
mod tests;
