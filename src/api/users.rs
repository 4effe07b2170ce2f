use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::user::{TeacherCreate, UserResponse};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Serialize)]
struct PreferenceResponse {
    key: String,
    value: serde_json::Value,
    updated_at: String,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teachers).post(create_teacher))
        .route("/me/preferences", get(list_preferences))
        .route(
            "/me/preferences/:key",
            get(get_preference).put(put_preference).delete(delete_preference),
        )
}

async fn list_teachers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let teachers = repositories::users::list_teachers(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list teachers"))?;

    Ok(Json(teachers.into_iter().map(UserResponse::from_db).collect()))
}

async fn create_teacher(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<TeacherCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if !payload.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let existing = repositories::users::find_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &payload.email,
            hashed_password,
            full_name: &payload.full_name,
            role: UserRole::Teacher,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create teacher"))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn list_preferences(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PreferenceResponse>>, ApiError> {
    let preferences = repositories::preferences::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list preferences"))?;

    let items = preferences
        .into_iter()
        .map(|pref| PreferenceResponse {
            key: pref.key,
            value: pref.value.0,
            updated_at: format_primitive(pref.updated_at),
        })
        .collect();

    Ok(Json(items))
}

async fn get_preference(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key): Path<String>,
) -> Result<Json<PreferenceResponse>, ApiError> {
    let pref = repositories::preferences::find(state.db(), &user.id, &key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load preference"))?
        .ok_or_else(|| ApiError::NotFound("Preference not found".to_string()))?;

    Ok(Json(PreferenceResponse {
        key: pref.key,
        value: pref.value.0,
        updated_at: format_primitive(pref.updated_at),
    }))
}

async fn put_preference(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Result<Json<PreferenceResponse>, ApiError> {
    if key.is_empty() || key.len() > 120 {
        return Err(ApiError::BadRequest("Invalid preference key".to_string()));
    }

    let saved =
        repositories::preferences::upsert(state.db(), &user.id, &key, value, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to save preference"))?;

    Ok(Json(PreferenceResponse {
        key: saved.key,
        value: saved.value.0,
        updated_at: format_primitive(saved.updated_at),
    }))
}

async fn delete_preference(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::preferences::delete(state.db(), &user.id, &key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete preference"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Preference not found".to_string()))
    }
}
