use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::YearTransitionLog;
use crate::db::types::TransitionStatus;
use crate::repositories;
use crate::schemas::transition::{AssignmentsRequest, TransitionCreate};
use crate::services::query_cache::{self, Mutation};
use crate::services::roster_rules::{self, GRADUATION_GRADE};
use crate::services::transition_progress::TransitionView;

#[derive(Debug, Serialize)]
struct AssignmentResponse {
    student_id: String,
    class_id: String,
    created_at: String,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_transition))
        .route("/:transition_id", get(get_transition))
        .route("/years/:from_year/:to_year", get(get_by_years))
        .route("/:transition_id/create-classes", post(create_classes))
        .route("/:transition_id/assignments", get(list_assignments).post(put_assignments))
        .route("/:transition_id/confirm", post(confirm))
        .route("/:transition_id/execute", post(execute))
        .route("/:transition_id/rollback", post(rollback))
}

async fn create_transition(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(payload): Json<TransitionCreate>,
) -> Result<(StatusCode, Json<TransitionView>), ApiError> {
    if payload.to_year != payload.from_year + 1 {
        return Err(ApiError::BadRequest(
            "A transition must target the year after its source year".to_string(),
        ));
    }

    let existing =
        repositories::transitions::find_by_years(state.db(), payload.from_year, payload.to_year)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing transition"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "A transition for these years already exists".to_string(),
        ));
    }

    let total = repositories::students::count_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    let log = repositories::transitions::create(
        state.db(),
        repositories::transitions::CreateTransition {
            id: &Uuid::new_v4().to_string(),
            from_year: payload.from_year,
            to_year: payload.to_year,
            total_students: total as i32,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create transition"))?;

    query_cache::invalidate(state.redis(), Mutation::TransitionStep).await;

    Ok((StatusCode::CREATED, Json(TransitionView::from_log(log))))
}

async fn get_transition(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(transition_id): Path<String>,
) -> Result<Json<TransitionView>, ApiError> {
    let log = load_transition(&state, &transition_id).await?;
    Ok(Json(TransitionView::from_log(log)))
}

async fn get_by_years(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path((from_year, to_year)): Path<(i32, i32)>,
) -> Result<Json<TransitionView>, ApiError> {
    let log = repositories::transitions::find_by_years(state.db(), from_year, to_year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load transition"))?
        .ok_or_else(|| ApiError::NotFound("Transition not found".to_string()))?;

    Ok(Json(TransitionView::from_log(log)))
}

/// Copies every active non-holding class of the source year into the target
/// year and opens the transition for assignments.
async fn create_classes(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(transition_id): Path<String>,
) -> Result<Json<TransitionView>, ApiError> {
    let log = load_transition(&state, &transition_id).await?;

    if log.classes_created {
        return Err(ApiError::Conflict("Classes were already created".to_string()));
    }
    if !log.status.can_advance_to(TransitionStatus::InProgress) {
        return Err(ApiError::Conflict(format!(
            "Cannot create classes while the transition is {:?}",
            log.status
        )));
    }

    let source_classes = repositories::classes::list_active_by_year(state.db(), log.from_year)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list source classes"))?;

    let now = primitive_now_utc();
    for class in source_classes.iter().filter(|class| !class.is_holding) {
        repositories::classes::create(
            state.db(),
            repositories::classes::CreateClass {
                id: &Uuid::new_v4().to_string(),
                name: &class.name,
                department: &class.department,
                year: log.to_year,
                main_teacher_id: class.main_teacher_id.as_deref(),
                is_holding: false,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create next-year class"))?;
    }

    repositories::transitions::mark_classes_created(state.db(), &transition_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to mark classes created"))?;

    query_cache::invalidate(state.redis(), Mutation::TransitionStep).await;
    query_cache::invalidate(state.redis(), Mutation::ClassWrite).await;

    let log = load_transition(&state, &transition_id).await?;
    Ok(Json(TransitionView::from_log(log)))
}

/// Upserts proposed placements. The assigned count on the log is recomputed
/// from the assignment table after every batch, so progress never drifts.
async fn put_assignments(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(transition_id): Path<String>,
    Json(payload): Json<AssignmentsRequest>,
) -> Result<Json<TransitionView>, ApiError> {
    if payload.assignments.is_empty() {
        return Err(ApiError::BadRequest("No assignments provided".to_string()));
    }

    let log = load_transition(&state, &transition_id).await?;
    if !log.classes_created {
        return Err(ApiError::Conflict(
            "Create next-year classes before assigning students".to_string(),
        ));
    }
    if log.executed_at.is_some() || log.status.is_terminal() {
        return Err(ApiError::Conflict("Transition can no longer be edited".to_string()));
    }

    let now = primitive_now_utc();
    for entry in &payload.assignments {
        let student = repositories::students::find_by_id(state.db(), &entry.student_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student"))?
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Unknown student '{}'", entry.student_id))
            })?;
        if !student.is_active {
            return Err(ApiError::BadRequest(format!(
                "Student '{}' is not active",
                student.name
            )));
        }

        let class = repositories::classes::find_by_id(state.db(), &entry.class_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load class"))?
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown class '{}'", entry.class_id)))?;
        if class.year != log.to_year {
            return Err(ApiError::BadRequest(format!(
                "Class '{}' does not belong to year {}",
                class.name, log.to_year
            )));
        }

        repositories::transitions::upsert_assignment(
            state.db(),
            repositories::transitions::UpsertAssignment {
                id: &Uuid::new_v4().to_string(),
                transition_id: &transition_id,
                student_id: &entry.student_id,
                class_id: &entry.class_id,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to save assignment"))?;
    }

    let assigned = repositories::transitions::count_assignments(state.db(), &transition_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count assignments"))?;
    repositories::transitions::set_assigned_count(state.db(), &transition_id, assigned as i32, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update assigned count"))?;

    query_cache::invalidate(state.redis(), Mutation::TransitionStep).await;

    let log = load_transition(&state, &transition_id).await?;
    Ok(Json(TransitionView::from_log(log)))
}

async fn list_assignments(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(transition_id): Path<String>,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    load_transition(&state, &transition_id).await?;

    let assignments = repositories::transitions::list_assignments(state.db(), &transition_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    let items = assignments
        .into_iter()
        .map(|assignment| AssignmentResponse {
            student_id: assignment.student_id,
            class_id: assignment.class_id,
            created_at: format_primitive(assignment.created_at),
        })
        .collect();

    Ok(Json(items))
}

async fn confirm(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(transition_id): Path<String>,
) -> Result<Json<TransitionView>, ApiError> {
    let log = load_transition(&state, &transition_id).await?;
    if !log.classes_created {
        return Err(ApiError::Conflict(
            "Create next-year classes before confirming".to_string(),
        ));
    }
    if log.status.is_terminal() || log.executed_at.is_some() {
        return Err(ApiError::Conflict("Transition can no longer be confirmed".to_string()));
    }

    repositories::transitions::confirm(state.db(), &transition_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to confirm transition"))?;

    query_cache::invalidate(state.redis(), Mutation::TransitionStep).await;

    let log = load_transition(&state, &transition_id).await?;
    Ok(Json(TransitionView::from_log(log)))
}

async fn execute(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(transition_id): Path<String>,
) -> Result<Json<TransitionView>, ApiError> {
    let log = load_transition(&state, &transition_id).await?;

    let view = TransitionView::from_log(log.clone());
    if !view.can_execute {
        return Err(ApiError::Conflict(
            "Transition is not ready to execute; it needs created classes and a confirmation"
                .to_string(),
        ));
    }
    if !log.status.can_advance_to(TransitionStatus::Completed) {
        return Err(ApiError::Conflict(format!(
            "Cannot execute a transition that is {:?}",
            log.status
        )));
    }

    // Holding classes for the target year must exist before the transactional
    // apply; the upsert is idempotent so re-running execute after a failure is
    // safe.
    let departments = repositories::classes::list_departments(state.db(), Some(log.from_year))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list departments"))?;
    let now = primitive_now_utc();
    for department in &departments {
        repositories::classes::get_or_create_holding(
            state.db(),
            &Uuid::new_v4().to_string(),
            department,
            log.to_year,
            &roster_rules::holding_class_name(department),
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to prepare holding class"))?;
    }

    let applied = repositories::transitions::apply_execution(
        state.db(),
        &transition_id,
        log.to_year,
        GRADUATION_GRADE,
        primitive_now_utc(),
    )
    .await;

    if let Err(err) = applied {
        let message = err.to_string();
        if let Err(mark_err) = repositories::transitions::mark_failed(
            state.db(),
            &transition_id,
            &message,
            primitive_now_utc(),
        )
        .await
        {
            tracing::error!(error = %mark_err, "Failed to mark transition as failed");
        }
        query_cache::invalidate(state.redis(), Mutation::TransitionStep).await;
        return Err(ApiError::internal(err, "Failed to execute transition"));
    }

    query_cache::invalidate(state.redis(), Mutation::TransitionExecute).await;

    let log = load_transition(&state, &transition_id).await?;
    Ok(Json(TransitionView::from_log(log)))
}

async fn rollback(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(transition_id): Path<String>,
) -> Result<Json<TransitionView>, ApiError> {
    let log = load_transition(&state, &transition_id).await?;

    if !log.status.can_advance_to(TransitionStatus::RolledBack) {
        return Err(ApiError::Conflict(format!(
            "Cannot roll back a transition that is {:?}",
            log.status
        )));
    }

    if log.executed_at.is_some() {
        repositories::transitions::revert_execution(
            state.db(),
            &transition_id,
            primitive_now_utc(),
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to revert transition"))?;
        query_cache::invalidate(state.redis(), Mutation::TransitionExecute).await;
    } else {
        repositories::transitions::mark_rolled_back(
            state.db(),
            &transition_id,
            primitive_now_utc(),
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to roll back transition"))?;
        query_cache::invalidate(state.redis(), Mutation::TransitionStep).await;
    }

    let log = load_transition(&state, &transition_id).await?;
    Ok(Json(TransitionView::from_log(log)))
}

async fn load_transition(
    state: &AppState,
    transition_id: &str,
) -> Result<YearTransitionLog, ApiError> {
    repositories::transitions::find_by_id(state.db(), transition_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load transition"))?
        .ok_or_else(|| ApiError::NotFound("Transition not found".to_string()))
}

#[cfg(test)]
mod tests;
