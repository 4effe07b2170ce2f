use sqlx::PgPool;

use crate::db::models::{TransitionAssignment, YearTransitionLog};

const LOG_COLUMNS: &str = "id, from_year, to_year, status, classes_created, total_students, \
     assigned_students, confirmed_at, executed_at, started_at, completed_at, error_message, \
     created_at, updated_at";

const ASSIGNMENT_COLUMNS: &str = "id, transition_id, student_id, class_id, created_at";

pub(crate) struct CreateTransition<'a> {
    pub(crate) id: &'a str,
    pub(crate) from_year: i32,
    pub(crate) to_year: i32,
    pub(crate) total_students: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateTransition<'_>,
) -> Result<YearTransitionLog, sqlx::Error> {
    sqlx::query_as::<_, YearTransitionLog>(&format!(
        "INSERT INTO year_transition_logs (
            id, from_year, to_year, status, classes_created, total_students,
            assigned_students, created_at, updated_at
        ) VALUES ($1,$2,$3,'pending',FALSE,$4,0,$5,$5)
        RETURNING {LOG_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.from_year)
    .bind(params.to_year)
    .bind(params.total_students)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<YearTransitionLog>, sqlx::Error> {
    sqlx::query_as::<_, YearTransitionLog>(&format!(
        "SELECT {LOG_COLUMNS} FROM year_transition_logs WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_years(
    pool: &PgPool,
    from_year: i32,
    to_year: i32,
) -> Result<Option<YearTransitionLog>, sqlx::Error> {
    sqlx::query_as::<_, YearTransitionLog>(&format!(
        "SELECT {LOG_COLUMNS} FROM year_transition_logs
         WHERE from_year = $1 AND to_year = $2",
    ))
    .bind(from_year)
    .bind(to_year)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn mark_classes_created(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE year_transition_logs SET
            classes_created = TRUE,
            status = 'in_progress',
            started_at = COALESCE(started_at, $1),
            updated_at = $1
         WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn set_assigned_count(
    pool: &PgPool,
    id: &str,
    assigned_students: i32,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE year_transition_logs SET assigned_students = $1, updated_at = $2 WHERE id = $3",
    )
    .bind(assigned_students)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn confirm(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE year_transition_logs SET
            confirmed_at = COALESCE(confirmed_at, $1),
            updated_at = $1
         WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn mark_failed(
    pool: &PgPool,
    id: &str,
    error_message: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE year_transition_logs SET
            status = 'failed',
            error_message = $1,
            completed_at = $2,
            updated_at = $2
         WHERE id = $3",
    )
    .bind(error_message)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn mark_rolled_back(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE year_transition_logs SET
            status = 'rolled_back',
            completed_at = $1,
            updated_at = $1
         WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Applies a confirmed transition in one transaction. Assigned students move
/// to their proposed classes, every other active student lands in the holding
/// class for their department in the target year, graduation-grade students
/// graduate, everyone else moves up one grade. The active roster is
/// snapshotted first so a rollback can restore it, and the log flips to
/// completed in the same transaction.
pub(crate) async fn apply_execution(
    pool: &PgPool,
    transition_id: &str,
    to_year: i32,
    graduation_grade: i32,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO transition_student_snapshots
            (transition_id, student_id, grade, class_id, is_active, graduation_year)
         SELECT $1, id, grade, class_id, is_active, graduation_year
         FROM students WHERE is_active",
    )
    .bind(transition_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE students s SET class_id = a.class_id, updated_at = $2
         FROM transition_assignments a
         WHERE a.transition_id = $1 AND a.student_id = s.id AND s.is_active",
    )
    .bind(transition_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE students s SET class_id = h.id, updated_at = $3
         FROM classes old, classes h
         WHERE s.class_id = old.id
           AND s.is_active
           AND h.department = old.department
           AND h.year = $2
           AND h.is_holding
           AND NOT EXISTS (
               SELECT 1 FROM transition_assignments a
               WHERE a.transition_id = $1 AND a.student_id = s.id
           )",
    )
    .bind(transition_id)
    .bind(to_year)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE students SET is_active = FALSE, graduation_year = $1, updated_at = $2
         WHERE is_active AND grade >= $3",
    )
    .bind(to_year)
    .bind(now)
    .bind(graduation_grade)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE students SET grade = grade + 1, updated_at = $1
         WHERE is_active AND grade < $2",
    )
    .bind(now)
    .bind(graduation_grade)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE year_transition_logs SET
            status = 'completed',
            executed_at = $1,
            completed_at = $1,
            updated_at = $1
         WHERE id = $2",
    )
    .bind(now)
    .bind(transition_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Reverses an executed transition from the roster snapshot taken at
/// execution time: grades, class placements, active status, and graduation
/// years all return to their pre-execution values. Students outside the
/// snapshot (created or graduated independently of this transition) are
/// untouched.
pub(crate) async fn revert_execution(
    pool: &PgPool,
    transition_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE students s SET
            grade = snap.grade,
            class_id = snap.class_id,
            is_active = snap.is_active,
            graduation_year = snap.graduation_year,
            updated_at = $2
         FROM transition_student_snapshots snap
         WHERE snap.transition_id = $1 AND snap.student_id = s.id",
    )
    .bind(transition_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE year_transition_logs SET
            status = 'rolled_back',
            completed_at = $1,
            updated_at = $1
         WHERE id = $2",
    )
    .bind(now)
    .bind(transition_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

pub(crate) struct UpsertAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) transition_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) class_id: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn upsert_assignment(
    pool: &PgPool,
    params: UpsertAssignment<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO transition_assignments (id, transition_id, student_id, class_id, created_at)
         VALUES ($1,$2,$3,$4,$5)
         ON CONFLICT (transition_id, student_id)
         DO UPDATE SET class_id = EXCLUDED.class_id",
    )
    .bind(params.id)
    .bind(params.transition_id)
    .bind(params.student_id)
    .bind(params.class_id)
    .bind(params.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn count_assignments(
    pool: &PgPool,
    transition_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM transition_assignments WHERE transition_id = $1",
    )
    .bind(transition_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_assignments(
    pool: &PgPool,
    transition_id: &str,
) -> Result<Vec<TransitionAssignment>, sqlx::Error> {
    sqlx::query_as::<_, TransitionAssignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM transition_assignments
         WHERE transition_id = $1
         ORDER BY created_at",
    ))
    .bind(transition_id)
    .fetch_all(pool)
    .await
}
