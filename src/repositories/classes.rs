use sqlx::PgPool;

use crate::db::models::{Class, ClassWithCount};

const CLASS_COLUMNS: &str =
    "id, name, department, year, main_teacher_id, is_holding, is_active, created_at, updated_at";

pub(crate) struct CreateClass<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) department: &'a str,
    pub(crate) year: i32,
    pub(crate) main_teacher_id: Option<&'a str>,
    pub(crate) is_holding: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateClass {
    pub(crate) name: Option<String>,
    pub(crate) department: Option<String>,
    pub(crate) main_teacher_id: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct ClassFilter {
    pub(crate) department: Option<String>,
    pub(crate) year: Option<i32>,
}

pub(crate) async fn create(pool: &PgPool, params: CreateClass<'_>) -> Result<Class, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "INSERT INTO classes (
            id, name, department, year, main_teacher_id, is_holding, is_active,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {CLASS_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.department)
    .bind(params.year)
    .bind(params.main_teacher_id)
    .bind(params.is_holding)
    .bind(params.is_active)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, class_id: &str) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1"))
        .bind(class_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, class_id: &str) -> Result<Class, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1"))
        .bind(class_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_with_counts(
    pool: &PgPool,
    filter: ClassFilter,
) -> Result<Vec<ClassWithCount>, sqlx::Error> {
    sqlx::query_as::<_, ClassWithCount>(
        "SELECT c.id, c.name, c.department, c.year, c.main_teacher_id, c.is_holding,
                c.is_active,
                COUNT(s.id) FILTER (WHERE s.is_active) AS student_count,
                c.created_at, c.updated_at
         FROM classes c
         LEFT JOIN students s ON s.class_id = c.id
         WHERE ($1::text IS NULL OR c.department = $1)
           AND ($2::int IS NULL OR c.year = $2)
         GROUP BY c.id
         ORDER BY c.department, c.name",
    )
    .bind(filter.department)
    .bind(filter.year)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_active_by_year(
    pool: &PgPool,
    year: i32,
) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM classes
         WHERE year = $1 AND is_active
         ORDER BY department, name",
    ))
    .bind(year)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    class_id: &str,
    params: UpdateClass,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE classes SET
            name = COALESCE($1, name),
            department = COALESCE($2, department),
            main_teacher_id = COALESCE($3, main_teacher_id),
            is_active = COALESCE($4, is_active),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(params.name)
    .bind(params.department)
    .bind(params.main_teacher_id)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(class_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, class_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM classes WHERE id = $1").bind(class_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_departments(
    pool: &PgPool,
    year: Option<i32>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT department FROM classes
         WHERE ($1::int IS NULL OR year = $1)
         ORDER BY department",
    )
    .bind(year)
    .fetch_all(pool)
    .await
}

/// Idempotent get-or-create of a department's unassigned holding class. The
/// partial unique index on (department, year) WHERE is_holding makes the
/// upsert race-free; the no-op DO UPDATE lets RETURNING yield the existing
/// row.
pub(crate) async fn get_or_create_holding(
    pool: &PgPool,
    id: &str,
    department: &str,
    year: i32,
    name: &str,
    now: time::PrimitiveDateTime,
) -> Result<Class, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "INSERT INTO classes (
            id, name, department, year, main_teacher_id, is_holding, is_active,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,NULL,TRUE,TRUE,$5,$5)
        ON CONFLICT (department, year) WHERE is_holding
        DO UPDATE SET updated_at = classes.updated_at
        RETURNING {CLASS_COLUMNS}",
    ))
    .bind(id)
    .bind(name)
    .bind(department)
    .bind(year)
    .bind(now)
    .fetch_one(pool)
    .await
}
