use sqlx::PgPool;

use crate::db::models::Student;

const STUDENT_COLUMNS: &str =
    "id, name, grade, class_id, is_active, graduation_year, birthday, created_at, updated_at";

pub(crate) struct CreateStudent<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) grade: i32,
    pub(crate) class_id: &'a str,
    pub(crate) birthday: Option<time::Date>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateStudent {
    pub(crate) name: Option<String>,
    pub(crate) grade: Option<i32>,
    pub(crate) class_id: Option<String>,
    pub(crate) birthday: Option<time::Date>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct StudentFilter {
    pub(crate) class_id: Option<String>,
    pub(crate) department: Option<String>,
    pub(crate) grade: Option<i32>,
    pub(crate) include_inactive: bool,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn create(pool: &PgPool, params: CreateStudent<'_>) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (
            id, name, grade, class_id, is_active, graduation_year, birthday,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,TRUE,NULL,$5,$6,$7)
        RETURNING {STUDENT_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.grade)
    .bind(params.class_id)
    .bind(params.birthday)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn fetch_by_ids(
    pool: &PgPool,
    ids: &[String],
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE id = ANY($1) ORDER BY name",
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &StudentFilter,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students s
         WHERE ($1::text IS NULL OR s.class_id = $1)
           AND ($2::text IS NULL OR s.class_id IN
                (SELECT id FROM classes WHERE department = $2))
           AND ($3::int IS NULL OR s.grade = $3)
           AND ($4 OR s.is_active)
         ORDER BY s.name
         OFFSET $5 LIMIT $6",
    ))
    .bind(&filter.class_id)
    .bind(&filter.department)
    .bind(filter.grade)
    .bind(filter.include_inactive)
    .bind(filter.skip)
    .bind(filter.limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool, filter: &StudentFilter) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM students s
         WHERE ($1::text IS NULL OR s.class_id = $1)
           AND ($2::text IS NULL OR s.class_id IN
                (SELECT id FROM classes WHERE department = $2))
           AND ($3::int IS NULL OR s.grade = $3)
           AND ($4 OR s.is_active)",
    )
    .bind(&filter.class_id)
    .bind(&filter.department)
    .bind(filter.grade)
    .bind(filter.include_inactive)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE is_active")
        .fetch_one(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateStudent,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE students SET
            name = COALESCE($1, name),
            grade = COALESCE($2, grade),
            class_id = COALESCE($3, class_id),
            birthday = COALESCE($4, birthday),
            is_active = COALESCE($5, is_active),
            updated_at = $6
         WHERE id = $7",
    )
    .bind(params.name)
    .bind(params.grade)
    .bind(params.class_id)
    .bind(params.birthday)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

// Bulk lifecycle mutations. Each is one statement so a failure leaves no
// partial update behind.

pub(crate) async fn move_to_class(
    pool: &PgPool,
    ids: &[String],
    class_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE students SET class_id = $1, updated_at = $2 WHERE id = ANY($3)",
    )
    .bind(class_id)
    .bind(now)
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn promote_grades(
    pool: &PgPool,
    ids: &[String],
    now: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE students SET grade = grade + 1, updated_at = $1 WHERE id = ANY($2)",
    )
    .bind(now)
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn graduate(
    pool: &PgPool,
    ids: &[String],
    graduation_year: i32,
    target_class_id: Option<&str>,
    now: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE students SET
            is_active = FALSE,
            graduation_year = $1,
            class_id = COALESCE($2, class_id),
            updated_at = $3
         WHERE id = ANY($4)",
    )
    .bind(graduation_year)
    .bind(target_class_id)
    .bind(now)
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete_many(pool: &PgPool, ids: &[String]) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM students WHERE id = ANY($1)").bind(ids).execute(pool).await?;
    Ok(result.rows_affected())
}
