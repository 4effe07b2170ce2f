use sqlx::PgPool;

use crate::db::models::VisitationNote;

const VISITATION_COLUMNS: &str = "id, student_id, visited_on, note, visited_by, created_at";

pub(crate) struct CreateVisitation<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) visited_on: time::Date,
    pub(crate) note: &'a str,
    pub(crate) visited_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateVisitation<'_>,
) -> Result<VisitationNote, sqlx::Error> {
    sqlx::query_as::<_, VisitationNote>(&format!(
        "INSERT INTO visitation_notes (id, student_id, visited_on, note, visited_by, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {VISITATION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.visited_on)
    .bind(params.note)
    .bind(params.visited_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<VisitationNote>, sqlx::Error> {
    sqlx::query_as::<_, VisitationNote>(&format!(
        "SELECT {VISITATION_COLUMNS} FROM visitation_notes
         WHERE student_id = $1
         ORDER BY visited_on DESC, created_at DESC",
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}
