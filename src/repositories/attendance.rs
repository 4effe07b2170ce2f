use sqlx::PgPool;

use crate::db::models::AttendanceRecord;
use crate::db::types::AttendanceStatus;

const ATTENDANCE_COLUMNS: &str = "id, student_id, class_id, attended_on, status, note, \
     recorded_by, created_at, updated_at";

pub(crate) struct UpsertAttendance<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) class_id: &'a str,
    pub(crate) attended_on: time::Date,
    pub(crate) status: AttendanceStatus,
    pub(crate) note: Option<&'a str>,
    pub(crate) recorded_by: &'a str,
    pub(crate) now: time::PrimitiveDateTime,
}

pub(crate) async fn upsert(
    pool: &PgPool,
    params: UpsertAttendance<'_>,
) -> Result<AttendanceRecord, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "INSERT INTO attendance_records (
            id, student_id, class_id, attended_on, status, note, recorded_by,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        ON CONFLICT (student_id, attended_on)
        DO UPDATE SET status = EXCLUDED.status,
                      note = EXCLUDED.note,
                      recorded_by = EXCLUDED.recorded_by,
                      updated_at = EXCLUDED.updated_at
        RETURNING {ATTENDANCE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.class_id)
    .bind(params.attended_on)
    .bind(params.status)
    .bind(params.note)
    .bind(params.recorded_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_class_date(
    pool: &PgPool,
    class_id: &str,
    attended_on: time::Date,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
         WHERE class_id = $1 AND attended_on = $2
         ORDER BY student_id",
    ))
    .bind(class_id)
    .bind(attended_on)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
         WHERE student_id = $1
         ORDER BY attended_on DESC",
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}
