use sqlx::PgPool;

use crate::db::models::UserPreference;

const PREFERENCE_COLUMNS: &str = "user_id, key, value, updated_at";

pub(crate) async fn find(
    pool: &PgPool,
    user_id: &str,
    key: &str,
) -> Result<Option<UserPreference>, sqlx::Error> {
    sqlx::query_as::<_, UserPreference>(&format!(
        "SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = $1 AND key = $2",
    ))
    .bind(user_id)
    .bind(key)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<UserPreference>, sqlx::Error> {
    sqlx::query_as::<_, UserPreference>(&format!(
        "SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = $1 ORDER BY key",
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn upsert(
    pool: &PgPool,
    user_id: &str,
    key: &str,
    value: serde_json::Value,
    now: time::PrimitiveDateTime,
) -> Result<UserPreference, sqlx::Error> {
    sqlx::query_as::<_, UserPreference>(&format!(
        "INSERT INTO user_preferences (user_id, key, value, updated_at)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT (user_id, key)
         DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
         RETURNING {PREFERENCE_COLUMNS}",
    ))
    .bind(user_id)
    .bind(key)
    .bind(value)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, user_id: &str, key: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_preferences WHERE user_id = $1 AND key = $2")
        .bind(user_id)
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
