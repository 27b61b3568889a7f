//! Key/value entries stored in SQLite.

use sqlx::SqlitePool;

use crate::Result;

/// Create or replace an entry.
pub async fn upsert_entry(
    pool: &SqlitePool,
    collection: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kv_entries (collection, key, value)
        VALUES (?, ?, ?)
        ON CONFLICT(collection, key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
    )
    .bind(collection)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the value of an entry.
pub async fn get_entry(pool: &SqlitePool, collection: &str, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar::<_, String>(
        r#"
        SELECT value
        FROM kv_entries
        WHERE collection = ? AND key = ?
        "#,
    )
    .bind(collection)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(value)
}
