//! Database operations for the `ignored_games` deny-list.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `ignored_games` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IgnoredGameRow {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Adds a title to the user's ignore list. Adding the same title twice is a
/// no-op.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn add_ignored_game(pool: &PgPool, user_id: Uuid, name: &str) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO ignored_games (user_id, name) VALUES ($1, $2) \
         ON CONFLICT (user_id, name) DO NOTHING",
    )
    .bind(user_id)
    .bind(name)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the user's ignored titles, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ignored_names(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, DbError> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT name FROM ignored_games WHERE user_id = $1 ORDER BY name")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(names)
}
