//! Database operations for the canonical `games` table.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `games` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameRow {
    pub id: i64,
    pub public_id: Uuid,
    pub catalog_id: i64,
    pub title: String,
    pub cover_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub main_story_hours: Option<f64>,
    pub main_extra_hours: Option<f64>,
    pub completionist_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a canonical game record.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub catalog_id: i64,
    pub title: String,
    pub cover_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub main_story_hours: Option<f64>,
    pub main_extra_hours: Option<f64>,
    pub completionist_hours: Option<f64>,
}

const GAME_COLUMNS: &str = "id, public_id, catalog_id, title, cover_url, release_date, \
     main_story_hours, main_extra_hours, completionist_hours, created_at, updated_at";

/// Returns the canonical game for a catalog id, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_game_by_catalog_id(
    pool: &PgPool,
    catalog_id: i64,
) -> Result<Option<GameRow>, DbError> {
    let row = sqlx::query_as::<_, GameRow>(&format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE catalog_id = $1"
    ))
    .bind(catalog_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches the canonical game for `game.catalog_id`, creating it if absent.
///
/// Check-then-create rather than upsert: the catalog id is the natural key
/// and an unconditional upsert would silently overwrite catalog data another
/// import just wrote. Two concurrent callers can both pass the existence
/// check; the `catalog_id` unique constraint stops the loser, who treats the
/// conflict as "someone else just created it" and re-fetches.
///
/// Returns the row plus whether this call created it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails, or [`DbError::NotFound`] in
/// the (theoretically unreachable) case where the row vanishes between the
/// conflicting insert and the re-fetch.
pub async fn get_or_create_game(pool: &PgPool, game: &NewGame) -> Result<(GameRow, bool), DbError> {
    if let Some(existing) = find_game_by_catalog_id(pool, game.catalog_id).await? {
        return Ok((existing, false));
    }

    let inserted = sqlx::query_as::<_, GameRow>(&format!(
        "INSERT INTO games \
             (catalog_id, title, cover_url, release_date, \
              main_story_hours, main_extra_hours, completionist_hours) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {GAME_COLUMNS}"
    ))
    .bind(game.catalog_id)
    .bind(&game.title)
    .bind(&game.cover_url)
    .bind(game.release_date)
    .bind(game.main_story_hours)
    .bind(game.main_extra_hours)
    .bind(game.completionist_hours)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(row) => Ok((row, true)),
        Err(err) => {
            let err = DbError::from(err);
            if matches!(err, DbError::Conflict) {
                tracing::debug!(
                    catalog_id = game.catalog_id,
                    "lost canonical-game creation race; re-fetching"
                );
                let row = find_game_by_catalog_id(pool, game.catalog_id)
                    .await?
                    .ok_or(DbError::NotFound)?;
                Ok((row, false))
            } else {
                Err(err)
            }
        }
    }
}
