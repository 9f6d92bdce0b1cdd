//! Database operations for the `collection_items` table.
//!
//! Status strings are written exclusively through the lifecycle path in the
//! service layer; nothing here interprets them beyond storage.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use questlog_core::{AcquisitionType, CollectionStatus};

use crate::DbError;

/// A row from the `collection_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionItemRow {
    pub id: i64,
    pub user_id: Uuid,
    pub game_id: i64,
    pub status: String,
    pub platform: Option<String>,
    pub acquisition_type: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionItemRow {
    /// Parses the stored status string back into the domain enum.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if the column holds a value outside
    /// the CHECK constraint (only possible via manual writes).
    pub fn parsed_status(&self) -> Result<CollectionStatus, DbError> {
        self.status
            .parse()
            .map_err(|_| DbError::InvalidRow(format!("unknown status '{}'", self.status)))
    }
}

/// Input for creating a collection item.
#[derive(Debug, Clone)]
pub struct NewCollectionItem {
    pub game_id: i64,
    pub status: CollectionStatus,
    pub platform: Option<String>,
    pub acquisition_type: AcquisitionType,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Editable non-status fields; each value overwrites the column as given.
#[derive(Debug, Clone, Default)]
pub struct UpdateCollectionItemFields {
    pub platform: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One collection title with the platforms it is held on, for the dedup
/// stage's existing-collection filter.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionTitle {
    pub game_id: i64,
    pub title: String,
    pub platforms: Vec<String>,
}

/// Grouped count of a user's items per status.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

const ITEM_COLUMNS: &str = "id, user_id, game_id, status, platform, acquisition_type, \
     started_at, completed_at, created_at, updated_at";

/// Inserts a new collection item. Any status is legal at creation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_collection_item(
    pool: &PgPool,
    user_id: Uuid,
    item: &NewCollectionItem,
) -> Result<CollectionItemRow, DbError> {
    let row = sqlx::query_as::<_, CollectionItemRow>(&format!(
        "INSERT INTO collection_items \
             (user_id, game_id, status, platform, acquisition_type, started_at, completed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(user_id)
    .bind(item.game_id)
    .bind(item.status.as_str())
    .bind(&item.platform)
    .bind(item.acquisition_type.as_str())
    .bind(item.started_at)
    .bind(item.completed_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns one collection item owned by `user_id`, or `None`.
///
/// Ownership mismatch reads as absence so callers cannot probe for other
/// users' item ids.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_collection_item(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
) -> Result<Option<CollectionItemRow>, DbError> {
    let row = sqlx::query_as::<_, CollectionItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM collection_items WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Writes a new status on an owned item. Transition legality is the caller's
/// concern; this is the raw write half of the read-validate-write path.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the row is absent or owned by someone
/// else; [`DbError::Sqlx`] on query failure.
pub async fn update_collection_item_status(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
    status: CollectionStatus,
) -> Result<CollectionItemRow, DbError> {
    let row = sqlx::query_as::<_, CollectionItemRow>(&format!(
        "UPDATE collection_items SET status = $3, updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Overwrites platform and journey dates on an owned item.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the row is absent or owned by someone
/// else; [`DbError::Sqlx`] on query failure (including the table's
/// completed-after-started CHECK).
pub async fn update_collection_item_fields(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
    fields: &UpdateCollectionItemFields,
) -> Result<CollectionItemRow, DbError> {
    let row = sqlx::query_as::<_, CollectionItemRow>(&format!(
        "UPDATE collection_items SET \
             platform = $3, started_at = $4, completed_at = $5, updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(&fields.platform)
    .bind(fields.started_at)
    .bind(fields.completed_at)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Lists all collection items for a user's canonical game.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_items_for_game(
    pool: &PgPool,
    user_id: Uuid,
    game_id: i64,
) -> Result<Vec<CollectionItemRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM collection_items \
         WHERE user_id = $1 AND game_id = $2 \
         ORDER BY created_at ASC"
    ))
    .bind(user_id)
    .bind(game_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every collection title the user holds, with the platforms it is
/// held on. Feeds the dedup stage's existing-collection filter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_titles(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<CollectionTitle>, DbError> {
    let rows = sqlx::query_as::<_, CollectionTitle>(
        "SELECT g.id AS game_id, g.title, \
                COALESCE(ARRAY_AGG(ci.platform) FILTER (WHERE ci.platform IS NOT NULL), '{}') \
                    AS platforms \
         FROM collection_items ci \
         JOIN games g ON g.id = ci.game_id \
         WHERE ci.user_id = $1 \
         GROUP BY g.id, g.title \
         ORDER BY g.title",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Grouped count-by-status for a user's collection.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_collection_by_status(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<StatusCount>, DbError> {
    let rows = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count \
         FROM collection_items \
         WHERE user_id = $1 \
         GROUP BY status \
         ORDER BY status",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
