//! Database operations for the `imported_games` staging table: the
//! transactional upsert store fed by the reconciliation pipeline, and the
//! read-side filter/sort/paginate service.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use questlog_core::{ImportCandidate, MatchStatus};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row and query types
// ---------------------------------------------------------------------------

/// A row from the `imported_games` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportedGameRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: Uuid,
    pub storefront: String,
    pub storefront_game_id: String,
    pub name: String,
    pub playtime_minutes: i64,
    pub playtime_windows_minutes: i64,
    pub playtime_mac_minutes: i64,
    pub playtime_linux_minutes: i64,
    pub last_played_at: Option<DateTime<Utc>>,
    pub icon_url: Option<String>,
    pub logo_url: Option<String>,
    /// `pending`, `matched`, or `unmatched`; see `questlog_core::MatchStatus`.
    pub match_status: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Exact playtime bucket filter. Takes precedence over [`PlaytimeFilter`]
/// when both are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaytimeRange {
    UnderOneHour,
    OneToTenHours,
    TenToFiftyHours,
    OverFiftyHours,
}

impl PlaytimeRange {
    /// Half-open `[min, max)` bounds in minutes.
    fn minute_bounds(self) -> (Option<i64>, Option<i64>) {
        match self {
            PlaytimeRange::UnderOneHour => (None, Some(60)),
            PlaytimeRange::OneToTenHours => (Some(60), Some(600)),
            PlaytimeRange::TenToFiftyHours => (Some(600), Some(3_000)),
            PlaytimeRange::OverFiftyHours => (Some(3_000), None),
        }
    }
}

/// Played / never-played filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaytimeFilter {
    Played,
    NeverPlayed,
}

/// Per-OS platform filter: matches rows with recorded playtime on that OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFilter {
    Windows,
    Mac,
    Linux,
}

impl PlatformFilter {
    fn as_str(self) -> &'static str {
        match self {
            PlatformFilter::Windows => "windows",
            PlatformFilter::Mac => "mac",
            PlatformFilter::Linux => "linux",
        }
    }
}

/// Recency buckets over `last_played_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastPlayedFilter {
    LastThirtyDays,
    LastYear,
    OverAYear,
    Never,
}

/// Sort key applied to the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    NameAsc,
    NameDesc,
    PlaytimeAsc,
    PlaytimeDesc,
    LastPlayedAsc,
    LastPlayedDesc,
    CreatedAsc,
    #[default]
    CreatedDesc,
}

impl SortKey {
    fn order_clause(self) -> &'static str {
        match self {
            SortKey::NameAsc => "name ASC",
            SortKey::NameDesc => "name DESC",
            SortKey::PlaytimeAsc => "playtime_minutes ASC",
            SortKey::PlaytimeDesc => "playtime_minutes DESC",
            SortKey::LastPlayedAsc => "last_played_at ASC NULLS LAST",
            SortKey::LastPlayedDesc => "last_played_at DESC NULLS LAST",
            SortKey::CreatedAsc => "created_at ASC",
            SortKey::CreatedDesc => "created_at DESC",
        }
    }
}

/// Read-side query over a user's imported games.
#[derive(Debug, Clone)]
pub struct ImportedGameQuery {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub platform: Option<PlatformFilter>,
    pub playtime: Option<PlaytimeFilter>,
    /// Wins over `playtime` when both are set; the conflict is logged.
    pub playtime_range: Option<PlaytimeRange>,
    pub last_played: Option<LastPlayedFilter>,
    pub sort: SortKey,
    /// Include rows already matched into the collection.
    pub show_matched: bool,
    /// 1-based page number; values below 1 are raised to 1.
    pub page: i64,
    /// Page size; clamped to `[1, 100]`.
    pub limit: i64,
}

impl Default for ImportedGameQuery {
    fn default() -> Self {
        Self {
            search: None,
            platform: None,
            playtime: None,
            playtime_range: None,
            last_played: None,
            sort: SortKey::default(),
            show_matched: false,
            page: 1,
            limit: 25,
        }
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

const IMPORTED_COLUMNS: &str = "id, public_id, user_id, storefront, storefront_game_id, name, \
     playtime_minutes, playtime_windows_minutes, playtime_mac_minutes, playtime_linux_minutes, \
     last_played_at, icon_url, logo_url, match_status, deleted_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Upsert store
// ---------------------------------------------------------------------------

/// Creates or refreshes one staging row per candidate, atomically.
///
/// The whole batch runs in a single transaction: either every row commits or
/// none does, so the visible imported-game set never reflects a partial run.
/// The existence lookup skips soft-deleted rows; a candidate whose external
/// id matches only a deleted row inserts nothing and updates nothing, leaving
/// the deletion in force.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] when a concurrent import raced this batch
/// into the partial unique index (the caller may retry the batch), or
/// [`DbError::Sqlx`] on any other failure.
pub async fn upsert_many(
    pool: &PgPool,
    user_id: Uuid,
    candidates: &[ImportCandidate],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut written: u64 = 0;

    for candidate in candidates {
        let existing_id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM imported_games \
             WHERE user_id = $1 AND storefront = $2 AND storefront_game_id = $3 \
               AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(candidate.storefront.as_str())
        .bind(&candidate.storefront_game_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(id) = existing_id {
            sqlx::query(
                "UPDATE imported_games SET \
                     name                     = $2, \
                     playtime_minutes         = $3, \
                     playtime_windows_minutes = $4, \
                     playtime_mac_minutes     = $5, \
                     playtime_linux_minutes   = $6, \
                     last_played_at           = $7, \
                     icon_url                 = $8, \
                     logo_url                 = $9, \
                     updated_at               = NOW() \
                 WHERE id = $1",
            )
            .bind(id)
            .bind(&candidate.name)
            .bind(candidate.playtime_minutes)
            .bind(candidate.playtime_windows_minutes)
            .bind(candidate.playtime_mac_minutes)
            .bind(candidate.playtime_linux_minutes)
            .bind(candidate.last_played_at)
            .bind(&candidate.icon_url)
            .bind(&candidate.logo_url)
            .execute(&mut *tx)
            .await?;
        } else {
            // A soft-deleted row with the same external id may exist; the
            // partial unique index permits this insert, and the deleted row
            // stays deleted.
            let delete_guard: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM imported_games \
                 WHERE user_id = $1 AND storefront = $2 AND storefront_game_id = $3 \
                   AND deleted_at IS NOT NULL",
            )
            .bind(user_id)
            .bind(candidate.storefront.as_str())
            .bind(&candidate.storefront_game_id)
            .fetch_optional(&mut *tx)
            .await?;

            if delete_guard.is_some() {
                tracing::debug!(
                    storefront_game_id = %candidate.storefront_game_id,
                    "skipping candidate previously deleted by the user"
                );
                continue;
            }

            sqlx::query(
                "INSERT INTO imported_games \
                     (user_id, storefront, storefront_game_id, name, \
                      playtime_minutes, playtime_windows_minutes, \
                      playtime_mac_minutes, playtime_linux_minutes, \
                      last_played_at, icon_url, logo_url, match_status) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(user_id)
            .bind(candidate.storefront.as_str())
            .bind(&candidate.storefront_game_id)
            .bind(&candidate.name)
            .bind(candidate.playtime_minutes)
            .bind(candidate.playtime_windows_minutes)
            .bind(candidate.playtime_mac_minutes)
            .bind(candidate.playtime_linux_minutes)
            .bind(candidate.last_played_at)
            .bind(&candidate.icon_url)
            .bind(&candidate.logo_url)
            .bind(MatchStatus::Pending.as_str())
            .execute(&mut *tx)
            .await?;
        }
        written += 1;
    }

    tx.commit().await?;
    Ok(written)
}

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

/// Lists a user's live imported games with filtering, sorting, and paging.
///
/// When both the played/never-played filter and a numeric range are supplied
/// the range wins; the conflict is logged rather than surfaced as an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_imported_games(
    pool: &PgPool,
    user_id: Uuid,
    query: &ImportedGameQuery,
) -> Result<Page<ImportedGameRow>, DbError> {
    let limit = query.limit.clamp(1, 100);
    let page = query.page.max(1);
    let offset = (page - 1) * limit;

    let (playtime_min, playtime_max) = playtime_bounds(query);
    let (played_after, played_before, never_played) = last_played_bounds(query.last_played);

    let where_clause = "user_id = $1 AND deleted_at IS NULL \
           AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%') \
           AND ($3::BIGINT IS NULL OR playtime_minutes >= $3) \
           AND ($4::BIGINT IS NULL OR playtime_minutes < $4) \
           AND ($5::TEXT IS NULL OR \
                CASE $5 WHEN 'windows' THEN playtime_windows_minutes \
                        WHEN 'mac' THEN playtime_mac_minutes \
                        ELSE playtime_linux_minutes END > 0) \
           AND ($6::TIMESTAMPTZ IS NULL OR last_played_at >= $6) \
           AND ($7::TIMESTAMPTZ IS NULL OR last_played_at < $7) \
           AND (NOT $8::BOOL OR last_played_at IS NULL) \
           AND ($9::BOOL OR match_status <> 'matched')";

    let items = sqlx::query_as::<_, ImportedGameRow>(&format!(
        "SELECT {IMPORTED_COLUMNS} FROM imported_games \
         WHERE {where_clause} \
         ORDER BY {order}, id ASC \
         LIMIT $10 OFFSET $11",
        order = query.sort.order_clause(),
    ))
    .bind(user_id)
    .bind(query.search.as_deref())
    .bind(playtime_min)
    .bind(playtime_max)
    .bind(query.platform.map(PlatformFilter::as_str))
    .bind(played_after)
    .bind(played_before)
    .bind(never_played)
    .bind(query.show_matched)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM imported_games WHERE {where_clause}"
    ))
    .bind(user_id)
    .bind(query.search.as_deref())
    .bind(playtime_min)
    .bind(playtime_max)
    .bind(query.platform.map(PlatformFilter::as_str))
    .bind(played_after)
    .bind(played_before)
    .bind(never_played)
    .bind(query.show_matched)
    .fetch_one(pool)
    .await?;

    Ok(Page {
        items,
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit,
    })
}

fn playtime_bounds(query: &ImportedGameQuery) -> (Option<i64>, Option<i64>) {
    if let Some(range) = query.playtime_range {
        if query.playtime.is_some() {
            tracing::warn!(
                ?range,
                status = ?query.playtime,
                "both playtime filters supplied; the range filter wins"
            );
        }
        return range.minute_bounds();
    }
    match query.playtime {
        Some(PlaytimeFilter::Played) => (Some(1), None),
        Some(PlaytimeFilter::NeverPlayed) => (None, Some(1)),
        None => (None, None),
    }
}

#[allow(clippy::type_complexity)]
fn last_played_bounds(
    filter: Option<LastPlayedFilter>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>, bool) {
    let now = Utc::now();
    match filter {
        Some(LastPlayedFilter::LastThirtyDays) => (Some(now - Duration::days(30)), None, false),
        Some(LastPlayedFilter::LastYear) => (Some(now - Duration::days(365)), None, false),
        // NULL last_played_at never satisfies `<`, so never-played rows stay out.
        Some(LastPlayedFilter::OverAYear) => (None, Some(now - Duration::days(365)), false),
        Some(LastPlayedFilter::Never) => (None, None, true),
        None => (None, None, false),
    }
}

// ---------------------------------------------------------------------------
// Row-level operations
// ---------------------------------------------------------------------------

/// Returns one live imported game owned by `user_id`, or `None`.
///
/// An ownership mismatch is indistinguishable from absence, deliberately.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_imported_game(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
) -> Result<Option<ImportedGameRow>, DbError> {
    let row = sqlx::query_as::<_, ImportedGameRow>(&format!(
        "SELECT {IMPORTED_COLUMNS} FROM imported_games \
         WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the live row for one (storefront, external id) pair, or `None`.
///
/// Used by the import runner to find the rows it just upserted; soft-deleted
/// rows are invisible here like everywhere else.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_by_external(
    pool: &PgPool,
    user_id: Uuid,
    storefront: &str,
    storefront_game_id: &str,
) -> Result<Option<ImportedGameRow>, DbError> {
    let row = sqlx::query_as::<_, ImportedGameRow>(&format!(
        "SELECT {IMPORTED_COLUMNS} FROM imported_games \
         WHERE user_id = $1 AND storefront = $2 AND storefront_game_id = $3 \
           AND deleted_at IS NULL"
    ))
    .bind(user_id)
    .bind(storefront)
    .bind(storefront_game_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Counts a user's live imported games.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_imported_games(pool: &PgPool, user_id: Uuid) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM imported_games WHERE user_id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Updates the catalog-match status of a live row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the row is absent, soft-deleted, or
/// owned by someone else; [`DbError::Sqlx`] on query failure.
pub async fn set_match_status(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
    status: MatchStatus,
) -> Result<ImportedGameRow, DbError> {
    let row = sqlx::query_as::<_, ImportedGameRow>(&format!(
        "UPDATE imported_games SET match_status = $3, updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL \
         RETURNING {IMPORTED_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Soft-deletes a live row by stamping `deleted_at`.
///
/// The row stays auditable, disappears from every read, and is never
/// resurrected by later imports.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the row is absent, already deleted, or
/// owned by someone else; [`DbError::Sqlx`] on query failure.
pub async fn soft_delete_imported_game(pool: &PgPool, id: i64, user_id: Uuid) -> Result<(), DbError> {
    let affected = sqlx::query(
        "UPDATE imported_games SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
