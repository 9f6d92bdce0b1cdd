//! The produced interface consumed by outer surfaces (the CLI today, an API
//! layer eventually).
//!
//! Every function returns `Result<_, DomainError>`: a single tagged error
//! shape callers branch on by code. Upstream detail (statuses, SQL errors)
//! goes to `tracing`, never into user-visible messages.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use questlog_core::{
    status, CollectionStatus, DomainError, ErrorCode, ImportCandidate, MatchStatus,
};
use questlog_db::{
    collection_items, ignored_games, imported_games, CollectionItemRow, DbError,
    ImportedGameQuery, ImportedGameRow, NewCollectionItem, Page, StatusCount,
    UpdateCollectionItemFields,
};
use questlog_steam::SteamError;

use crate::error::ImportError;
use crate::resolver::{CatalogResolver, Resolution};
use crate::runner::{ImportOutcome, ImportRunner};

/// Runs a full storefront import for one user.
///
/// # Errors
///
/// Returns a [`DomainError`] carrying the appropriate code: validation for a
/// bad handle, `ProfilePrivate`, `RateLimited`, or
/// `ExternalServiceUnavailable` for storefront trouble, and `Database` for
/// persistence failures.
pub async fn run_import(
    pool: &PgPool,
    runner: &ImportRunner<'_>,
    user_id: Uuid,
    handle: &str,
) -> Result<ImportOutcome, DomainError> {
    runner
        .run(pool, user_id, handle)
        .await
        .map_err(map_import_error)
}

/// Lists a user's imported games with filtering, sorting, and paging.
///
/// # Errors
///
/// Returns a `Database`-coded [`DomainError`] if the query fails.
pub async fn list_imported_games(
    pool: &PgPool,
    user_id: Uuid,
    query: &ImportedGameQuery,
) -> Result<Page<ImportedGameRow>, DomainError> {
    imported_games::list_imported_games(pool, user_id, query)
        .await
        .map_err(map_db_error)
}

/// Soft-deletes an imported game; optionally also puts its title on the
/// ignore list so future imports never surface it again.
///
/// # Errors
///
/// `NotFound` when the row is absent, already deleted, or not owned by the
/// caller; `Database` otherwise.
pub async fn dismiss_imported_game(
    pool: &PgPool,
    user_id: Uuid,
    imported_game_id: i64,
    also_ignore: bool,
) -> Result<(), DomainError> {
    let row = imported_games::find_imported_game(pool, imported_game_id, user_id)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| DomainError::not_found("Imported game not found"))?;

    imported_games::soft_delete_imported_game(pool, imported_game_id, user_id)
        .await
        .map_err(map_db_error)?;

    if also_ignore {
        ignored_games::add_ignored_game(pool, user_id, &row.name)
            .await
            .map_err(map_db_error)?;
    }

    tracing::info!(%user_id, imported_game_id, also_ignore, "dismissed imported game");
    Ok(())
}

/// Promotes an imported game into the collection.
///
/// With no explicit status the row's playtime suggests one (never launched
/// means wishlist, otherwise experienced). Resolution runs first when the row is
/// not yet matched; a user who already tracks the resolved game gets a
/// conflict (and the row is marked matched so it stops surfacing), otherwise
/// a collection item is created on `platform`.
///
/// # Errors
///
/// `NotFound` for a missing row or an unmatched title; `Conflict` when the
/// game is already in the collection; external-service codes when resolution
/// cannot reach the catalog.
pub async fn import_to_collection(
    pool: &PgPool,
    resolver: &CatalogResolver<'_>,
    user_id: Uuid,
    imported_game_id: i64,
    status_choice: Option<CollectionStatus>,
    platform: &str,
) -> Result<CollectionItemRow, DomainError> {
    let row = imported_games::find_imported_game(pool, imported_game_id, user_id)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| DomainError::not_found("Imported game not found"))?;
    let status_choice =
        status_choice.unwrap_or_else(|| status::suggested_status_for_playtime(row.playtime_minutes));

    let candidate = candidate_from_row(&row)?;
    let resolved = match resolver.resolve(pool, &candidate).await {
        Ok(Resolution::Matched(resolved)) => resolved,
        Ok(Resolution::Unmatched) => {
            imported_games::set_match_status(pool, row.id, user_id, MatchStatus::Unmatched)
                .await
                .map_err(map_db_error)?;
            return Err(DomainError::not_found(
                "No catalog match found for this title; resolve it manually",
            ));
        }
        Err(err) => return Err(map_import_error(err)),
    };

    let existing = collection_items::list_items_for_game(pool, user_id, resolved.game.id)
        .await
        .map_err(map_db_error)?;
    if !existing.is_empty() {
        imported_games::set_match_status(pool, row.id, user_id, MatchStatus::Matched)
            .await
            .map_err(map_db_error)?;
        return Err(DomainError::conflict("Game is already in your collection"));
    }

    let item = collection_items::create_collection_item(
        pool,
        user_id,
        &NewCollectionItem {
            game_id: resolved.game.id,
            status: status_choice,
            platform: Some(platform.to_owned()),
            acquisition_type: questlog_core::AcquisitionType::Digital,
            started_at: None,
            completed_at: None,
        },
    )
    .await
    .map_err(map_db_error)?;

    imported_games::set_match_status(pool, row.id, user_id, MatchStatus::Matched)
        .await
        .map_err(map_db_error)?;

    tracing::info!(
        %user_id,
        imported_game_id,
        collection_item_id = item.id,
        "promoted imported game into collection"
    );
    Ok(item)
}

/// Creates a collection item directly. Any status is legal at creation.
///
/// # Errors
///
/// `Validation` when the journey dates are inverted; `Database` otherwise.
pub async fn create_collection_item(
    pool: &PgPool,
    user_id: Uuid,
    item: &NewCollectionItem,
) -> Result<CollectionItemRow, DomainError> {
    validate_journey_dates(item.started_at, item.completed_at)?;
    collection_items::create_collection_item(pool, user_id, item)
        .await
        .map_err(map_db_error)
}

/// Applies a status change through the lifecycle state machine.
///
/// Reads the current row (ownership mismatch reads as absence), validates
/// the transition against the table, and writes the new status. The
/// read-then-write pair is not atomic; concurrent edits to the same item are
/// last-write-wins, which is acceptable for single-owner data.
///
/// # Errors
///
/// `NotFound` when the item is absent or not owned by the caller;
/// `Validation` when the transition targets the wishlist.
pub async fn change_status(
    pool: &PgPool,
    user_id: Uuid,
    item_id: i64,
    new_status: CollectionStatus,
) -> Result<CollectionItemRow, DomainError> {
    let row = collection_items::find_collection_item(pool, item_id, user_id)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| DomainError::not_found("Collection item not found"))?;

    let current = row.parsed_status().map_err(map_db_error)?;
    status::validate_transition(current, new_status)?;

    let updated = collection_items::update_collection_item_status(pool, item_id, user_id, new_status)
        .await
        .map_err(map_db_error)?;

    tracing::info!(
        %user_id,
        item_id,
        from = current.as_str(),
        to = new_status.as_str(),
        "collection status changed"
    );
    Ok(updated)
}

/// Edits an owned item's platform and journey dates.
///
/// # Errors
///
/// `Validation` when the dates are inverted; `NotFound` when the item is
/// absent or not owned by the caller.
pub async fn update_collection_item(
    pool: &PgPool,
    user_id: Uuid,
    item_id: i64,
    fields: &UpdateCollectionItemFields,
) -> Result<CollectionItemRow, DomainError> {
    validate_journey_dates(fields.started_at, fields.completed_at)?;
    collection_items::update_collection_item_fields(pool, item_id, user_id, fields)
        .await
        .map_err(map_db_error)
}

/// Grouped count-by-status for a user's collection.
///
/// # Errors
///
/// Returns a `Database`-coded [`DomainError`] if the query fails.
pub async fn collection_status_counts(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<StatusCount>, DomainError> {
    collection_items::count_collection_by_status(pool, user_id)
        .await
        .map_err(map_db_error)
}

fn validate_journey_dates(
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
) -> Result<(), DomainError> {
    if let (Some(started), Some(completed)) = (started_at, completed_at) {
        if completed < started {
            return Err(DomainError::validation(
                "Completion date cannot be before the start date",
                "completed_at",
            ));
        }
    }
    Ok(())
}

fn candidate_from_row(row: &ImportedGameRow) -> Result<ImportCandidate, DomainError> {
    let storefront = row
        .storefront
        .parse()
        .map_err(|_| DomainError::internal("stored row has an unknown storefront"))?;
    Ok(ImportCandidate {
        storefront,
        storefront_game_id: row.storefront_game_id.clone(),
        name: row.name.clone(),
        playtime_minutes: row.playtime_minutes,
        playtime_windows_minutes: row.playtime_windows_minutes,
        playtime_mac_minutes: row.playtime_mac_minutes,
        playtime_linux_minutes: row.playtime_linux_minutes,
        last_played_at: row.last_played_at,
        icon_url: row.icon_url.clone(),
        logo_url: row.logo_url.clone(),
        catalog_id: None,
    })
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn map_db_error(err: DbError) -> DomainError {
    match err {
        DbError::NotFound => DomainError::not_found("Record not found"),
        DbError::Conflict => DomainError::conflict("A conflicting write occurred; try again"),
        other => {
            tracing::error!(error = %other, "database operation failed");
            DomainError::new(ErrorCode::Database, "A storage error occurred")
        }
    }
}

fn map_steam_error(err: &SteamError) -> DomainError {
    match err {
        SteamError::ProfilePrivate => DomainError::new(
            ErrorCode::ProfilePrivate,
            "This profile's game details are private. Make them public in the storefront's \
             privacy settings, then try again",
        ),
        SteamError::RateLimited => DomainError::new(
            ErrorCode::RateLimited,
            "The storefront is receiving too many requests. Wait a moment and try again",
        ),
        SteamError::NotFound(_) => DomainError::not_found("Storefront profile not found"),
        other => {
            tracing::error!(error = %other, "storefront request failed");
            DomainError::new(
                ErrorCode::ExternalServiceUnavailable,
                "The storefront is temporarily unavailable. Please try again later",
            )
        }
    }
}

fn map_import_error(err: ImportError) -> DomainError {
    match err {
        ImportError::InvalidHandle(message) => DomainError::validation(message, "handle"),
        ImportError::Steam(steam_err) => map_steam_error(&steam_err),
        ImportError::Catalog(catalog_err) => {
            if matches!(catalog_err, questlog_catalog::CatalogError::RateLimited) {
                return DomainError::new(
                    ErrorCode::RateLimited,
                    "The game catalog is receiving too many requests. Wait a moment and try again",
                );
            }
            tracing::error!(error = %catalog_err, "catalog request failed");
            DomainError::new(
                ErrorCode::ExternalServiceUnavailable,
                "The game catalog is temporarily unavailable. Please try again later",
            )
        }
        ImportError::Db(db_err) => map_db_error(db_err),
    }
}
