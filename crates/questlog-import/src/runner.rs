//! The import runner: wires storefront fetch → merge → filter → upsert →
//! catalog resolution into one synchronous run.
//!
//! Everything executes sequentially per record; the only transaction
//! boundary is the upsert batch, which commits or rolls back as a whole.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use questlog_catalog::CatalogClient;
use questlog_core::{ImportCandidate, MatchStatus, Storefront};
use questlog_db::{imported_games, DbError};
use questlog_steam::{OwnedGame, SteamClient, SteamError};

use crate::error::ImportError;
use crate::filter::{apply_filters, CollectionEntry, FilterConfig};
use crate::merge::merge_candidates;
use crate::resolver::{CatalogResolver, Resolution};
use crate::similarity::SimilarityConfig;

/// Tuning for one import run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub similarity: SimilarityConfig,
    pub filters: FilterConfig,
    /// Platform this import populates; used by the existing-collection filter
    /// and by promotion.
    pub target_platform: String,
    /// Platform filter sent with catalog searches.
    pub catalog_platform_filter: String,
    /// Retries of the upsert batch after a concurrent-import conflict.
    pub upsert_max_retries: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityConfig::default(),
            filters: FilterConfig::default(),
            target_platform: "PC".to_owned(),
            catalog_platform_filter: "PC (Microsoft Windows)".to_owned(),
            upsert_max_retries: 2,
        }
    }
}

/// What one run accomplished. Unmatched candidates are a normal outcome, not
/// an error: their rows are retained for manual resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Rows created or refreshed by the upsert store.
    pub imported: u64,
    /// Rows left in `unmatched` after catalog resolution.
    pub unmatched: u64,
}

/// Orchestrates one storefront import for one user.
pub struct ImportRunner<'a> {
    steam: &'a SteamClient,
    catalog: &'a CatalogClient,
    config: RunnerConfig,
}

impl<'a> ImportRunner<'a> {
    #[must_use]
    pub fn new(steam: &'a SteamClient, catalog: &'a CatalogClient, config: RunnerConfig) -> Self {
        Self {
            steam,
            catalog,
            config,
        }
    }

    /// Runs the full pipeline for `handle` (a 17-digit storefront id or a
    /// vanity handle) and persists the result for `user_id`.
    ///
    /// # Errors
    ///
    /// - [`ImportError::InvalidHandle`] when the handle resolves to nothing.
    /// - [`ImportError::Steam`] for profile/transport failures, including
    ///   the distinct private-profile case.
    /// - [`ImportError::Db`] when persistence fails after retries.
    /// - [`ImportError::Catalog`] only for terminal catalog errors; transient
    ///   ones leave rows pending for the next run.
    pub async fn run(
        &self,
        pool: &PgPool,
        user_id: Uuid,
        handle: &str,
    ) -> Result<ImportOutcome, ImportError> {
        let steam_id = self.validate_handle(handle).await?;
        let profile = self.steam.player_summary(&steam_id).await?;
        tracing::info!(
            %user_id,
            display_name = %profile.display_name,
            "starting library import"
        );

        let owned = self.steam.owned_games(&steam_id).await?;
        let raw_count = owned.len();
        let candidates = owned.into_iter().map(candidate_from_owned).collect();
        let merged = merge_candidates(candidates, &self.config.similarity);

        let existing: Vec<CollectionEntry> =
            questlog_db::list_collection_titles(pool, user_id)
                .await?
                .into_iter()
                .map(|t| CollectionEntry {
                    title: t.title,
                    platforms: t.platforms,
                })
                .collect();
        let ignored = questlog_db::list_ignored_names(pool, user_id).await?;

        let filtered = apply_filters(
            merged,
            &existing,
            &ignored,
            &self.config.target_platform,
            &self.config.similarity,
            &self.config.filters,
        );
        tracing::info!(
            raw = raw_count,
            surviving = filtered.len(),
            "reconciliation filtering finished"
        );

        let imported = self.upsert_with_retry(pool, user_id, &filtered).await?;
        let unmatched = self.resolve_all(pool, user_id, &filtered).await?;

        Ok(ImportOutcome {
            imported,
            unmatched,
        })
    }

    /// A 17-digit numeric id is used as-is; anything else is treated as a
    /// vanity handle and resolved through the storefront.
    async fn validate_handle(&self, handle: &str) -> Result<String, ImportError> {
        let trimmed = handle.trim();
        if trimmed.len() == 17 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(trimmed.to_owned());
        }
        match self.steam.resolve_vanity(trimmed).await {
            Ok(id) => Ok(id),
            Err(SteamError::NotFound(_)) => Err(ImportError::InvalidHandle(format!(
                "'{trimmed}' is not a 17-digit storefront id or a known vanity handle"
            ))),
            Err(err) => Err(err.into()),
        }
    }

    /// Retries the whole batch on a concurrent-import conflict: the batch
    /// rolled back, so re-running observes the other import's rows and
    /// updates them in place instead of colliding again.
    async fn upsert_with_retry(
        &self,
        pool: &PgPool,
        user_id: Uuid,
        candidates: &[ImportCandidate],
    ) -> Result<u64, ImportError> {
        let mut attempt = 0u32;
        loop {
            match imported_games::upsert_many(pool, user_id, candidates).await {
                Ok(written) => return Ok(written),
                Err(DbError::Conflict) if attempt < self.config.upsert_max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max = self.config.upsert_max_retries,
                        "concurrent import conflict; retrying batch"
                    );
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Resolves every pending row against the catalog. Terminal no-match
    /// marks the row `unmatched`; transient catalog failure leaves it
    /// `pending` so a later run retries.
    async fn resolve_all(
        &self,
        pool: &PgPool,
        user_id: Uuid,
        candidates: &[ImportCandidate],
    ) -> Result<u64, ImportError> {
        let resolver = CatalogResolver::new(
            self.catalog,
            self.config.similarity,
            self.config.catalog_platform_filter.clone(),
        );
        let mut unmatched = 0u64;

        for candidate in candidates {
            let Some(row) = imported_games::find_by_external(
                pool,
                user_id,
                candidate.storefront.as_str(),
                &candidate.storefront_game_id,
            )
            .await?
            else {
                // The upsert skipped this candidate (soft-deleted earlier by
                // the user); nothing to resolve.
                continue;
            };
            if row.match_status != MatchStatus::Pending.as_str() {
                if row.match_status == MatchStatus::Unmatched.as_str() {
                    unmatched += 1;
                }
                continue;
            }

            match resolver.resolve(pool, candidate).await {
                Ok(Resolution::Matched(_)) => {
                    imported_games::set_match_status(pool, row.id, user_id, MatchStatus::Matched)
                        .await?;
                }
                Ok(Resolution::Unmatched) => {
                    imported_games::set_match_status(pool, row.id, user_id, MatchStatus::Unmatched)
                        .await?;
                    unmatched += 1;
                }
                Err(ImportError::Catalog(err)) if err.is_transient() => {
                    tracing::warn!(
                        candidate = %candidate.name,
                        error = %err,
                        "catalog unavailable; leaving row pending for a later run"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(unmatched)
    }
}

/// Converts one storefront entry into a pipeline candidate.
#[must_use]
pub fn candidate_from_owned(game: OwnedGame) -> ImportCandidate {
    ImportCandidate {
        storefront: Storefront::Steam,
        storefront_game_id: game.app_id.to_string(),
        name: game.name,
        playtime_minutes: game.playtime_minutes,
        playtime_windows_minutes: game.playtime_windows_minutes,
        playtime_mac_minutes: game.playtime_mac_minutes,
        playtime_linux_minutes: game.playtime_linux_minutes,
        last_played_at: game.last_played_at,
        icon_url: game.icon_url,
        logo_url: game.logo_url,
        catalog_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_conversion_keeps_playtime_and_identity() {
        let owned = OwnedGame {
            app_id: 440,
            name: "Team Fortress 2".to_owned(),
            playtime_minutes: 120,
            playtime_windows_minutes: 100,
            playtime_mac_minutes: 20,
            playtime_linux_minutes: 0,
            last_played_at: None,
            icon_url: Some("https://media.example/icon.jpg".to_owned()),
            logo_url: None,
        };
        let candidate = candidate_from_owned(owned);
        assert_eq!(candidate.storefront, Storefront::Steam);
        assert_eq!(candidate.storefront_game_id, "440");
        assert_eq!(candidate.playtime_minutes, 120);
        assert!(candidate.catalog_id.is_none());
    }
}
