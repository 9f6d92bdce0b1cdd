//! The catalog resolver: maps a surviving import candidate to a canonical
//! game record, creating that record exactly once per catalog id.

use sqlx::PgPool;

use questlog_catalog::{CatalogClient, CatalogError, CatalogGame};
use questlog_core::ImportCandidate;
use questlog_db::{games, GameRow, NewGame};

use crate::error::ImportError;
use crate::normalize::{normalize_for_matching, strip_symbols};
use crate::similarity::{JaroWinklerIndex, SimilarityConfig, SimilarityIndex};

/// A canonical game produced by resolution, plus whether this call created it.
#[derive(Debug, Clone)]
pub struct ResolvedGame {
    pub game: GameRow,
    pub created: bool,
}

/// Outcome of resolving one candidate.
#[derive(Debug, Clone)]
pub enum Resolution {
    Matched(ResolvedGame),
    /// No catalog record cleared the similarity threshold. The candidate's
    /// row is retained for manual resolution, never dropped.
    Unmatched,
}

/// Resolves import candidates against the external metadata catalog.
pub struct CatalogResolver<'a> {
    client: &'a CatalogClient,
    similarity: SimilarityConfig,
    /// Platform filter sent with catalog searches, e.g. "PC (Microsoft Windows)".
    platform_filter: String,
}

impl<'a> CatalogResolver<'a> {
    #[must_use]
    pub fn new(
        client: &'a CatalogClient,
        similarity: SimilarityConfig,
        platform_filter: impl Into<String>,
    ) -> Self {
        Self {
            client,
            similarity,
            platform_filter: platform_filter.into(),
        }
    }

    /// Resolves one candidate to a canonical game.
    ///
    /// A candidate already carrying a catalog id skips the name search and
    /// goes straight to fetch-or-create. Otherwise the catalog is queried by
    /// normalized name with a platform filter and the top similarity match
    /// above threshold wins. The canonical row is created via
    /// check-then-create; losing the creation race to a concurrent import is
    /// handled inside [`games::get_or_create_game`] by re-fetching.
    ///
    /// # Errors
    ///
    /// Propagates catalog and database failures. Callers distinguish
    /// transient catalog errors (leave the row pending for a later run) from
    /// terminal ones via [`CatalogError::is_transient`].
    pub async fn resolve(
        &self,
        pool: &PgPool,
        candidate: &ImportCandidate,
    ) -> Result<Resolution, ImportError> {
        if let Some(catalog_id) = candidate.catalog_id {
            return self.resolve_by_id(pool, catalog_id).await;
        }

        let query = normalize_for_matching(&candidate.name);
        let results = self
            .client
            .search_by_name(&query, Some(&self.platform_filter))
            .await?;

        match self.pick_best(&candidate.name, &results) {
            Some(record) => {
                let (game, created) = games::get_or_create_game(pool, &new_game(record)).await?;
                tracing::info!(
                    candidate = %candidate.name,
                    catalog_id = record.id,
                    created,
                    "resolved candidate against catalog"
                );
                Ok(Resolution::Matched(ResolvedGame { game, created }))
            }
            None => {
                tracing::info!(candidate = %candidate.name, "no catalog match cleared threshold");
                Ok(Resolution::Unmatched)
            }
        }
    }

    async fn resolve_by_id(&self, pool: &PgPool, catalog_id: i64) -> Result<Resolution, ImportError> {
        // A local canonical row short-circuits the catalog round-trip.
        if let Some(game) = games::find_game_by_catalog_id(pool, catalog_id).await? {
            return Ok(Resolution::Matched(ResolvedGame {
                game,
                created: false,
            }));
        }

        let record = match self.client.get_by_id(catalog_id).await {
            Ok(record) => record,
            Err(CatalogError::NotFound { .. }) => return Ok(Resolution::Unmatched),
            Err(err) => return Err(err.into()),
        };

        let (game, created) = games::get_or_create_game(pool, &new_game(&record)).await?;
        Ok(Resolution::Matched(ResolvedGame { game, created }))
    }

    /// Ranks catalog results against the candidate title using the
    /// symbol-stripped comparison key and returns the best one clearing the
    /// threshold.
    fn pick_best<'r>(&self, candidate_name: &str, results: &'r [CatalogGame]) -> Option<&'r CatalogGame> {
        if results.is_empty() {
            return None;
        }
        let index = JaroWinklerIndex::new(
            results.iter().map(|r| strip_symbols(&r.name)).collect(),
            self.similarity,
        );
        let hits = index.search(&strip_symbols(candidate_name));
        hits.first().map(|hit| &results[hit.index])
    }
}

fn new_game(record: &CatalogGame) -> NewGame {
    NewGame {
        catalog_id: record.id,
        title: record.name.clone(),
        cover_url: record.cover_url.clone(),
        release_date: record.release_date,
        main_story_hours: record.main_story_hours,
        main_extra_hours: record.main_extra_hours,
        completionist_hours: record.completionist_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_game(id: i64, name: &str) -> CatalogGame {
        CatalogGame {
            id,
            name: name.to_owned(),
            cover_url: None,
            release_date: None,
            platforms: vec!["PC (Microsoft Windows)".to_owned()],
            main_story_hours: None,
            main_extra_hours: None,
            completionist_hours: None,
        }
    }

    fn resolver_parts() -> (SimilarityConfig, String) {
        (SimilarityConfig::default(), "PC (Microsoft Windows)".to_owned())
    }

    // pick_best never touches the network; the client below exists only to
    // satisfy the constructor.
    fn make_resolver(client: &CatalogClient) -> CatalogResolver<'_> {
        let (similarity, platform) = resolver_parts();
        CatalogResolver::new(client, similarity, platform)
    }

    fn offline_client() -> CatalogClient {
        CatalogClient::new("k", "http://127.0.0.1:9", 1, "questlog-test/0.1", 0, 0)
            .expect("client construction should not fail")
    }

    #[test]
    fn pick_best_prefers_the_closest_title() {
        let client = offline_client();
        let resolver = make_resolver(&client);
        let results = vec![
            catalog_game(1, "The Witness: Remastered"),
            catalog_game(2, "The Witness"),
        ];
        let best = resolver.pick_best("The Witness\u{2122}", &results).unwrap();
        assert_eq!(best.id, 2);
    }

    #[test]
    fn pick_best_returns_none_when_nothing_clears_threshold() {
        let client = offline_client();
        let resolver = make_resolver(&client);
        let results = vec![catalog_game(1, "Completely Unrelated Farm Sim")];
        assert!(resolver.pick_best("Quake", &results).is_none());
    }

    #[test]
    fn pick_best_handles_empty_result_sets() {
        let client = offline_client();
        let resolver = make_resolver(&client);
        assert!(resolver.pick_best("Quake", &[]).is_none());
    }
}
