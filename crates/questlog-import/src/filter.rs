//! The dedup/filter stage: removes merge-stage candidates the user already
//! tracks, has explicitly ignored, or that are storefront noise.

use questlog_core::ImportCandidate;

use crate::normalize::{normalize_for_matching, strip_symbols};
use crate::similarity::{JaroWinklerIndex, SimilarityConfig, SimilarityIndex};

/// Substrings that mark test/demo/beta builds; any hit removes the candidate.
const NOISE_MARKERS: [&str; 3] = ["test", "demo", "beta"];

/// One collection title with the platforms it is held on.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    pub title: String,
    pub platforms: Vec<String>,
}

/// Which filters run. Each is independently skippable so tests can exercise
/// one stage in isolation; production runs all three.
#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    pub filter_existing: bool,
    pub filter_ignored: bool,
    pub filter_noise: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_existing: true,
            filter_ignored: true,
            filter_noise: true,
        }
    }
}

/// Runs the three filters and sorts the survivors by symbol-stripped title
/// for stable downstream paging.
///
/// `target_platform` is the platform this import populates (e.g. "PC"): a
/// candidate matching an existing collection title is only suppressed when
/// that title is already held on this platform. The same game on another
/// platform is not a duplicate.
#[must_use]
pub fn apply_filters(
    candidates: Vec<ImportCandidate>,
    existing: &[CollectionEntry],
    ignored_names: &[String],
    target_platform: &str,
    similarity: &SimilarityConfig,
    config: &FilterConfig,
) -> Vec<ImportCandidate> {
    let before = candidates.len();

    let mut survivors = candidates;
    if config.filter_existing {
        survivors = filter_existing(survivors, existing, target_platform, similarity);
    }
    if config.filter_ignored {
        survivors = filter_ignored(survivors, ignored_names, similarity);
    }
    if config.filter_noise {
        survivors = filter_noise(survivors);
    }

    survivors.sort_by_key(|c| strip_symbols(&c.name));

    tracing::debug!(
        before,
        after = survivors.len(),
        "dedup/filter stage finished"
    );
    survivors
}

/// Drops candidates whose title fuzzy-matches a collection entry already held
/// on the target platform.
fn filter_existing(
    candidates: Vec<ImportCandidate>,
    existing: &[CollectionEntry],
    target_platform: &str,
    similarity: &SimilarityConfig,
) -> Vec<ImportCandidate> {
    if existing.is_empty() {
        return candidates;
    }
    let index = JaroWinklerIndex::new(
        existing
            .iter()
            .map(|entry| normalize_for_matching(&entry.title))
            .collect(),
        *similarity,
    );

    candidates
        .into_iter()
        .filter(|candidate| {
            let hits = index.search(&normalize_for_matching(&candidate.name));
            let Some(top) = hits.first() else {
                return true;
            };
            let held_on_target = existing[top.index]
                .platforms
                .iter()
                .any(|p| p.eq_ignore_ascii_case(target_platform));
            if held_on_target {
                tracing::debug!(
                    candidate = %candidate.name,
                    matched = %existing[top.index].title,
                    "suppressing candidate already in collection on target platform"
                );
            }
            !held_on_target
        })
        .collect()
}

/// Drops candidates whose title fuzzy-matches the user's ignore list.
fn filter_ignored(
    candidates: Vec<ImportCandidate>,
    ignored_names: &[String],
    similarity: &SimilarityConfig,
) -> Vec<ImportCandidate> {
    if ignored_names.is_empty() {
        return candidates;
    }
    let index = JaroWinklerIndex::new(
        ignored_names
            .iter()
            .map(|name| normalize_for_matching(name))
            .collect(),
        *similarity,
    );

    candidates
        .into_iter()
        .filter(|candidate| {
            index
                .search(&normalize_for_matching(&candidate.name))
                .is_empty()
        })
        .collect()
}

/// Drops test/demo/beta builds by case-insensitive substring match.
fn filter_noise(candidates: Vec<ImportCandidate>) -> Vec<ImportCandidate> {
    candidates
        .into_iter()
        .filter(|candidate| {
            let lowered = candidate.name.to_lowercase();
            !NOISE_MARKERS.iter().any(|marker| lowered.contains(marker))
        })
        .collect()
}
