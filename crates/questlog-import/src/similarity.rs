//! Fuzzy title matching behind a narrow interface.
//!
//! Matching accuracy is an ongoing tuning concern, so the engine is a
//! pluggable implementation detail: stages depend on [`SimilarityIndex`],
//! and [`JaroWinklerIndex`] is merely the default engine.

use strsim::jaro_winkler;

/// Tuning knobs shared by every matcher implementation.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityConfig {
    /// Maximum score that still counts as a match; 0.0 is exact, lower is
    /// stricter.
    pub threshold: f64,
    /// Candidates whose length differs from the query by more than this many
    /// characters are excluded before scoring.
    pub distance: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            distance: 100,
        }
    }
}

/// One ranked match from a [`SimilarityIndex`] search.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    /// Position of the candidate in the indexed set.
    pub index: usize,
    pub name: String,
    /// Dissimilarity score in `[0, 1]`; 0.0 is an exact match.
    pub score: f64,
}

/// Ranked fuzzy search over a fixed candidate set.
pub trait SimilarityIndex {
    /// Returns candidates scoring at or under the threshold, best first.
    fn search(&self, query: &str) -> Vec<SimilarityHit>;
}

/// Default engine: Jaro–Winkler dissimilarity over the candidate names.
pub struct JaroWinklerIndex {
    names: Vec<String>,
    config: SimilarityConfig,
}

impl JaroWinklerIndex {
    #[must_use]
    pub fn new(names: Vec<String>, config: SimilarityConfig) -> Self {
        Self { names, config }
    }
}

impl SimilarityIndex for JaroWinklerIndex {
    fn search(&self, query: &str) -> Vec<SimilarityHit> {
        let mut hits: Vec<SimilarityHit> = self
            .names
            .iter()
            .enumerate()
            .filter(|(_, name)| length_within(query, name, self.config.distance))
            .map(|(index, name)| SimilarityHit {
                index,
                name: name.clone(),
                score: 1.0 - jaro_winkler(query, name),
            })
            .filter(|hit| hit.score <= self.config.threshold)
            .collect();

        // Score ties break on name so ranking is deterministic.
        hits.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.name.cmp(&b.name))
        });
        hits
    }
}

/// Pairwise form of the same test, used by the merge stage where building an
/// index per comparison would be wasteful.
#[must_use]
pub fn is_similar(a: &str, b: &str, config: &SimilarityConfig) -> bool {
    length_within(a, b, config.distance) && 1.0 - jaro_winkler(a, b) <= config.threshold
}

fn length_within(a: &str, b: &str, distance: usize) -> bool {
    a.chars().count().abs_diff(b.chars().count()) <= distance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[&str]) -> JaroWinklerIndex {
        JaroWinklerIndex::new(
            names.iter().map(|n| (*n).to_owned()).collect(),
            SimilarityConfig::default(),
        )
    }

    #[test]
    fn exact_match_scores_zero() {
        let hits = index(&["outer wilds"]).search("outer wilds");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score.abs() < f64::EPSILON);
    }

    #[test]
    fn near_match_clears_default_threshold() {
        let hits = index(&["counter strike 2"]).search("counterstrike 2");
        assert_eq!(hits.len(), 1, "punctuation-level variance should match");
    }

    #[test]
    fn unrelated_titles_do_not_match() {
        let hits = index(&["stardew valley"]).search("elden ring");
        assert!(hits.is_empty());
    }

    #[test]
    fn results_are_ranked_best_first() {
        let hits = index(&["outer worlds", "outer wilds"]).search("outer wilds");
        assert!(!hits.is_empty());
        assert_eq!(hits[0].name, "outer wilds");
    }

    #[test]
    fn distance_bound_excludes_wildly_longer_candidates() {
        let long_name = "a".repeat(200);
        let idx = JaroWinklerIndex::new(
            vec![long_name],
            SimilarityConfig {
                threshold: 1.0,
                distance: 100,
            },
        );
        assert!(idx.search("a").is_empty());
    }

    #[test]
    fn stricter_threshold_rejects_borderline_pairs() {
        let config = SimilarityConfig {
            threshold: 0.05,
            distance: 100,
        };
        assert!(!is_similar("outer wilds", "outer worlds", &config));
        assert!(is_similar("outer wilds", "outer wilds", &config));
    }

    #[test]
    fn pairwise_and_index_forms_agree() {
        let config = SimilarityConfig::default();
        let pairwise = is_similar("hollow knight", "hollow knight silksong", &config);
        let indexed = !index(&["hollow knight silksong"])
            .search("hollow knight")
            .is_empty();
        assert_eq!(pairwise, indexed);
    }
}
