//! The import merge stage: collapses storefront entries that are really the
//! same logical game (a base title plus its "— Multiplayer" build, regional
//! SKUs, and similar storefront quirks) into one candidate.

use chrono::{DateTime, Utc};

use questlog_core::ImportCandidate;

use crate::normalize::normalize_for_matching;
use crate::similarity::{is_similar, SimilarityConfig};

struct Group {
    /// Normalized names of every member, so a group can absorb an entry that
    /// matches any of them.
    keys: Vec<String>,
    /// Normalized name backing the current display name.
    display_key: String,
    merged: ImportCandidate,
}

/// Collapses similarity-equivalent entries into single candidates.
///
/// Within a group: playtimes (total and per-OS) are summed, the most recent
/// non-null last-played timestamp wins, non-null icon/logo metadata is
/// preferred, and the shortest normalized name becomes the display name (the
/// base title, in practice). The entry with the lowest external id anchors
/// the group's identity.
///
/// Input is sorted before grouping, so the result is order-independent; and
/// merging an already-merged list is a no-op.
#[must_use]
pub fn merge_candidates(
    mut entries: Vec<ImportCandidate>,
    config: &SimilarityConfig,
) -> Vec<ImportCandidate> {
    entries.sort_by(|a, b| external_id_key(a).cmp(&external_id_key(b)));

    let mut groups: Vec<Group> = Vec::new();
    for entry in entries {
        let key = normalize_for_matching(&entry.name);
        match groups
            .iter_mut()
            .find(|g| g.keys.iter().any(|k| is_similar(k, &key, config)))
        {
            Some(group) => fold_into(group, entry, key),
            None => groups.push(Group {
                keys: vec![key.clone()],
                display_key: key,
                merged: entry,
            }),
        }
    }

    groups.into_iter().map(|g| g.merged).collect()
}

fn fold_into(group: &mut Group, entry: ImportCandidate, key: String) {
    let merged = &mut group.merged;
    merged.playtime_minutes += entry.playtime_minutes;
    merged.playtime_windows_minutes += entry.playtime_windows_minutes;
    merged.playtime_mac_minutes += entry.playtime_mac_minutes;
    merged.playtime_linux_minutes += entry.playtime_linux_minutes;
    merged.last_played_at = later_of(merged.last_played_at, entry.last_played_at);
    if merged.icon_url.is_none() {
        merged.icon_url = entry.icon_url;
    }
    if merged.logo_url.is_none() {
        merged.logo_url = entry.logo_url;
    }
    if merged.catalog_id.is_none() {
        merged.catalog_id = entry.catalog_id;
    }
    if key.len() < group.display_key.len() {
        merged.name = entry.name;
        group.display_key = key.clone();
    }
    group.keys.push(key);
}

fn later_of(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Numeric-aware ordering key for storefront ids, falling back to the raw
/// string for non-numeric ids.
fn external_id_key(candidate: &ImportCandidate) -> (i64, String) {
    (
        candidate
            .storefront_game_id
            .parse::<i64>()
            .unwrap_or(i64::MAX),
        candidate.storefront_game_id.clone(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use questlog_core::Storefront;

    use super::*;

    fn candidate(id: &str, name: &str, playtime: i64) -> ImportCandidate {
        ImportCandidate {
            storefront: Storefront::Steam,
            storefront_game_id: id.to_owned(),
            name: name.to_owned(),
            playtime_minutes: playtime,
            playtime_windows_minutes: playtime,
            playtime_mac_minutes: 0,
            playtime_linux_minutes: 0,
            last_played_at: None,
            icon_url: None,
            logo_url: None,
            catalog_id: None,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn equivalent_names_merge_with_summed_playtime_and_latest_timestamp() {
        let mut base = candidate("10", "Team Fortress 2", 100);
        base.last_played_at = Some(at(1_000));
        let mut variant = candidate("11", "Team Fortress 2 - Multiplayer", 50);
        variant.last_played_at = Some(at(2_000));

        let merged = merge_candidates(vec![base, variant], &SimilarityConfig::default());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].playtime_minutes, 150);
        assert_eq!(merged[0].last_played_at, Some(at(2_000)));
    }

    #[test]
    fn distinct_games_stay_separate() {
        let merged = merge_candidates(
            vec![
                candidate("10", "Stardew Valley", 10),
                candidate("20", "Elden Ring", 20),
            ],
            &SimilarityConfig::default(),
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_is_order_independent() {
        let a = candidate("10", "Portal 2", 30);
        let b = candidate("11", "Portal 2 - Beta Branch Soundtrack Edition", 5);
        let c = candidate("20", "Celeste", 60);

        let forward = merge_candidates(
            vec![a.clone(), b.clone(), c.clone()],
            &SimilarityConfig::default(),
        );
        let backward = merge_candidates(vec![c, b, a], &SimilarityConfig::default());

        let mut forward_ids: Vec<_> = forward.iter().map(|m| m.storefront_game_id.clone()).collect();
        let mut backward_ids: Vec<_> =
            backward.iter().map(|m| m.storefront_game_id.clone()).collect();
        forward_ids.sort();
        backward_ids.sort();
        assert_eq!(forward_ids, backward_ids);
    }

    #[test]
    fn merging_twice_is_a_no_op() {
        let once = merge_candidates(
            vec![
                candidate("10", "Half-Life 2", 100),
                candidate("11", "Half-Life 2: Episode One... Multiplayer", 40),
                candidate("30", "Factorio", 900),
            ],
            &SimilarityConfig::default(),
        );
        let twice = merge_candidates(once.clone(), &SimilarityConfig::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn prefers_non_null_artwork_and_shortest_display_name() {
        let mut base = candidate("11", "Rocket League - Game of the Year Edition", 10);
        base.icon_url = Some("icon-b".to_owned());
        let variant = candidate("10", "Rocket League", 5);

        let merged = merge_candidates(vec![base, variant], &SimilarityConfig::default());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "Rocket League");
        // Lowest external id anchors the group.
        assert_eq!(merged[0].storefront_game_id, "10");
        assert_eq!(merged[0].icon_url.as_deref(), Some("icon-b"));
    }

    #[test]
    fn group_anchor_keeps_lowest_external_id() {
        let merged = merge_candidates(
            vec![
                candidate("240", "Counter-Strike: Source", 1),
                candidate("10", "Counter-Strike Source", 1),
            ],
            &SimilarityConfig::default(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].storefront_game_id, "10");
    }
}
