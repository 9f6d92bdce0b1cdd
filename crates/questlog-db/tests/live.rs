//! Live integration tests for questlog-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/questlog-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use chrono::{Duration, Utc};
use uuid::Uuid;

use questlog_core::{AcquisitionType, CollectionStatus, ImportCandidate, MatchStatus, Storefront};
use questlog_db::{
    collection_items, games, ignored_games, imported_games, DbError, ImportedGameQuery,
    NewCollectionItem, NewGame, PlaytimeFilter, PlaytimeRange, SortKey,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user() -> Uuid {
    Uuid::new_v4()
}

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

fn new_game(catalog_id: i64, title: &str) -> NewGame {
    NewGame {
        catalog_id,
        title: title.to_owned(),
        cover_url: None,
        release_date: None,
        main_story_hours: None,
        main_extra_hours: None,
        completionist_hours: None,
    }
}

async fn seed_item(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    catalog_id: i64,
    title: &str,
    status: CollectionStatus,
    platform: Option<&str>,
) -> collection_items::CollectionItemRow {
    let (game, _) = games::get_or_create_game(pool, &new_game(catalog_id, title))
        .await
        .expect("game creation failed");
    collection_items::create_collection_item(
        pool,
        user_id,
        &NewCollectionItem {
            game_id: game.id,
            status,
            platform: platform.map(ToOwned::to_owned),
            acquisition_type: AcquisitionType::Digital,
            started_at: None,
            completed_at: None,
        },
    )
    .await
    .expect("item creation failed")
}

// ---------------------------------------------------------------------------
// Upsert store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_twice_with_identical_input_is_idempotent(pool: sqlx::PgPool) {
    let user_id = user();
    let batch = vec![
        candidate("440", "Team Fortress 2", 120),
        candidate("620", "Portal 2", 300),
    ];

    let first = imported_games::upsert_many(&pool, user_id, &batch)
        .await
        .unwrap();
    let second = imported_games::upsert_many(&pool, user_id, &batch)
        .await
        .unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 2);
    assert_eq!(
        imported_games::count_imported_games(&pool, user_id)
            .await
            .unwrap(),
        2,
        "the second run must update in place, not duplicate"
    );

    let row = imported_games::find_by_external(&pool, user_id, "steam", "440")
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(row.playtime_minutes, 120);
    assert_eq!(row.match_status, MatchStatus::Pending.as_str());
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_refreshes_mutable_fields_in_place(pool: sqlx::PgPool) {
    let user_id = user();
    imported_games::upsert_many(&pool, user_id, &[candidate("440", "Team Fortress 2", 120)])
        .await
        .unwrap();

    let mut refreshed = candidate("440", "Team Fortress 2", 150);
    refreshed.last_played_at = Some(Utc::now());
    imported_games::upsert_many(&pool, user_id, &[refreshed])
        .await
        .unwrap();

    let row = imported_games::find_by_external(&pool, user_id, "steam", "440")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.playtime_minutes, 150);
    assert!(row.last_played_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn soft_deleted_row_is_excluded_and_not_resurrected(pool: sqlx::PgPool) {
    let user_id = user();
    imported_games::upsert_many(&pool, user_id, &[candidate("440", "Team Fortress 2", 120)])
        .await
        .unwrap();
    let row = imported_games::find_by_external(&pool, user_id, "steam", "440")
        .await
        .unwrap()
        .unwrap();

    imported_games::soft_delete_imported_game(&pool, row.id, user_id)
        .await
        .unwrap();
    assert_eq!(
        imported_games::count_imported_games(&pool, user_id)
            .await
            .unwrap(),
        0
    );

    // A later import of the same external id must leave the deletion alone.
    imported_games::upsert_many(&pool, user_id, &[candidate("440", "Team Fortress 2", 500)])
        .await
        .unwrap();
    assert_eq!(
        imported_games::count_imported_games(&pool, user_id)
            .await
            .unwrap(),
        0,
        "re-import must not resurrect a soft-deleted row"
    );
    assert!(imported_games::find_by_external(&pool, user_id, "steam", "440")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn soft_delete_of_foreign_row_is_not_found(pool: sqlx::PgPool) {
    let owner = user();
    imported_games::upsert_many(&pool, owner, &[candidate("440", "Team Fortress 2", 120)])
        .await
        .unwrap();
    let row = imported_games::find_by_external(&pool, owner, "steam", "440")
        .await
        .unwrap()
        .unwrap();

    let stranger = user();
    let result = imported_games::soft_delete_imported_game(&pool, row.id, stranger).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

// ---------------------------------------------------------------------------
// Query/filter/paginate service
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn pagination_clamps_limit_to_one_hundred(pool: sqlx::PgPool) {
    let user_id = user();
    imported_games::upsert_many(&pool, user_id, &[candidate("1", "Solitaire", 5)])
        .await
        .unwrap();

    let page = imported_games::list_imported_games(
        &pool,
        user_id,
        &ImportedGameQuery {
            limit: 200,
            page: 1,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(page.limit, 100);
    assert!(page.items.len() <= 100);
    assert_eq!(page.total_pages, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn page_below_one_is_raised_to_one(pool: sqlx::PgPool) {
    let user_id = user();
    let page = imported_games::list_imported_games(
        &pool,
        user_id,
        &ImportedGameQuery {
            page: 0,
            limit: 10,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.page, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn playtime_desc_sort_orders_strictly(pool: sqlx::PgPool) {
    let user_id = user();
    imported_games::upsert_many(
        &pool,
        user_id,
        &[
            candidate("1", "Fifty", 50),
            candidate("2", "TwoHundred", 200),
            candidate("3", "Hundred", 100),
        ],
    )
    .await
    .unwrap();

    let page = imported_games::list_imported_games(
        &pool,
        user_id,
        &ImportedGameQuery {
            sort: SortKey::PlaytimeDesc,
            page: 1,
            limit: 10,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let playtimes: Vec<i64> = page.items.iter().map(|r| r.playtime_minutes).collect();
    assert_eq!(playtimes, vec![200, 100, 50]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn title_search_is_case_insensitive(pool: sqlx::PgPool) {
    let user_id = user();
    imported_games::upsert_many(
        &pool,
        user_id,
        &[
            candidate("1", "ZELDA-like Adventure", 10),
            candidate("2", "Sokoban", 10),
        ],
    )
    .await
    .unwrap();

    for needle in ["zelda", "ZELDA", "Zelda"] {
        let page = imported_games::list_imported_games(
            &pool,
            user_id,
            &ImportedGameQuery {
                search: Some(needle.to_owned()),
                page: 1,
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1, "search '{needle}' should match exactly one");
        assert_eq!(page.items[0].storefront_game_id, "1");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn playtime_range_wins_over_played_filter(pool: sqlx::PgPool) {
    let user_id = user();
    imported_games::upsert_many(
        &pool,
        user_id,
        &[
            candidate("1", "Short", 30),
            candidate("2", "Long", 700),
            candidate("3", "Untouched", 0),
        ],
    )
    .await
    .unwrap();

    // NeverPlayed alone would return only "Untouched"; the range must win.
    let page = imported_games::list_imported_games(
        &pool,
        user_id,
        &ImportedGameQuery {
            playtime: Some(PlaytimeFilter::NeverPlayed),
            playtime_range: Some(PlaytimeRange::UnderOneHour),
            sort: SortKey::NameAsc,
            page: 1,
            limit: 10,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let ids: Vec<&str> = page
        .items
        .iter()
        .map(|r| r.storefront_game_id.as_str())
        .collect();
    assert_eq!(ids, vec!["1", "3"], "under-1h includes zero-playtime rows");
}

#[sqlx::test(migrations = "../../migrations")]
async fn never_played_filter_matches_zero_playtime_only(pool: sqlx::PgPool) {
    let user_id = user();
    imported_games::upsert_many(
        &pool,
        user_id,
        &[candidate("1", "Played", 90), candidate("2", "Untouched", 0)],
    )
    .await
    .unwrap();

    let page = imported_games::list_imported_games(
        &pool,
        user_id,
        &ImportedGameQuery {
            playtime: Some(PlaytimeFilter::NeverPlayed),
            page: 1,
            limit: 10,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].storefront_game_id, "2");
}

#[sqlx::test(migrations = "../../migrations")]
async fn last_played_buckets_partition_rows(pool: sqlx::PgPool) {
    let user_id = user();
    let mut recent = candidate("1", "Recent", 10);
    recent.last_played_at = Some(Utc::now() - Duration::days(3));
    let mut stale = candidate("2", "Stale", 10);
    stale.last_played_at = Some(Utc::now() - Duration::days(500));
    let never = candidate("3", "Never", 10);

    imported_games::upsert_many(&pool, user_id, &[recent, stale, never])
        .await
        .unwrap();

    let bucket = |filter| {
        let pool = pool.clone();
        async move {
            imported_games::list_imported_games(
                &pool,
                user_id,
                &ImportedGameQuery {
                    last_played: Some(filter),
                    page: 1,
                    limit: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|r| r.storefront_game_id)
            .collect::<Vec<_>>()
        }
    };

    assert_eq!(
        bucket(imported_games::LastPlayedFilter::LastThirtyDays).await,
        vec!["1"]
    );
    assert_eq!(
        bucket(imported_games::LastPlayedFilter::OverAYear).await,
        vec!["2"]
    );
    assert_eq!(
        bucket(imported_games::LastPlayedFilter::Never).await,
        vec!["3"]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn matched_rows_are_hidden_unless_requested(pool: sqlx::PgPool) {
    let user_id = user();
    imported_games::upsert_many(
        &pool,
        user_id,
        &[candidate("1", "Done", 10), candidate("2", "Waiting", 10)],
    )
    .await
    .unwrap();
    let done = imported_games::find_by_external(&pool, user_id, "steam", "1")
        .await
        .unwrap()
        .unwrap();
    imported_games::set_match_status(&pool, done.id, user_id, MatchStatus::Matched)
        .await
        .unwrap();

    let hidden = imported_games::list_imported_games(
        &pool,
        user_id,
        &ImportedGameQuery {
            page: 1,
            limit: 10,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(hidden.total, 1);
    assert_eq!(hidden.items[0].storefront_game_id, "2");

    let all = imported_games::list_imported_games(
        &pool,
        user_id,
        &ImportedGameQuery {
            show_matched: true,
            page: 1,
            limit: 10,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(all.total, 2);
}

// ---------------------------------------------------------------------------
// Canonical games
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn get_or_create_game_creates_exactly_once(pool: sqlx::PgPool) {
    let (first, created_first) = games::get_or_create_game(&pool, &new_game(1030, "The Witness"))
        .await
        .unwrap();
    let (second, created_second) = games::get_or_create_game(&pool, &new_game(1030, "The Witness"))
        .await
        .unwrap();

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first.id, second.id);
}

// ---------------------------------------------------------------------------
// Collection items
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn collection_titles_aggregate_platforms_per_game(pool: sqlx::PgPool) {
    let user_id = user();
    seed_item(
        &pool,
        user_id,
        1,
        "Counter Strike 2",
        CollectionStatus::Experienced,
        Some("PC"),
    )
    .await;
    seed_item(
        &pool,
        user_id,
        1,
        "Counter Strike 2",
        CollectionStatus::Revisiting,
        Some("PlayStation 5"),
    )
    .await;

    let titles = collection_items::list_collection_titles(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(titles.len(), 1);
    let mut platforms = titles[0].platforms.clone();
    platforms.sort();
    assert_eq!(platforms, vec!["PC", "PlayStation 5"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn status_counts_group_by_status(pool: sqlx::PgPool) {
    let user_id = user();
    seed_item(&pool, user_id, 1, "A", CollectionStatus::Wishlist, None).await;
    seed_item(&pool, user_id, 2, "B", CollectionStatus::Wishlist, None).await;
    seed_item(&pool, user_id, 3, "C", CollectionStatus::Experienced, None).await;

    let counts = collection_items::count_collection_by_status(&pool, user_id)
        .await
        .unwrap();
    let wishlist = counts.iter().find(|c| c.status == "wishlist").unwrap();
    assert_eq!(wishlist.count, 2);
    let experienced = counts.iter().find(|c| c.status == "experienced").unwrap();
    assert_eq!(experienced.count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn field_edit_overwrites_platform_and_journey_dates(pool: sqlx::PgPool) {
    let user_id = user();
    let item = seed_item(&pool, user_id, 1, "A", CollectionStatus::Experienced, None).await;

    let started = Utc::now() - Duration::days(30);
    let completed = Utc::now() - Duration::days(2);
    let updated = collection_items::update_collection_item_fields(
        &pool,
        item.id,
        user_id,
        &collection_items::UpdateCollectionItemFields {
            platform: Some("Steam Deck".to_owned()),
            started_at: Some(started),
            completed_at: Some(completed),
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.platform.as_deref(), Some("Steam Deck"));
    assert!(updated.completed_at.unwrap() >= updated.started_at.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn status_update_on_foreign_item_is_not_found(pool: sqlx::PgPool) {
    let owner = user();
    let item = seed_item(&pool, owner, 1, "A", CollectionStatus::CuriousAbout, None).await;

    let stranger = user();
    let result = collection_items::update_collection_item_status(
        &pool,
        item.id,
        stranger,
        CollectionStatus::Experienced,
    )
    .await;

    assert!(matches!(result, Err(DbError::NotFound)));
}

// ---------------------------------------------------------------------------
// Ignored games
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn ignore_list_is_per_user_and_deduplicated(pool: sqlx::PgPool) {
    let first = user();
    let second = user();

    ignored_games::add_ignored_game(&pool, first, "Cookie Clicker")
        .await
        .unwrap();
    ignored_games::add_ignored_game(&pool, first, "Cookie Clicker")
        .await
        .unwrap();

    assert_eq!(
        ignored_games::list_ignored_names(&pool, first).await.unwrap(),
        vec!["Cookie Clicker"]
    );
    assert!(ignored_games::list_ignored_names(&pool, second)
        .await
        .unwrap()
        .is_empty());
}
