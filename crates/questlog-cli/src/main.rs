use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use questlog_catalog::CatalogClient;
use questlog_core::{AppConfig, CollectionStatus};
use questlog_db::{ImportedGameQuery, SortKey};
use questlog_import::{service, ImportRunner, RunnerConfig, SimilarityConfig};
use questlog_steam::SteamClient;

#[derive(Debug, Parser)]
#[command(name = "questlog")]
#[command(about = "Game collection tracker: storefront imports and journey tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import a storefront library for a user.
    Import {
        #[arg(long)]
        user: Uuid,
        /// 17-digit storefront id or vanity handle.
        handle: String,
    },
    /// List a user's imported games.
    List {
        #[arg(long)]
        user: Uuid,
        /// Case-insensitive substring title search.
        #[arg(long)]
        search: Option<String>,
        /// Sort key: name_asc, name_desc, playtime_asc, playtime_desc,
        /// last_played_asc, last_played_desc, created_asc, created_desc.
        #[arg(long, default_value = "created_desc")]
        sort: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 25)]
        limit: i64,
        /// Include rows already matched into the collection.
        #[arg(long)]
        show_matched: bool,
    },
    /// Change the status of a collection item.
    Status {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        item: i64,
        /// One of: wishlist, curious_about, currently_exploring,
        /// took_a_break, experienced, revisiting.
        status: String,
    },
    /// Promote an imported game into the collection.
    Promote {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        id: i64,
        /// Initial status; defaults to a suggestion based on playtime.
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value = "PC")]
        platform: String,
    },
    /// Dismiss an imported game (soft delete).
    Dismiss {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        id: i64,
        /// Also put the title on the ignore list so it never resurfaces.
        #[arg(long)]
        ignore: bool,
    },
    /// Show the collection's count per status.
    Counts {
        #[arg(long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = questlog_core::load_app_config().context("failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let pool = questlog_db::connect_pool_from_env()
        .await
        .context("failed to connect to the database")?;
    questlog_db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    tracing::debug!(env = %config.env, "questlog ready");

    let cli = Cli::parse();
    match cli.command {
        Commands::Import { user, handle } => {
            let (steam, catalog) = build_clients(&config)?;
            let runner = ImportRunner::new(&steam, &catalog, runner_config(&config));
            let outcome = service::run_import(&pool, &runner, user, &handle)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!(
                "imported {} games ({} unmatched, kept for manual resolution)",
                outcome.imported, outcome.unmatched
            );
        }
        Commands::List {
            user,
            search,
            sort,
            page,
            limit,
            show_matched,
        } => {
            let query = ImportedGameQuery {
                search,
                sort: parse_sort(&sort)?,
                page,
                limit,
                show_matched,
                ..Default::default()
            };
            let result = service::list_imported_games(&pool, user, &query)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            for row in &result.items {
                println!(
                    "#{:<6} {:<50} {:>6} min  [{}]",
                    row.id, row.name, row.playtime_minutes, row.match_status
                );
            }
            println!(
                "page {}/{} ({} total, limit {})",
                result.page, result.total_pages, result.total, result.limit
            );
        }
        Commands::Status { user, item, status } => {
            let status: CollectionStatus = status
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let updated = service::change_status(&pool, user, item, status)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("item {} is now '{}'", updated.id, updated.status);
        }
        Commands::Promote {
            user,
            id,
            status,
            platform,
        } => {
            let status = status
                .map(|raw| raw.parse::<CollectionStatus>())
                .transpose()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let (_steam, catalog) = build_clients(&config)?;
            let resolver = questlog_import::CatalogResolver::new(
                &catalog,
                SimilarityConfig {
                    threshold: config.similarity_threshold,
                    distance: config.similarity_distance,
                },
                "PC (Microsoft Windows)",
            );
            let item = service::import_to_collection(&pool, &resolver, user, id, status, &platform)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("added to collection as item {} ('{}')", item.id, item.status);
        }
        Commands::Dismiss { user, id, ignore } => {
            service::dismiss_imported_game(&pool, user, id, ignore)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("dismissed imported game {id}");
        }
        Commands::Counts { user } => {
            let counts = service::collection_status_counts(&pool, user)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            for entry in counts {
                println!("{:<20} {}", entry.status, entry.count);
            }
        }
    }

    Ok(())
}

fn build_clients(config: &AppConfig) -> anyhow::Result<(SteamClient, CatalogClient)> {
    let Some(steam_key) = config.steam_api_key.as_deref() else {
        bail!("STEAM_API_KEY is not set");
    };
    let Some(catalog_key) = config.catalog_api_key.as_deref() else {
        bail!("CATALOG_API_KEY is not set");
    };

    let steam = SteamClient::new(
        steam_key,
        config.client_request_timeout_secs,
        &config.client_user_agent,
        config.client_max_retries,
        config.client_retry_backoff_base_ms,
    )
    .context("failed to build storefront client")?;
    let catalog = CatalogClient::new(
        catalog_key,
        &config.catalog_base_url,
        config.client_request_timeout_secs,
        &config.client_user_agent,
        config.client_max_retries,
        config.client_retry_backoff_base_ms,
    )
    .context("failed to build catalog client")?;

    Ok((steam, catalog))
}

fn runner_config(config: &AppConfig) -> RunnerConfig {
    RunnerConfig {
        similarity: SimilarityConfig {
            threshold: config.similarity_threshold,
            distance: config.similarity_distance,
        },
        ..Default::default()
    }
}

fn parse_sort(raw: &str) -> anyhow::Result<SortKey> {
    Ok(match raw {
        "name_asc" => SortKey::NameAsc,
        "name_desc" => SortKey::NameDesc,
        "playtime_asc" => SortKey::PlaytimeAsc,
        "playtime_desc" => SortKey::PlaytimeDesc,
        "last_played_asc" => SortKey::LastPlayedAsc,
        "last_played_desc" => SortKey::LastPlayedDesc,
        "created_asc" => SortKey::CreatedAsc,
        "created_desc" => SortKey::CreatedDesc,
        other => bail!("unknown sort key: {other}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_parse() {
        assert!(matches!(
            parse_sort("playtime_desc").unwrap(),
            SortKey::PlaytimeDesc
        ));
        assert!(parse_sort("sideways").is_err());
    }
}
