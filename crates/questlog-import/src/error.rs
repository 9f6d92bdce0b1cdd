use thiserror::Error;

/// Errors crossing the import pipeline's boundary.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid storefront handle: {0}")]
    InvalidHandle(String),

    #[error(transparent)]
    Steam(#[from] questlog_steam::SteamError),

    #[error(transparent)]
    Catalog(#[from] questlog_catalog::CatalogError),

    #[error(transparent)]
    Db(#[from] questlog_db::DbError),
}
