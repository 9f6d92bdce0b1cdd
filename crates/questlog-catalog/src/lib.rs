//! Client for the external game-metadata catalog: name search with platform
//! filtering and canonical-record fetch by id. The catalog resolver in the
//! import pipeline is this crate's only consumer.

mod client;
mod error;
mod types;

pub use client::CatalogClient;
pub use error::CatalogError;
pub use types::CatalogGame;
