//! The external-library reconciliation pipeline.
//!
//! A raw storefront payload flows through four stages: the merge stage
//! collapses duplicate entries, the filter stage drops what the user already
//! tracks or has ignored, the upsert store persists the survivors, and the
//! catalog resolver links each row to a canonical game record. The produced
//! interface in [`service`] is what outer surfaces (CLI today) call.

mod error;
pub mod filter;
pub mod merge;
pub mod normalize;
pub mod resolver;
pub mod runner;
pub mod service;
pub mod similarity;

pub use error::ImportError;
pub use filter::{CollectionEntry, FilterConfig};
pub use resolver::{CatalogResolver, Resolution, ResolvedGame};
pub use runner::{ImportOutcome, ImportRunner, RunnerConfig};
pub use similarity::{JaroWinklerIndex, SimilarityConfig, SimilarityHit, SimilarityIndex};
