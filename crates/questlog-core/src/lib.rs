pub mod app_config;
pub mod config;
mod error;
pub mod status;
mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use error::{DomainError, ErrorCode};
pub use status::CollectionStatus;
pub use types::{AcquisitionType, ImportCandidate, MatchStatus, Storefront};
