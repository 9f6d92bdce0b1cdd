//! Client for the Steam Web API endpoints questlog consumes: vanity-handle
//! resolution, player summaries (with private-profile detection), and the
//! owned-games listing that feeds the import pipeline.

mod client;
mod error;
mod retry;
mod types;

pub use client::SteamClient;
pub use error::SteamError;
pub use types::{OwnedGame, PlayerProfile};
