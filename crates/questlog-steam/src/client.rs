//! HTTP client for the Steam Web API.
//!
//! Wraps `reqwest` with typed error handling, API key management, and
//! automatic retry of transient failures. Private profiles are surfaced as
//! [`SteamError::ProfilePrivate`] rather than a generic failure so callers
//! can show actionable copy.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::SteamError;
use crate::retry::retry_with_backoff;
use crate::types::{
    OwnedGame, OwnedGamesEnvelope, PlayerProfile, SummariesEnvelope, VanityEnvelope,
};

const DEFAULT_BASE_URL: &str = "https://api.steampowered.com/";

/// Client for the Steam Web API.
///
/// Use [`SteamClient::new`] for production or [`SteamClient::with_base_url`]
/// to point at a mock server in tests.
pub struct SteamClient {
    client: Client,
    api_key: String,
    base_url: Url,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    backoff_base_ms: u64,
}

impl SteamClient {
    /// Creates a new client pointed at the production Steam API.
    ///
    /// # Errors
    ///
    /// Returns [`SteamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SteamError> {
        Self::with_base_url(
            api_key,
            timeout_secs,
            user_agent,
            max_retries,
            backoff_base_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SteamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SteamError::NotFound`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, SteamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| SteamError::NotFound(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Resolves a vanity handle (custom profile URL segment) to a 64-bit id.
    ///
    /// # Errors
    ///
    /// - [`SteamError::NotFound`] if the handle does not resolve.
    /// - [`SteamError::RateLimited`] / [`SteamError::Unavailable`] on 429/5xx
    ///   after retries are exhausted.
    /// - [`SteamError::Http`] / [`SteamError::Deserialize`] on transport or
    ///   decoding failure.
    pub async fn resolve_vanity(&self, handle: &str) -> Result<String, SteamError> {
        let url = self.build_url(
            "ISteamUser/ResolveVanityURL/v1/",
            &[("vanityurl", handle)],
        );
        let envelope: VanityEnvelope = self.get_json(&url, "resolveVanity").await?;

        if envelope.response.success == 1 {
            if let Some(steam_id) = envelope.response.steamid {
                tracing::debug!(handle, steam_id, "resolved vanity handle");
                return Ok(steam_id);
            }
        }
        Err(SteamError::NotFound(format!(
            "no profile for handle '{handle}'"
        )))
    }

    /// Fetches a player's profile summary.
    ///
    /// # Errors
    ///
    /// - [`SteamError::NotFound`] if the id matches no profile.
    /// - [`SteamError::ProfilePrivate`] if the profile is not public.
    /// - Transport/decoding errors as in [`SteamClient::resolve_vanity`].
    pub async fn player_summary(&self, steam_id: &str) -> Result<PlayerProfile, SteamError> {
        let url = self.build_url(
            "ISteamUser/GetPlayerSummaries/v2/",
            &[("steamids", steam_id)],
        );
        let envelope: SummariesEnvelope = self.get_json(&url, "playerSummary").await?;

        let player = envelope
            .response
            .players
            .into_iter()
            .next()
            .ok_or_else(|| SteamError::NotFound(format!("no profile for id '{steam_id}'")))?;

        let profile = PlayerProfile::from(player);
        if !profile.is_public {
            return Err(SteamError::ProfilePrivate);
        }
        Ok(profile)
    }

    /// Fetches the player's owned games with playtime and artwork metadata.
    ///
    /// An absent `games` array alongside a nonzero `game_count` is Steam's
    /// way of saying the game details are private; that maps to
    /// [`SteamError::ProfilePrivate`]. An absent array with a zero count is
    /// an genuinely empty library.
    ///
    /// # Errors
    ///
    /// Transport/decoding errors as in [`SteamClient::resolve_vanity`].
    pub async fn owned_games(&self, steam_id: &str) -> Result<Vec<OwnedGame>, SteamError> {
        let url = self.build_url(
            "IPlayerService/GetOwnedGames/v1/",
            &[
                ("steamid", steam_id),
                ("include_appinfo", "1"),
                ("include_played_free_games", "1"),
            ],
        );
        let envelope: OwnedGamesEnvelope = self.get_json(&url, "ownedGames").await?;

        match envelope.response.games {
            Some(games) => {
                tracing::debug!(steam_id, count = games.len(), "fetched owned games");
                Ok(games.into_iter().map(OwnedGame::from).collect())
            }
            None if envelope.response.game_count > 0 => Err(SteamError::ProfilePrivate),
            None => Ok(Vec::new()),
        }
    }

    /// Builds the full request URL with the API key and percent-encoded
    /// query parameters.
    fn build_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self
            .base_url
            .join(endpoint)
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends a GET request with retry, classifies the status, and parses the
    /// body into `T`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, SteamError> {
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();
            if status.as_u16() == 429 {
                return Err(SteamError::RateLimited);
            }
            if status.is_server_error() {
                return Err(SteamError::Unavailable {
                    status: status.as_u16(),
                });
            }
            if !status.is_success() {
                return Err(SteamError::UnexpectedStatus {
                    status: status.as_u16(),
                    endpoint: context.to_owned(),
                });
            }
            Ok(response.text().await?)
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| SteamError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> SteamClient {
        SteamClient::with_base_url("test-key", 5, "questlog-test/0.1", 0, 0, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_includes_key_and_params() {
        let client = test_client("https://api.steampowered.com");
        let url = client.build_url("ISteamUser/ResolveVanityURL/v1/", &[("vanityurl", "gaben")]);
        assert_eq!(
            url.as_str(),
            "https://api.steampowered.com/ISteamUser/ResolveVanityURL/v1/?key=test-key&vanityurl=gaben"
        );
    }

    #[test]
    fn build_url_encodes_special_characters() {
        let client = test_client("https://api.steampowered.com");
        let url = client.build_url("ISteamUser/ResolveVanityURL/v1/", &[("vanityurl", "a b&c")]);
        assert!(
            url.as_str().contains("a+b%26c") || url.as_str().contains("a%20b%26c"),
            "query param should be percent-encoded: {url}"
        );
    }
}
