//! HTTP client for the metadata catalog REST API.
//!
//! Same conventions as the Steam client: typed status classification, an
//! envelope-level `"status"` check, and retry with exponential back-off on
//! transient failures.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::CatalogError;
use crate::types::{CatalogGame, GameEnvelope, SearchEnvelope};

/// Client for the metadata catalog.
pub struct CatalogClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl CatalogClient {
    /// Creates a client against the given catalog base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`CatalogError::ApiError`] if `base_url` is
    /// not a valid URL.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| CatalogError::ApiError(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Searches the catalog by (already normalized) name, optionally
    /// restricted to a platform.
    ///
    /// Returns the catalog's ranked result list; picking a winner above the
    /// similarity threshold is the resolver's job, not the client's.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ApiError`] if the envelope reports an error.
    /// - [`CatalogError::RateLimited`] / [`CatalogError::Unavailable`] on
    ///   429/5xx after retries are exhausted.
    /// - [`CatalogError::Http`] / [`CatalogError::Deserialize`] on transport
    ///   or decoding failure.
    pub async fn search_by_name(
        &self,
        name: &str,
        platform: Option<&str>,
    ) -> Result<Vec<CatalogGame>, CatalogError> {
        let mut params = vec![("query", name)];
        if let Some(p) = platform {
            params.push(("platform", p));
        }
        let url = self.build_url("games/search", &params);
        let body = self.get_json(&url, &format!("search(query={name})")).await?;
        Self::check_api_error(&body)?;

        let envelope: SearchEnvelope =
            serde_json::from_value(body).map_err(|e| CatalogError::Deserialize {
                context: format!("search(query={name})"),
                source: e,
            })?;

        Ok(envelope.results)
    }

    /// Fetches one canonical record by catalog id.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when the id is unknown; otherwise as
    /// [`CatalogClient::search_by_name`].
    pub async fn get_by_id(&self, id: i64) -> Result<CatalogGame, CatalogError> {
        let url = self.build_url(&format!("games/{id}"), &[]);
        let body = match self.get_json(&url, &format!("getById({id})")).await {
            // A 404 on the id endpoint is a terminal "no such record".
            Err(CatalogError::ApiError(msg)) if msg.contains("404") => {
                return Err(CatalogError::NotFound { id });
            }
            other => other?,
        };
        Self::check_api_error(&body)?;

        let envelope: GameEnvelope =
            serde_json::from_value(body).map_err(|e| CatalogError::Deserialize {
                context: format!("getById({id})"),
                source: e,
            })?;

        Ok(envelope.game)
    }

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

    async fn get_json(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<serde_json::Value, CatalogError> {
        let body = retry_transient(self.max_retries, self.backoff_base_ms, || async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();
            if status.as_u16() == 429 {
                return Err(CatalogError::RateLimited);
            }
            if status.is_server_error() {
                return Err(CatalogError::Unavailable {
                    status: status.as_u16(),
                });
            }
            if !status.is_success() {
                return Err(CatalogError::ApiError(format!(
                    "unexpected status {} from catalog",
                    status.as_u16()
                )));
            }
            Ok(response.text().await?)
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| CatalogError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    fn check_api_error(body: &serde_json::Value) -> Result<(), CatalogError> {
        if body.get("status").and_then(serde_json::Value::as_str) == Some("error") {
            let msg = body
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(CatalogError::ApiError(msg));
        }
        Ok(())
    }
}

/// Retries `operation` on transient errors with exponential back-off and
/// ±25 % jitter, capped at 60 s per delay.
async fn retry_transient<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms =
                    (computed.min(MAX_DELAY_MS) as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "catalog transient error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> CatalogClient {
        CatalogClient::new("test-key", base_url, 5, "questlog-test/0.1", 0, 0)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_appends_key_and_query() {
        let client = test_client("https://api.gamecatalog.dev");
        let url = client.build_url("games/search", &[("query", "outer wilds"), ("platform", "PC")]);
        assert_eq!(
            url.as_str(),
            "https://api.gamecatalog.dev/games/search?key=test-key&query=outer+wilds&platform=PC"
        );
    }

    #[test]
    fn check_api_error_passes_ok_envelopes() {
        let body = serde_json::json!({"status": "ok", "results": []});
        assert!(CatalogClient::check_api_error(&body).is_ok());
    }

    #[test]
    fn check_api_error_surfaces_error_message() {
        let body = serde_json::json!({"status": "error", "message": "bad key"});
        let err = CatalogClient::check_api_error(&body).unwrap_err();
        assert!(matches!(err, CatalogError::ApiError(msg) if msg == "bad key"));
    }
}
