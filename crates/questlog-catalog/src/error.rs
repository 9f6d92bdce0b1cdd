use thiserror::Error;

/// Errors returned by the metadata catalog client.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog returned `"status": "error"` with a message.
    #[error("catalog API error: {0}")]
    ApiError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 429 from the catalog.
    #[error("rate limited by the catalog")]
    RateLimited,

    /// HTTP 5xx from the catalog.
    #[error("catalog unavailable (status {status})")]
    Unavailable { status: u16 },

    /// No catalog record for the requested id.
    #[error("catalog record {id} not found")]
    NotFound { id: i64 },
}

impl CatalogError {
    /// Whether a later retry could plausibly succeed. Terminal outcomes
    /// (not found, malformed data, application errors) return `false`.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Http(e) => e.is_timeout() || e.is_connect(),
            CatalogError::RateLimited | CatalogError::Unavailable { .. } => true,
            CatalogError::ApiError(_)
            | CatalogError::Deserialize { .. }
            | CatalogError::NotFound { .. } => false,
        }
    }
}
