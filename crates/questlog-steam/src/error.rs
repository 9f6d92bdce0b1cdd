use thiserror::Error;

/// Errors returned by the Steam Web API client.
#[derive(Debug, Error)]
pub enum SteamError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 429 from Steam.
    #[error("rate limited by Steam")]
    RateLimited,

    /// HTTP 5xx from Steam.
    #[error("Steam unavailable (status {status})")]
    Unavailable { status: u16 },

    /// The handle or profile does not exist.
    #[error("Steam profile not found: {0}")]
    NotFound(String),

    /// The profile exists but its game details are not public.
    #[error("Steam profile game details are private")]
    ProfilePrivate,

    /// Any other non-2xx status.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },
}
