#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub steam_api_key: Option<String>,
    pub catalog_api_key: Option<String>,
    pub catalog_base_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub client_request_timeout_secs: u64,
    pub client_user_agent: String,
    pub client_max_retries: u32,
    pub client_retry_backoff_base_ms: u64,
    pub similarity_threshold: f64,
    pub similarity_distance: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "steam_api_key",
                &self.steam_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "catalog_api_key",
                &self.catalog_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("catalog_base_url", &self.catalog_base_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "client_request_timeout_secs",
                &self.client_request_timeout_secs,
            )
            .field("client_user_agent", &self.client_user_agent)
            .field("client_max_retries", &self.client_max_retries)
            .field(
                "client_retry_backoff_base_ms",
                &self.client_retry_backoff_base_ms,
            )
            .field("similarity_threshold", &self.similarity_threshold)
            .field("similarity_distance", &self.similarity_distance)
            .finish()
    }
}
