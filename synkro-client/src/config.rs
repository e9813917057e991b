//! Client configuration

use crate::{ClientError, ClientResult};

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co")
    pub base_url: String,

    /// Public API key sent as `apikey` on every request
    pub api_key: String,

    /// Access token of the signed-in user; the API key is used when absent
    pub access_token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            access_token: None,
            timeout: 30,
        }
    }

    /// Load from `SUPABASE_URL` / `SUPABASE_ANON_KEY`
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| ClientError::Config("SUPABASE_URL must be set".into()))?;
        let api_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| ClientError::Config("SUPABASE_ANON_KEY must be set".into()))?;
        let mut config = Self::new(base_url, api_key);
        if let Some(timeout) = std::env::var("SUPABASE_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
        {
            config.timeout = timeout;
        }
        Ok(config)
    }

    /// Set the user's access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Create a REST gateway from this configuration
    pub fn build_gateway(&self) -> ClientResult<crate::gateway::RestGateway> {
        crate::gateway::RestGateway::new(self)
    }
}
