use std::time::Duration;

/// Configuration for the HTTP image engine client.
#[derive(Clone)]
pub struct ImageEngineConfig {
    /// Engine base URL (trailing slash tolerated).
    pub base_url: String,
    /// API key for Bearer authentication.
    pub api_key: String,
    /// Fixed delay between status polls.
    pub poll_interval: Duration,
    /// Timeout for the submit request.
    pub submit_timeout: Duration,
    /// Timeout for each individual status query.
    pub poll_timeout: Duration,
}

impl std::fmt::Debug for ImageEngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageEngineConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("poll_interval", &self.poll_interval)
            .field("submit_timeout", &self.submit_timeout)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl ImageEngineConfig {
    /// Create a config with default timings: 3s poll interval, 30s
    /// submit timeout, 10s poll-query timeout.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            poll_interval: Duration::from_secs(3),
            submit_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(10),
        }
    }

    /// Set the delay between status polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the submit request timeout.
    #[must_use]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Set the per-query poll timeout.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ImageEngineConfig::new("https://engine.example.com", "key");
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.submit_timeout, Duration::from_secs(30));
        assert_eq!(config.poll_timeout, Duration::from_secs(10));
    }

    #[test]
    fn builder_chain() {
        let config = ImageEngineConfig::new("https://engine.example.com", "key")
            .with_poll_interval(Duration::from_millis(50))
            .with_submit_timeout(Duration::from_secs(5))
            .with_poll_timeout(Duration::from_secs(2));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.submit_timeout, Duration::from_secs(5));
        assert_eq!(config.poll_timeout, Duration::from_secs(2));
    }

    #[test]
    fn debug_redacts_api_key() {
        let debug = format!("{:?}", ImageEngineConfig::new("u", "top-secret"));
        assert!(!debug.contains("top-secret"));
    }
}
