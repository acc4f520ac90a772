/// Configuration for the HTTP text generator.
#[derive(Clone)]
pub struct TextModelConfig {
    /// OpenAI-compatible chat completions endpoint
    /// (e.g. `https://api.openai.com/v1/chat/completions`).
    pub endpoint: String,
    /// Model id (e.g. `gpt-4o-mini`).
    pub model: String,
    /// API key for Bearer authentication.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for TextModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextModelConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl TextModelConfig {
    /// Create a new config with a 60s default timeout.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout_seconds: 60,
        }
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TextModelConfig::new("https://api/v1/chat", "gpt-4o-mini", "sk-1");
        assert_eq!(config.timeout_seconds, 60);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = TextModelConfig::new("e", "m", "sk-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));
    }
}
