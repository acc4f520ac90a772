//! Server configuration, loaded from a TOML file with environment
//! overrides for secrets.

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Copysmith server.
#[derive(Debug, Default, Deserialize)]
pub struct CopysmithConfig {
    /// HTTP bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication behavior.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Request validation limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Text model (chat completions) configuration.
    #[serde(default)]
    pub llm: LlmConfig,
    /// External image-generation engine configuration.
    #[serde(default)]
    pub image_engine: EngineConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Session store configuration.
    #[serde(default)]
    pub state: StateConfig,
    /// Image batch tuning.
    #[serde(default)]
    pub batch: BatchSection,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. `["*"]` allows any origin (development).
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    5000
}

/// Authentication behavior.
#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    /// Fallback user id when no credentials are supplied.
    ///
    /// Intended for development only; leave unset in production so
    /// unauthenticated requests are rejected.
    pub dev_fallback_user: Option<String>,
}

/// Request validation limits.
#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    /// Maximum images per generation request.
    #[serde(default = "default_max_images")]
    pub max_images: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_images: default_max_images(),
        }
    }
}

fn default_max_images() -> u32 {
    5
}

/// Text model configuration.
#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Model id.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API key. Overridden by `OPENAI_API_KEY` when set.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: String::new(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_owned()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_owned()
}

fn default_llm_timeout() -> u64 {
    60
}

/// External image-generation engine configuration.
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// Engine base URL. Overridden by `A2E_BASE_URL` when set.
    #[serde(default)]
    pub base_url: String,
    /// API key. Overridden by `A2E_API_KEY` when set.
    #[serde(default)]
    pub api_key: String,
    /// Seconds between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Submit request timeout in seconds.
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_seconds: u64,
    /// Per-poll-query timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            poll_interval_seconds: default_poll_interval(),
            submit_timeout_seconds: default_submit_timeout(),
            poll_timeout_seconds: default_poll_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    3
}

fn default_submit_timeout() -> u64 {
    30
}

fn default_poll_timeout() -> u64 {
    10
}

/// Object storage backend selection.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// `"supabase"` (durable, production) or `"memory"` (tests/dev).
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Supabase project URL. Overridden by `SUPABASE_URL` when set.
    #[serde(default)]
    pub url: String,
    /// Service-role key. Overridden by `SUPABASE_SERVICE_KEY` when set.
    #[serde(default)]
    pub service_key: String,
    /// Bucket for generated images.
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            url: String::new(),
            service_key: String::new(),
            bucket: default_bucket(),
        }
    }
}

fn default_storage_backend() -> String {
    "supabase".to_owned()
}

fn default_bucket() -> String {
    "marketing-images".to_owned()
}

/// Session store backend selection.
#[derive(Debug, Deserialize)]
pub struct StateConfig {
    /// `"postgres"` (durable, production) or `"memory"` (tests/dev).
    #[serde(default = "default_state_backend")]
    pub backend: String,
    /// Connection URL. Overridden by `DATABASE_URL` when set.
    #[serde(default)]
    pub url: String,
    /// Maximum pool connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: default_state_backend(),
            url: String::new(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_state_backend() -> String {
    "postgres".to_owned()
}

fn default_pool_size() -> u32 {
    5
}

/// Image batch tuning.
#[derive(Debug, Default, Deserialize)]
pub struct BatchSection {
    /// Optional cap on concurrently running items. Unset keeps the
    /// default true-parallel fan-out.
    pub max_concurrent: Option<usize>,
}

impl CopysmithConfig {
    /// Load configuration from an optional TOML file, then apply
    /// environment-variable overrides for secrets and endpoints.
    pub fn load(path: Option<&Path>) -> Result<Self, ServerError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ServerError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                toml::from_str(&raw)
                    .map_err(|e| ServerError::Config(format!("invalid config: {e}")))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment overrides. Secrets are expected from the
    /// environment in production deployments.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(url) = std::env::var("A2E_BASE_URL") {
            self.image_engine.base_url = url;
        }
        if let Ok(key) = std::env::var("A2E_API_KEY") {
            self.image_engine.api_key = key;
        }
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.storage.url = url;
        }
        if let Ok(key) = std::env::var("SUPABASE_SERVICE_KEY") {
            self.storage.service_key = key;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.state.url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = CopysmithConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.limits.max_images, 5);
        assert_eq!(config.image_engine.poll_interval_seconds, 3);
        assert_eq!(config.state.backend, "postgres");
        assert_eq!(config.storage.bucket, "marketing-images");
        assert!(config.batch.max_concurrent.is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let raw = r#"
            [server]
            port = 8080

            [state]
            backend = "memory"

            [batch]
            max_concurrent = 4
        "#;
        let config: CopysmithConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.state.backend, "memory");
        assert_eq!(config.batch.max_concurrent, Some(4));
        // Untouched sections keep defaults.
        assert_eq!(config.limits.max_images, 5);
    }
}
