use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::engine::ImageEngine;
use crate::error::ImageEngineError;

#[derive(Debug, Clone)]
enum Scripted {
    Succeed { urls: Vec<String>, delay: Duration },
    Fail { message: String, delay: Duration },
}

/// A mock engine with per-prompt scripted outcomes and latencies.
///
/// Outcomes are matched by exact prompt text. Calls are counted so tests
/// can assert that an empty batch issues zero network calls.
#[derive(Debug, Default)]
pub struct MockImageEngine {
    scripts: Mutex<Vec<(String, Scripted)>>,
    calls: AtomicUsize,
}

impl MockImageEngine {
    /// Create a mock with no scripted outcomes; every call fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `prompt` to succeed immediately with a single URL.
    pub fn succeed(&self, prompt: impl Into<String>, url: impl Into<String>) {
        self.succeed_after(prompt, url, Duration::ZERO);
    }

    /// Script `prompt` to succeed with a single URL after `delay`.
    pub fn succeed_after(
        &self,
        prompt: impl Into<String>,
        url: impl Into<String>,
        delay: Duration,
    ) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.push((
                prompt.into(),
                Scripted::Succeed {
                    urls: vec![url.into()],
                    delay,
                },
            ));
        }
    }

    /// Script `prompt` to fail immediately with the given message.
    pub fn fail(&self, prompt: impl Into<String>, message: impl Into<String>) {
        self.fail_after(prompt, message, Duration::ZERO);
    }

    /// Script `prompt` to fail with the given message after `delay`.
    pub fn fail_after(
        &self,
        prompt: impl Into<String>,
        message: impl Into<String>,
        delay: Duration,
    ) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.push((
                prompt.into(),
                Scripted::Fail {
                    message: message.into(),
                    delay,
                },
            ));
        }
    }

    /// Total `submit_and_await` invocations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn script_for(&self, prompt: &str) -> Option<Scripted> {
        self.scripts.lock().ok().and_then(|scripts| {
            scripts
                .iter()
                .find(|(p, _)| p == prompt)
                .map(|(_, s)| s.clone())
        })
    }
}

#[async_trait]
impl ImageEngine for MockImageEngine {
    async fn submit_and_await(
        &self,
        prompt: &str,
        _label: &str,
    ) -> Result<Vec<String>, ImageEngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.script_for(prompt) {
            Some(Scripted::Succeed { urls, delay }) => {
                sleep(delay).await;
                Ok(urls)
            }
            Some(Scripted::Fail { message, delay }) => {
                sleep(delay).await;
                Err(ImageEngineError::JobFailed(message))
            }
            None => Err(ImageEngineError::Rejected(format!(
                "no scripted outcome for prompt: {prompt}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_success() {
        let engine = MockImageEngine::new();
        engine.succeed("p", "https://cdn/x.png");
        let urls = engine.submit_and_await("p", "job").await.unwrap();
        assert_eq!(urls, vec!["https://cdn/x.png".to_owned()]);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn scripted_failure() {
        let engine = MockImageEngine::new();
        engine.fail("p", "engine timeout");
        let result = engine.submit_and_await("p", "job").await;
        assert!(matches!(result, Err(ImageEngineError::JobFailed(m)) if m == "engine timeout"));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_success_waits() {
        let engine = MockImageEngine::new();
        engine.succeed_after("p", "https://cdn/x.png", Duration::from_secs(300));
        let started = tokio::time::Instant::now();
        engine.submit_and_await("p", "job").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn unscripted_prompt_is_rejected() {
        let engine = MockImageEngine::new();
        assert!(engine.submit_and_await("unknown", "job").await.is_err());
    }
}
