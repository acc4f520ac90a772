use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::generator::TextGenerator;

/// A mock text generator that routes on user-prompt content.
///
/// Rules are matched in registration order against the user prompt, so
/// concurrent stages (angles and email run at the same time) each get
/// their scripted payload regardless of call order.
#[derive(Debug, Default)]
pub struct MockTextGenerator {
    rules: Vec<(String, String)>,
    calls: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    /// Create a mock with no rules; every call fails until rules are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `response` whenever the user prompt contains `pattern`.
    #[must_use]
    pub fn respond_to(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((pattern.into(), response.into()));
        self
    }

    /// User prompts seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        _system: &str,
        user: &str,
        _temperature: f64,
    ) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(user.to_owned());
        }
        self.rules
            .iter()
            .find(|(pattern, _)| user.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| LlmError::Api(format!("no scripted response matches prompt: {user}")))
    }
}

/// A mock text generator that always returns an error.
#[derive(Debug, Clone)]
pub struct FailingTextGenerator {
    error_message: String,
}

impl FailingTextGenerator {
    /// Create a failing generator with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for FailingTextGenerator {
    async fn generate(
        &self,
        _system: &str,
        _user: &str,
        _temperature: f64,
    ) -> Result<String, LlmError> {
        Err(LlmError::Api(self.error_message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_on_prompt_content() {
        let mock = MockTextGenerator::new()
            .respond_to("marketing brief", r#"{"kind": "brief"}"#)
            .respond_to("marketing email", r#"{"kind": "email"}"#);

        let brief = mock
            .generate("sys", "generate a marketing brief", 0.3)
            .await
            .unwrap();
        assert!(brief.contains("brief"));

        let email = mock
            .generate("sys", "write a marketing email", 0.6)
            .await
            .unwrap();
        assert!(email.contains("email"));
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn unmatched_prompt_errors() {
        let mock = MockTextGenerator::new();
        let result = mock.generate("sys", "anything", 0.5).await;
        assert!(matches!(result, Err(LlmError::Api(_))));
    }

    #[tokio::test]
    async fn failing_generator() {
        let generator = FailingTextGenerator::new("service unavailable");
        let result = generator.generate("sys", "user", 0.5).await;
        assert!(matches!(result, Err(LlmError::Api(_))));
    }
}
