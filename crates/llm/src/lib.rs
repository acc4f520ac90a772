//! Structured text generation.
//!
//! The pipeline's four text stages (brief, angles, email, image prompts)
//! all consume the same capability: send a system + user prompt to a
//! chat-completions endpoint and get JSON-shaped text back. The
//! [`parse::parse_llm_json`] helper turns that text into a typed asset,
//! salvaging fenced or decorated output before giving up.

pub mod config;
pub mod error;
pub mod generator;
pub mod http;
pub mod mock;
pub mod parse;

pub use config::TextModelConfig;
pub use error::LlmError;
pub use generator::TextGenerator;
pub use http::HttpTextGenerator;
pub use mock::{FailingTextGenerator, MockTextGenerator};
pub use parse::parse_llm_json;
