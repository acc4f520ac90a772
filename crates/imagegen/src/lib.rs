//! External image-generation engine client.
//!
//! Wraps one long-running external job behind a single call:
//! submit the prompt, poll the job at a fixed interval until it reaches
//! a terminal state, and return the produced URLs. Engine latency is
//! unbounded and acceptable, so polling deliberately has **no overall
//! timeout** -- only each individual HTTP request is bounded.

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod mock;

pub use config::ImageEngineConfig;
pub use engine::ImageEngine;
pub use error::ImageEngineError;
pub use http::HttpImageEngine;
pub use mock::MockImageEngine;
