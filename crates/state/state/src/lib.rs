//! Session/record store abstraction.
//!
//! The pipeline persists [`GenerationSession`](copysmith_core::GenerationSession)
//! records and their child images through the [`SessionStore`] trait.
//! Backends must be safe for concurrent access: in particular
//! [`SessionStore::increment_completed`] is called by N concurrent batch
//! workers and must not lose updates.

pub mod error;
pub mod store;
pub mod testing;

pub use error::StateError;
pub use store::SessionStore;
