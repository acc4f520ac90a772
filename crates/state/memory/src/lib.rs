//! In-memory [`SessionStore`](copysmith_state::SessionStore) backend.
//!
//! Backed by [`dashmap::DashMap`]; intended for tests and development.
//! Selecting it is an explicit configuration choice, never a runtime
//! fallback for an unreachable durable backend.

mod store;

pub use store::MemorySessionStore;
