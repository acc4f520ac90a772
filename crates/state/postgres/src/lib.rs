//! PostgreSQL-backed [`SessionStore`](copysmith_state::SessionStore).
//!
//! Uses `sqlx::PgPool` for connection pooling. The completed-image
//! counter is incremented with a single database-side
//! `SET completed_images = completed_images + 1`, which is race-safe
//! under concurrent batch workers.

mod bootstrap;
mod config;
mod store;

pub use config::PostgresConfig;
pub use store::PostgresSessionStore;
