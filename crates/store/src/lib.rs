//! Client-local storage for the authentication core.
//!
//! Provides [`KeyValueStore`](jobtrackr_types::KeyValueStore) backends (an
//! in-memory map for tests and ephemeral use, `SQLite` for the CLI) and the
//! typed [`TokenStore`] that persists the token triple and the pending PKCE
//! verifier on top of any of them.

pub mod memory;
pub mod sqlite;
pub mod tokens;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use tokens::TokenStore;
