//! Memory store implementations for meetwise.
//!
//! Every store is append-only: turns read a session's full history and
//! write new records at the end.

pub mod noop;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use noop::NoopStore;
pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
