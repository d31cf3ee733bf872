//! Relational storage for accounts, courts and the activity log.
//!
//! Backed by libsql: in-memory or file SQLite for local runs and tests,
//! remote Turso behind the `turso` feature.

pub mod traits;
pub mod turso;

pub use traits::{DatabaseClient, DatabaseProvider};
pub use turso::TursoClient;
