//! Database layer
//!
//! SQLite connection handling and embedded migrations for the local content
//! store. The store itself lives in [`crate::store::sqlx_store`].

pub mod migrations;
pub mod pool;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
