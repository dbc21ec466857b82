//! Concrete implementations of `model::contracts` against real
//! collaborators: a MongoDB-compatible source driver, a PostgreSQL
//! target adapter/schema loader, and a sled-backed tailer.

pub mod mongo;
pub mod postgres;
pub mod tailer;

pub use mongo::MongoSource;
pub use postgres::{PgAdapter, PostgresTarget, SchemaConfig};
pub use tailer::SledTailer;
