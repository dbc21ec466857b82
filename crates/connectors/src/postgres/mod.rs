pub mod adapter;
pub mod encoder;
pub mod params;
pub mod schema;
pub mod table;

pub use adapter::PgAdapter;
pub use schema::{ColumnSpec, NamespaceConfig, PostgresTarget, SchemaConfig};
pub use table::PgTableHandle;
