use crate::postgres::adapter::PgAdapter;
use async_trait::async_trait;
use model::contracts::{SqlError, TableHandle};

/// A handle to one target table, backed by the same live connection the
/// rest of the adapter uses.
pub struct PgTableHandle {
    name: String,
    adapter: PgAdapter,
}

impl PgTableHandle {
    pub fn new(name: String, adapter: PgAdapter) -> Self {
        PgTableHandle { name, adapter }
    }
}

#[async_trait]
impl TableHandle for PgTableHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn truncate(&self) -> Result<(), SqlError> {
        self.adapter.truncate_table(&self.name).await
    }
}
