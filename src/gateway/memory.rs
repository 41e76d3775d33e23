//! In-memory warehouse used by tests.

use std::sync::{Arc, Mutex};

use anyhow::bail;
use serde_json::json;
use warehouse_connector::{InsertBatch, LoadMode};

use super::{Credentials, LoadSummary, QueryOutput, Warehouse, WarehouseSession};

/// Records every statement and load. Statements containing `INVALID` and
/// loads into a table named `rejected` fail; every fetched query yields `42`.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryWarehouse {
    statements: Arc<Mutex<Vec<String>>>,
    loads: Arc<Mutex<Vec<(String, LoadMode, usize)>>>,
}

impl MemoryWarehouse {
    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub(crate) fn loads(&self) -> Vec<(String, LoadMode, usize)> {
        self.loads.lock().unwrap().clone()
    }
}

impl Warehouse for MemoryWarehouse {
    type Session = MemorySession;

    async fn open(&self, credentials: &Credentials) -> anyhow::Result<MemorySession> {
        if credentials.account.is_empty() {
            bail!("account must not be empty");
        }
        Ok(MemorySession {
            database: credentials.database.clone(),
            schema: credentials.schema.clone(),
            warehouse: self.clone(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct MemorySession {
    database: String,
    schema: String,
    warehouse: MemoryWarehouse,
}

impl WarehouseSession for MemorySession {
    fn database(&self) -> &str {
        &self.database
    }

    fn schema(&self) -> &str {
        &self.schema
    }

    async fn execute(&self, sql: &str, fetch_results: bool) -> anyhow::Result<QueryOutput> {
        self.warehouse.statements.lock().unwrap().push(sql.to_owned());
        if sql.contains("INVALID") {
            bail!("SQL compilation error: syntax error line 1 at position 0");
        }
        if !fetch_results {
            return Ok(QueryOutput::executed());
        }
        Ok(QueryOutput::Rows {
            columns: vec!["VALUE".into()],
            data: vec![vec![json!(42)]],
        })
    }

    async fn bulk_insert(
        &self,
        table: &str,
        batch: &InsertBatch,
        mode: LoadMode,
    ) -> anyhow::Result<LoadSummary> {
        if table == "rejected" {
            bail!("table {table} rejected the load");
        }
        self.warehouse
            .loads
            .lock()
            .unwrap()
            .push((table.to_owned(), mode, batch.len()));
        Ok(LoadSummary {
            success: true,
            chunks: batch.len().div_ceil(10_000).max(1),
            rows: batch.len(),
        })
    }
}
