//! Warehouse gateway.
//!
//! Holds at most one warehouse session and forwards statements and bulk loads
//! to it. The session sits behind an async `RwLock`: statements and loads share
//! it, while `connect` and `disconnect` swap it exclusively, so no caller ever
//! sees a half-replaced session. A disconnected gateway fails every call with
//! [GatewayError::NotConnected]; it never reconnects on its own.

#[cfg(test)]
pub(crate) mod memory;
mod snowflake;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use warehouse_connector::insert::is_valid_identifier;
use warehouse_connector::{InsertBatch, InsertSummary, SnowflakeInsert};

pub use snowflake::{SnowflakeSession, SnowflakeWarehouse};
pub use warehouse_connector::LoadMode;

use crate::error::GatewayError;

pub type LoadSummary = InsertSummary;

/// Opens sessions against a warehouse.
pub trait Warehouse: Send + Sync + 'static {
    type Session: WarehouseSession;

    fn open(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = anyhow::Result<Self::Session>> + Send;
}

/// A live, verified warehouse session.
pub trait WarehouseSession: Send + Sync + 'static {
    fn database(&self) -> &str;

    fn schema(&self) -> &str;

    fn execute(
        &self,
        sql: &str,
        fetch_results: bool,
    ) -> impl Future<Output = anyhow::Result<QueryOutput>> + Send;

    fn bulk_insert(
        &self,
        table: &str,
        batch: &InsertBatch,
        mode: LoadMode,
    ) -> impl Future<Output = anyhow::Result<LoadSummary>> + Send;
}

fn default_warehouse() -> String {
    "COMPUTE_WH".into()
}

fn default_database() -> String {
    "FINANCIAL_DW".into()
}

fn default_schema() -> String {
    "PUBLIC".into()
}

/// Connection request as sent by API callers
#[derive(Deserialize, Clone, Default)]
pub struct Credentials {
    pub account: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// PKCS#8 PEM key for key-pair authentication
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub oauth_token: Option<String>,
    #[serde(default = "default_warehouse")]
    pub warehouse: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("private_key", &redact(&self.private_key))
            .field("oauth_token", &redact(&self.oauth_token))
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .finish()
    }
}

/// Result of a forwarded statement
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum QueryOutput {
    Rows {
        columns: Vec<String>,
        data: Vec<Vec<Value>>,
    },
    Executed {
        message: String,
    },
}

impl QueryOutput {
    pub fn executed() -> Self {
        QueryOutput::Executed {
            message: "Query executed successfully".into(),
        }
    }

    pub fn first_cell(&self) -> Option<&Value> {
        match self {
            QueryOutput::Rows { data, .. } => data.first().and_then(|row| row.first()),
            QueryOutput::Executed { .. } => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected { database: String, schema: String },
    Disconnected,
}

pub struct WarehouseGateway<W: Warehouse> {
    warehouse: W,
    session: RwLock<Option<W::Session>>,
}

impl<W: Warehouse> WarehouseGateway<W> {
    pub fn new(warehouse: W) -> Self {
        WarehouseGateway {
            warehouse,
            session: RwLock::new(None),
        }
    }

    /// Opens a new session and replaces the current one.
    ///
    /// On failure the current session, if any, stays in place.
    pub async fn connect(&self, credentials: &Credentials) -> Result<(), GatewayError> {
        let session = self.warehouse.open(credentials).await.map_err(|e| {
            tracing::error!(account = %credentials.account, "Failed to connect to Snowflake: {e:#}");
            GatewayError::connection(e)
        })?;
        let database = session.database().to_owned();
        let previous = self.session.write().await.replace(session);
        if previous.is_some() {
            tracing::info!("replaced previous Snowflake session");
        }
        tracing::info!(%database, "Successfully connected to Snowflake");
        Ok(())
    }

    /// Drops the current session, returning whether there was one.
    pub async fn disconnect(&self) -> bool {
        let closed = self.session.write().await.take().is_some();
        if closed {
            tracing::info!("closed Snowflake session");
        }
        closed
    }

    pub async fn status(&self) -> ConnectionStatus {
        match self.session.read().await.as_ref() {
            Some(session) => ConnectionStatus::Connected {
                database: session.database().to_owned(),
                schema: session.schema().to_owned(),
            },
            None => ConnectionStatus::Disconnected,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Forwards `sql` verbatim; the statement is neither validated nor rewritten.
    pub async fn execute(&self, sql: &str, fetch_results: bool) -> Result<QueryOutput, GatewayError> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(GatewayError::NotConnected)?;
        session.execute(sql, fetch_results).await.map_err(|e| {
            tracing::error!("Query execution failed: {e:#}");
            GatewayError::query(e)
        })
    }

    pub async fn bulk_load<T: SnowflakeInsert + Sync>(
        &self,
        rows: &[T],
        table: &str,
        mode: LoadMode,
    ) -> Result<LoadSummary, GatewayError> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(GatewayError::NotConnected)?;
        if !is_valid_identifier(table) {
            return Err(GatewayError::Load(format!(
                "`{table}` is not a plain SQL identifier"
            )));
        }
        let batch = InsertBatch::from_records(rows);
        let summary = session.bulk_insert(table, &batch, mode).await.map_err(|e| {
            tracing::error!(table, "Table load failed: {e:#}");
            GatewayError::load(e)
        })?;
        tracing::info!(table, rows = summary.rows, chunks = summary.chunks, "loaded table");
        Ok(summary)
    }
}
