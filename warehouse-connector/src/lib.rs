use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;

pub mod bindings;
pub mod cells;
pub mod data_manipulation;
pub mod errors;
pub mod insert;
pub mod jwt;

pub use bindings::{Binding, BindingKind, BindingPayload, BindingValue};
pub use data_manipulation::{Changes, DataManipulationResult};
pub use errors::{SnowflakeError, SnowflakeResult};
pub use insert::{Column, InsertBatch, InsertSummary, LoadMode, SnowflakeInsert};

/// How the connector proves its identity to the SQL API
#[derive(Clone)]
pub enum Auth {
    /// PKCS#8 PEM private key registered on the user
    KeyPair(String),
    /// OAuth access token
    OAuth(String),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::KeyPair(_) => f.write_str("KeyPair(<redacted>)"),
            Auth::OAuth(_) => f.write_str("OAuth(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Account identifier, e.g. `myorg-myaccount` or `xy12345.us-east-1`
    pub account: String,
    pub user: String,
    pub auth: Auth,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    pub role: Option<String>,
}

/// Database context sent with every statement; the SQL API keeps no session.
#[derive(Serialize, Debug, Clone)]
struct StatementContext {
    database: String,
    schema: String,
    warehouse: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Debug)]
pub struct SnowflakeConnector {
    host: String,
    client: reqwest::Client,
    context: StatementContext,
}

impl SnowflakeConnector {
    pub fn try_new(config: &ConnectionConfig) -> SnowflakeResult<Self> {
        validate_account(&config.account)?;
        if config.user.trim().is_empty() {
            return Err(SnowflakeError::Settings("user must not be empty".into()));
        }
        let (token, token_type) = match &config.auth {
            Auth::KeyPair(private_key) => {
                let key_pair = jwt::key_pair_from_pem(private_key)?;
                (
                    jwt::create_token(&key_pair, &config.account, &config.user)?,
                    "KEYPAIR_JWT",
                )
            }
            Auth::OAuth(token) if token.trim().is_empty() => {
                return Err(SnowflakeError::Settings("oauth token must not be empty".into()));
            }
            Auth::OAuth(token) => (token.clone(), "OAUTH"),
        };
        let client = reqwest::Client::builder()
            .default_headers(Self::get_headers(&token, token_type)?)
            .build()
            .map_err(SnowflakeError::Client)?;
        Ok(SnowflakeConnector {
            host: format!("https://{}.snowflakecomputing.com/api/v2/", config.account),
            client,
            context: StatementContext {
                database: config.database.clone(),
                schema: config.schema.clone(),
                warehouse: config.warehouse.clone(),
                role: config.role.clone(),
            },
        })
    }

    pub fn database(&self) -> &str {
        &self.context.database
    }

    pub fn schema(&self) -> &str {
        &self.context.schema
    }

    pub fn sql(&self, statement: impl Into<String>) -> PendingQuery<'_> {
        PendingQuery {
            client: &self.client,
            host: &self.host,
            query: SnowflakeQuery {
                statement: statement.into(),
                timeout: None,
                context: self.context.clone(),
                bindings: HashMap::new(),
            },
            uuid: uuid::Uuid::new_v4(),
        }
    }

    fn get_headers(token: &str, token_type: &'static str) -> SnowflakeResult<HeaderMap> {
        let auth_header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| SnowflakeError::Settings(format!("token is not a valid header value: {e}")))?;
        let user_agent = concat!(env!("CARGO_PKG_NAME"), '/', env!("CARGO_PKG_VERSION"));
        let headers = [
            (CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (AUTHORIZATION, auth_header),
            (ACCEPT, HeaderValue::from_static("application/json")),
            (USER_AGENT, HeaderValue::from_static(user_agent)),
            (
                HeaderName::from_static("x-snowflake-authorization-token-type"),
                HeaderValue::from_static(token_type),
            ),
        ];
        Ok(headers.into_iter().collect())
    }
}

fn validate_account(account: &str) -> SnowflakeResult<()> {
    if account.trim().is_empty() {
        return Err(SnowflakeError::Settings("account must not be empty".into()));
    }
    // ends up in the host name
    if !account
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(SnowflakeError::Settings(format!(
            "account `{account}` contains characters not allowed in a host name"
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub struct PendingQuery<'c> {
    client: &'c reqwest::Client,
    host: &'c str,
    query: SnowflakeQuery,
    uuid: uuid::Uuid,
}

impl<'c> PendingQuery<'c> {
    /// Use with `SELECT` queries. Every partition of the result is fetched.
    pub async fn select(self) -> SnowflakeResult<SnowflakeSQLResponse> {
        let mut response: SnowflakeSQLResponse = self.submit().await?;
        for partition in response.remaining_partitions() {
            let url = partition_url(self.host, &response.statement_handle, partition);
            tracing::debug!(statement = %response.statement_handle, partition, "fetching result partition");
            let r = self
                .client
                .get(url)
                .send()
                .await
                .map_err(SnowflakeError::Request)?;
            response.append_partition(read_response(r).await?);
        }
        Ok(response)
    }

    /// Use with `delete`, `insert`, `update` row(s).
    pub async fn manipulate(self) -> SnowflakeResult<DataManipulationResult> {
        let response: SnowflakeSQLResponse = self.submit().await?;
        Ok(DataManipulationResult {
            message: response.message,
            stats: response.stats.unwrap_or_default(),
        })
    }

    pub fn with_timeout(mut self, timeout: u32) -> Self {
        self.query.timeout = Some(timeout);
        self
    }

    pub fn add_binding<T: Into<BindingValue>>(mut self, value: T) -> Self {
        let value: BindingValue = value.into();
        let binding = Binding {
            kind: value.kind(),
            value: BindingPayload::Single(value.to_wire()),
        };
        self.push_binding(binding);
        self
    }

    /// Binds one value per row, so the statement runs once for every row.
    pub fn add_array_binding(mut self, kind: BindingKind, values: Vec<Option<String>>) -> Self {
        self.push_binding(Binding {
            kind,
            value: BindingPayload::Array(values),
        });
        self
    }

    fn push_binding(&mut self, binding: Binding) {
        self.query
            .bindings
            .insert((self.query.bindings.len() + 1).to_string(), binding);
    }

    async fn submit<T: DeserializeOwned>(&self) -> SnowflakeResult<T> {
        let r = self
            .client
            .post(self.get_url())
            .json(&self.query)
            .send()
            .await
            .map_err(SnowflakeError::Request)?;
        read_response(r).await
    }

    fn get_url(&self) -> String {
        format!("{}statements?requestId={}", self.host, self.uuid)
    }
}

fn partition_url(host: &str, handle: &StatementHandle, partition: usize) -> String {
    format!("{host}statements/{handle}?partition={partition}")
}

async fn read_response<T: DeserializeOwned>(r: reqwest::Response) -> SnowflakeResult<T> {
    match r.status() {
        reqwest::StatusCode::OK => r.json::<T>().await.map_err(SnowflakeError::Decode),
        reqwest::StatusCode::ACCEPTED | reqwest::StatusCode::REQUEST_TIMEOUT => {
            let status = r.json::<QueryStatus>().await.map_err(SnowflakeError::Decode)?;
            Err(SnowflakeError::InProgress(status.statement_handle))
        }
        reqwest::StatusCode::UNPROCESSABLE_ENTITY => Err(SnowflakeError::Query(
            r.json().await.map_err(SnowflakeError::Decode)?,
        )),
        status => {
            let body = r.text().await.unwrap_or_default();
            Err(SnowflakeError::Unexpected { status, body })
        }
    }
}

#[derive(Serialize, Debug)]
struct SnowflakeQuery {
    statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u32>,
    #[serde(flatten)]
    context: StatementContext,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    bindings: HashMap<String, Binding>,
}

/// [ResultSet](https://docs.snowflake.com/en/developer-guide/sql-api/reference#label-sql-api-reference-resultset)
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SnowflakeSQLResponse {
    #[serde(default)]
    pub result_set_meta_data: Option<MetaData>,
    #[serde(default)]
    pub data: Vec<Vec<Option<String>>>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub statement_status_url: String,
    #[serde(default)]
    pub sql_state: String,
    #[serde(default)]
    pub message: String,
    pub statement_handle: StatementHandle,
    #[serde(default)]
    pub stats: Option<Changes>,
}

impl SnowflakeSQLResponse {
    /// Partitions after the first, which arrives with the statement response.
    fn remaining_partitions(&self) -> std::ops::Range<usize> {
        let partitions = self
            .result_set_meta_data
            .as_ref()
            .map_or(0, |meta| meta.partition_info.len());
        1..partitions.max(1)
    }

    fn append_partition(&mut self, partition: PartitionData) {
        self.data.extend(partition.data);
    }

    /// Column names plus every cell decoded by its column type.
    pub fn into_table(self) -> Table {
        let row_types = self
            .result_set_meta_data
            .map(|meta| meta.row_type)
            .unwrap_or_default();
        let rows = self
            .data
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&row_types)
                    .map(|(cell, row_type)| cells::decode_cell(row_type, cell.as_deref()))
                    .collect()
            })
            .collect();
        Table {
            columns: row_types.into_iter().map(|row_type| row_type.name).collect(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize, Debug)]
struct PartitionData {
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    pub row_count: usize,
    #[serde(default)]
    pub uncompressed_size: usize,
}

/// [ResultSetMetaData](https://docs.snowflake.com/en/developer-guide/sql-api/reference#label-sql-api-reference-resultset-resultsetmetadata)
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub num_rows: usize,
    pub format: String,
    pub row_type: Vec<RowType>,
    #[serde(default)]
    pub partition_info: Vec<PartitionInfo>,
}

/// [RowType](https://docs.snowflake.com/en/developer-guide/sql-api/reference#label-sql-api-reference-resultset-resultsetmetadata-rowtype)
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RowType {
    pub name: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    pub precision: Option<u32>,
    pub byte_length: Option<usize>,
    #[serde(rename = "type")]
    pub data_type: String,
    pub scale: Option<i32>,
    pub nullable: bool,
}

/// A unique tag that identifies a SQL statement request
#[derive(serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct StatementHandle(String);
impl std::fmt::Display for StatementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// [QueryStatus](https://docs.snowflake.com/en/developer-guide/sql-api/reference#label-sql-api-reference-querystatus)
#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QueryStatus {
    statement_handle: StatementHandle,
}

/// [QueryFailureStatus](https://docs.snowflake.com/en/developer-guide/sql-api/reference#label-sql-api-reference-queryfailurestatus)
#[derive(serde::Deserialize, thiserror::Error, Debug)]
#[serde(rename_all = "camelCase")]
#[error("SQL error {code} ({sql_state}) in statement {statement_handle}: {message}")]
pub struct QueryFailureStatus {
    code: String,
    #[serde(default)]
    sql_state: String,
    message: String,
    statement_handle: StatementHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(auth: Auth) -> ConnectionConfig {
        ConnectionConfig {
            account: "xy12345.us-east-1".into(),
            user: "loader".into(),
            auth,
            warehouse: "COMPUTE_WH".into(),
            database: "FINANCIAL_DW".into(),
            schema: "PUBLIC".into(),
            role: None,
        }
    }

    #[test]
    fn sql() -> Result<(), anyhow::Error> {
        let connector = SnowflakeConnector::try_new(&config(Auth::OAuth("token".into())))?;
        assert_eq!(connector.host, "https://xy12345.us-east-1.snowflakecomputing.com/api/v2/");
        let sql = connector
            .sql("SELECT * FROM TEST_TABLE WHERE id = ? AND name = ?")
            .add_binding(69);
        assert_eq!(sql.query.bindings.len(), 1);
        let sql = sql.add_binding("JoMama").with_timeout(30);
        assert_eq!(sql.query.bindings.len(), 2);

        let body = serde_json::to_value(&sql.query)?;
        assert_eq!(body["database"], "FINANCIAL_DW");
        assert_eq!(body["warehouse"], "COMPUTE_WH");
        assert_eq!(body["timeout"], 30);
        assert_eq!(body["bindings"]["2"]["value"], "JoMama");
        assert!(body.get("role").is_none());
        Ok(())
    }

    #[test]
    fn key_pair_auth() -> Result<(), anyhow::Error> {
        let key = jwt::RS256KeyPair::generate(2048)?;
        let connector = SnowflakeConnector::try_new(&config(Auth::KeyPair(key.to_pem()?)))?;
        assert_eq!(connector.database(), "FINANCIAL_DW");
        assert_eq!(connector.schema(), "PUBLIC");
        Ok(())
    }

    #[test]
    fn rejects_bad_settings() {
        let mut empty = config(Auth::OAuth("token".into()));
        empty.account = String::new();
        assert!(matches!(
            SnowflakeConnector::try_new(&empty),
            Err(SnowflakeError::Settings(_))
        ));

        let mut host_injection = config(Auth::OAuth("token".into()));
        host_injection.account = "evil.com/x?".into();
        assert!(matches!(
            SnowflakeConnector::try_new(&host_injection),
            Err(SnowflakeError::Settings(_))
        ));

        assert!(matches!(
            SnowflakeConnector::try_new(&config(Auth::OAuth("  ".into()))),
            Err(SnowflakeError::Settings(_))
        ));
        assert!(matches!(
            SnowflakeConnector::try_new(&config(Auth::KeyPair("nope".into()))),
            Err(SnowflakeError::Token(_))
        ));
    }

    #[test]
    fn decodes_result_set() -> Result<(), anyhow::Error> {
        let response: SnowflakeSQLResponse = serde_json::from_value(serde_json::json!({
            "resultSetMetaData": {
                "numRows": 2,
                "format": "jsonv2",
                "rowType": [
                    { "name": "CATEGORY", "type": "text", "nullable": true },
                    { "name": "TOTAL", "type": "fixed", "scale": 2, "precision": 38, "nullable": true }
                ],
                "partitionInfo": [{ "rowCount": 2, "uncompressedSize": 64 }]
            },
            "data": [["Travel", "1200.50"], ["Bills", null]],
            "code": "090001",
            "statementStatusUrl": "/api/v2/statements/01b",
            "sqlState": "00000",
            "statementHandle": "01b",
            "message": "Statement executed successfully."
        }))?;
        assert!(response.remaining_partitions().is_empty());
        let table = response.into_table();
        assert_eq!(table.columns, vec!["CATEGORY", "TOTAL"]);
        assert_eq!(
            table.rows,
            vec![
                vec![serde_json::json!("Travel"), serde_json::json!(1200.5)],
                vec![serde_json::json!("Bills"), serde_json::Value::Null],
            ]
        );
        Ok(())
    }

    fn partitioned_response(partitions: usize) -> Result<SnowflakeSQLResponse, serde_json::Error> {
        let partition_info: Vec<_> = (0..partitions)
            .map(|_| serde_json::json!({ "rowCount": 1, "uncompressedSize": 16 }))
            .collect();
        serde_json::from_value(serde_json::json!({
            "resultSetMetaData": {
                "numRows": partitions,
                "format": "jsonv2",
                "rowType": [{ "name": "N", "type": "fixed", "scale": 0, "nullable": false }],
                "partitionInfo": partition_info
            },
            "data": [["0"]],
            "statementHandle": "01d"
        }))
    }

    #[test]
    fn remaining_partitions() -> Result<(), anyhow::Error> {
        assert!(partitioned_response(1)?.remaining_partitions().is_empty());
        assert_eq!(partitioned_response(3)?.remaining_partitions(), 1..3);

        let without_meta: SnowflakeSQLResponse =
            serde_json::from_value(serde_json::json!({ "statementHandle": "01e" }))?;
        assert!(without_meta.remaining_partitions().is_empty());
        Ok(())
    }

    #[test]
    fn merges_partitions_in_order() -> Result<(), anyhow::Error> {
        let mut response = partitioned_response(3)?;
        assert_eq!(
            partition_url(
                "https://xy12345.snowflakecomputing.com/api/v2/",
                &response.statement_handle,
                2
            ),
            "https://xy12345.snowflakecomputing.com/api/v2/statements/01d?partition=2"
        );
        for partition in response.remaining_partitions() {
            let data: PartitionData = serde_json::from_value(serde_json::json!({
                "data": [[partition.to_string()]]
            }))?;
            response.append_partition(data);
        }
        let table = response.into_table();
        assert_eq!(
            table.rows,
            vec![
                vec![serde_json::json!(0)],
                vec![serde_json::json!(1)],
                vec![serde_json::json!(2)],
            ]
        );
        Ok(())
    }

    #[test]
    fn query_failure_message() -> Result<(), anyhow::Error> {
        let failure: QueryFailureStatus = serde_json::from_value(serde_json::json!({
            "code": "002003",
            "sqlState": "42S02",
            "message": "Object 'NOPE' does not exist or not authorized.",
            "statementHandle": "01c"
        }))?;
        assert_eq!(
            SnowflakeError::Query(failure).to_string(),
            "SQL error 002003 (42S02) in statement 01c: Object 'NOPE' does not exist or not authorized."
        );
        Ok(())
    }
}
