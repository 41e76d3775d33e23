use serde::{Deserialize, Serialize};

use crate::catalog::ExampleQuery;
use crate::gateway::{LoadSummary, QueryOutput};
use crate::generator::DataCounts;

fn default_customers() -> usize {
    100
}

fn default_merchants() -> usize {
    50
}

fn default_transactions() -> usize {
    1000
}

fn default_limit() -> Option<u32> {
    Some(1000)
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    #[serde(default = "default_customers")]
    pub customers: usize,
    #[serde(default = "default_merchants")]
    pub merchants: usize,
    #[serde(default = "default_transactions")]
    pub transactions: usize,
    /// Fixed seed for a reproducible dataset
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub sql_query: String,
    /// Appended as `LIMIT n` unless the query already has one; `null` or 0 disables it
    #[serde(default = "default_limit")]
    pub limit: Option<u32>,
}

impl QueryRequest {
    pub fn statement(&self) -> String {
        let sql = self.sql_query.trim();
        match self.limit {
            Some(limit) if limit > 0 && !sql.to_uppercase().contains("LIMIT") => {
                format!("{sql} LIMIT {limit}")
            }
            _ => sql.to_owned(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Serialize, Debug)]
pub struct ConnectResponse {
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Serialize, Debug)]
pub struct SetupResponse {
    pub message: &'static str,
    pub tables_created: usize,
    pub views_created: usize,
}

#[derive(Serialize, Debug)]
pub struct LoadResults {
    pub customers: LoadSummary,
    pub merchants: LoadSummary,
    pub accounts: LoadSummary,
    pub transactions: LoadSummary,
}

#[derive(Serialize, Debug)]
pub struct GenerateResponse {
    pub message: &'static str,
    pub data_counts: DataCounts,
    pub load_results: LoadResults,
}

#[derive(Serialize, Debug)]
pub struct DashboardSummary {
    pub total_transactions: serde_json::Value,
    pub total_amount: f64,
    pub avg_transaction: f64,
}

#[derive(Serialize, Debug)]
pub struct DashboardResponse {
    pub summary: DashboardSummary,
    pub daily_trends: QueryOutput,
    pub category_breakdown: QueryOutput,
    pub top_customers: QueryOutput,
}

#[derive(Serialize, Debug)]
pub struct ExamplesResponse {
    pub examples: &'static [ExampleQuery],
}
