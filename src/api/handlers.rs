use axum::Json;
use axum::extract::State;
use serde_json::Value;
use warehouse_connector::insert::is_valid_identifier;

use super::models::{
    ConnectResponse, DashboardResponse, DashboardSummary, ExamplesResponse, GenerateRequest,
    GenerateResponse, LoadResults, QueryRequest, RootResponse, SetupResponse,
};
use super::{ApiError, ApiJson, AppState};
use crate::catalog::{self, dashboard};
use crate::error::GatewayError;
use crate::gateway::{ConnectionStatus, Credentials, LoadMode, QueryOutput, Warehouse};
use crate::generator::{DatasetGenerator, DatasetSize};

pub(super) async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Financial Data Warehouse API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(super) async fn connect<W: Warehouse>(
    State(state): State<AppState<W>>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<ConnectResponse>, ApiError> {
    state.gateway.connect(&credentials).await?;
    Ok(Json(ConnectResponse {
        message: "Successfully connected to Snowflake",
        status: "connected",
    }))
}

pub(super) async fn status<W: Warehouse>(State(state): State<AppState<W>>) -> Json<ConnectionStatus> {
    Json(state.gateway.status().await)
}

pub(super) async fn setup<W: Warehouse>(
    State(state): State<AppState<W>>,
) -> Result<Json<SetupResponse>, ApiError> {
    let ConnectionStatus::Connected { database, schema } = state.gateway.status().await else {
        return Err(GatewayError::NotConnected.into());
    };
    for name in [&database, &schema] {
        if !is_valid_identifier(name) {
            return Err(ApiError::BadRequest(format!(
                "`{name}` is not a plain SQL identifier"
            )));
        }
    }
    for statement in catalog::setup_statements(&database, &schema) {
        state
            .gateway
            .execute(&statement, false)
            .await
            .map_err(ApiError::during("Schema creation"))?;
    }
    tracing::info!(%database, %schema, "created warehouse schema");
    Ok(Json(SetupResponse {
        message: "Database schema created successfully",
        tables_created: catalog::TABLE_COUNT,
        views_created: catalog::VIEW_COUNT,
    }))
}

pub(super) async fn generate<W: Warehouse>(
    State(state): State<AppState<W>>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if !state.gateway.is_connected().await {
        return Err(GatewayError::NotConnected.into());
    }
    let size = DatasetSize::new(request.customers, request.merchants, request.transactions)?;
    let seed = request.seed;
    let dataset = tokio::task::spawn_blocking(move || match seed {
        Some(seed) => DatasetGenerator::from_seed(seed).generate(size),
        None => DatasetGenerator::from_entropy().generate(size),
    })
    .await
    .map_err(ApiError::during("Data generation"))?;

    let gateway = &state.gateway;
    let during = ApiError::during("Data generation");
    let load_results = LoadResults {
        customers: gateway
            .bulk_load(&dataset.customers, catalog::CUSTOMERS, LoadMode::Replace)
            .await
            .map_err(during)?,
        merchants: gateway
            .bulk_load(&dataset.merchants, catalog::MERCHANTS, LoadMode::Replace)
            .await
            .map_err(during)?,
        accounts: gateway
            .bulk_load(&dataset.accounts, catalog::ACCOUNTS, LoadMode::Replace)
            .await
            .map_err(during)?,
        transactions: gateway
            .bulk_load(&dataset.transactions, catalog::TRANSACTIONS, LoadMode::Replace)
            .await
            .map_err(during)?,
    };
    let data_counts = dataset.counts();
    tracing::info!(?data_counts, "generated and loaded sample data");
    Ok(Json(GenerateResponse {
        message: "Sample data generated and loaded successfully",
        data_counts,
        load_results,
    }))
}

pub(super) async fn execute_query<W: Warehouse>(
    State(state): State<AppState<W>>,
    ApiJson(request): ApiJson<QueryRequest>,
) -> Result<Json<QueryOutput>, ApiError> {
    let statement = request.statement();
    Ok(Json(state.gateway.execute(&statement, true).await?))
}

/// Reads a numeric cell, treating NULL and missing rows as 0.
fn number(cell: Option<&Value>) -> f64 {
    match cell {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        _ => 0.0,
    }
}

pub(super) async fn analytics_dashboard<W: Warehouse>(
    State(state): State<AppState<W>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    if !state.gateway.is_connected().await {
        return Err(GatewayError::NotConnected.into());
    }
    let gateway = &state.gateway;
    let during = ApiError::during("Dashboard data fetch");

    let total_transactions = gateway
        .execute(dashboard::TOTAL_TRANSACTIONS, true)
        .await
        .map_err(during)?;
    let total_amount = gateway.execute(dashboard::TOTAL_AMOUNT, true).await.map_err(during)?;
    let avg_transaction = gateway.execute(dashboard::AVERAGE_AMOUNT, true).await.map_err(during)?;
    let daily_trends = gateway.execute(dashboard::DAILY_TRENDS, true).await.map_err(during)?;
    let category_breakdown = gateway
        .execute(dashboard::CATEGORY_BREAKDOWN, true)
        .await
        .map_err(during)?;
    let top_customers = gateway.execute(dashboard::TOP_CUSTOMERS, true).await.map_err(during)?;

    Ok(Json(DashboardResponse {
        summary: DashboardSummary {
            total_transactions: total_transactions
                .first_cell()
                .filter(|cell| !cell.is_null())
                .cloned()
                .unwrap_or_else(|| Value::from(0)),
            total_amount: number(total_amount.first_cell()),
            avg_transaction: number(avg_transaction.first_cell()),
        },
        daily_trends,
        category_breakdown,
        top_customers,
    }))
}

pub(super) async fn example_queries() -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        examples: catalog::EXAMPLE_QUERIES,
    })
}
