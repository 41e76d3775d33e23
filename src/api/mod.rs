//! HTTP surface of the service.
//!
//! Every failure is answered with `{"detail": "<message>"}`. Gateway and
//! validation failures use status 400; malformed request bodies keep the status
//! chosen by the JSON extractor.

mod handlers;
pub mod models;

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{GatewayError, ValidationError};
use crate::gateway::{Warehouse, WarehouseGateway};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{stage} failed: {message}")]
    Stage { stage: &'static str, message: String },
    #[error(transparent)]
    Json(#[from] JsonRejection),
}

impl ApiError {
    /// Wraps any error as a failure of the named request stage.
    pub(crate) fn during<E: Display>(stage: &'static str) -> impl Fn(E) -> ApiError + Copy {
        move |error| ApiError::Stage {
            stage,
            message: error.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Json(rejection) => rejection.status(),
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Json(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        tracing::warn!(%status, %detail, "request failed");
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// `Json` extractor whose rejections are reported as [ApiError]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub struct AppState<W: Warehouse> {
    pub gateway: Arc<WarehouseGateway<W>>,
}

impl<W: Warehouse> Clone for AppState<W> {
    fn clone(&self) -> Self {
        AppState {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

pub fn router<W: Warehouse>(gateway: Arc<WarehouseGateway<W>>) -> Router {
    Router::new()
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .route("/api/snowflake/connect", post(handlers::connect::<W>))
        .route("/api/snowflake/status", get(handlers::status::<W>))
        .route("/api/snowflake/setup", post(handlers::setup::<W>))
        .route("/api/data/generate", post(handlers::generate::<W>))
        .route("/api/query/execute", post(handlers::execute_query::<W>))
        .route("/api/analytics/dashboard", get(handlers::analytics_dashboard::<W>))
        .route("/api/examples/queries", get(handlers::example_queries))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { gateway })
}
