//! Generates synthetic retail-banking data and serves it, along with ad-hoc
//! queries and dashboard aggregates, from a Snowflake warehouse over HTTP.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod generator;

pub use config::AppConfig;
pub use error::{ErrorKind, GatewayError, ValidationError};
pub use gateway::{Credentials, SnowflakeWarehouse, WarehouseGateway};
pub use generator::{Dataset, DatasetGenerator, DatasetSize};
