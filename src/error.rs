//! Error taxonomy shared by the generator, the gateway and the HTTP layer.
//!
//! Every variant surfaces to HTTP callers as a "bad request" carrying the
//! message below; nothing here is retried or treated as fatal.

/// Rejected input, raised before any work is done
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{entity} count must be at least 1")]
    ZeroCount { entity: &'static str },
    #[error("{entity} count {count} exceeds the maximum of {max}")]
    TooMany {
        entity: &'static str,
        count: usize,
        max: usize,
    },
    #[error("risk score {0} is outside 0..=100")]
    RiskScore(u8),
}

/// Which part of the warehouse interaction failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Query,
    Load,
}

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("No active Snowflake connection")]
    NotConnected,
    #[error("Snowflake connection failed: {0}")]
    Connection(String),
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Data load failed: {0}")]
    Load(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::NotConnected | GatewayError::Connection(_) => ErrorKind::Connection,
            GatewayError::Query(_) => ErrorKind::Query,
            GatewayError::Load(_) => ErrorKind::Load,
        }
    }

    /// Keeps the whole driver cause chain in the message.
    pub(crate) fn connection(error: anyhow::Error) -> Self {
        GatewayError::Connection(format!("{error:#}"))
    }

    pub(crate) fn query(error: anyhow::Error) -> Self {
        GatewayError::Query(format!("{error:#}"))
    }

    pub(crate) fn load(error: anyhow::Error) -> Self {
        GatewayError::Load(format!("{error:#}"))
    }
}
