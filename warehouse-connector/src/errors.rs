use crate::jwt::KeyPairError;
use crate::{QueryFailureStatus, StatementHandle};

pub type SnowflakeResult<T> = Result<T, SnowflakeError>;

#[derive(thiserror::Error, Debug)]
pub enum SnowflakeError {
    #[error("could not generate JWT token: {0}")]
    Token(#[from] KeyPairError),
    #[error("could not start client: {0}")]
    Client(reqwest::Error),
    #[error("invalid connection settings: {0}")]
    Settings(String),
    #[error("`{0}` is not a plain SQL identifier")]
    InvalidIdentifier(String),
    #[error("could not execute sql statement: {0}")]
    Request(reqwest::Error),
    #[error("failed to parse returned json: {0}")]
    Decode(reqwest::Error),
    #[error(transparent)]
    Query(QueryFailureStatus),
    #[error("statement {0} is still running")]
    InProgress(StatementHandle),
    #[error("unexpected response with status code {status}: {body}")]
    Unexpected {
        status: reqwest::StatusCode,
        body: String,
    },
}
