use std::net::SocketAddr;
use std::num::NonZeroUsize;

const BIND_ADDR: &str = "FDW_BIND_ADDR";
const LOAD_CHUNK_SIZE: &str = "FDW_LOAD_CHUNK_SIZE";
const STATEMENT_TIMEOUT: &str = "FDW_STATEMENT_TIMEOUT_SECS";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Process settings, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Rows per `INSERT` statement during bulk loads
    pub load_chunk_size: NonZeroUsize,
    /// Server side statement timeout in seconds; the warehouse default when unset
    pub statement_timeout: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8001)),
            load_chunk_size: NonZeroUsize::new(10_000).unwrap_or(NonZeroUsize::MIN),
            statement_timeout: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        Ok(AppConfig {
            bind_addr: parse(&lookup, BIND_ADDR)?.unwrap_or(defaults.bind_addr),
            load_chunk_size: parse(&lookup, LOAD_CHUNK_SIZE)?.unwrap_or(defaults.load_chunk_size),
            statement_timeout: parse(&lookup, STATEMENT_TIMEOUT)?.or(defaults.statement_timeout),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        })
}
