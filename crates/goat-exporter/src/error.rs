use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by goat-exporter operations.
///
/// `Config`, `Connection` and `Server` are startup failures and end the
/// process. `Timeout` and `Rpc` happen during a scrape and only cost the
/// samples of the sub-operation that hit them.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("rpc deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("metrics encoding error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("http server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("shutdown error: {0}")]
    Shutdown(String),
}
