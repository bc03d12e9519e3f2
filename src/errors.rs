//! Error types for the portal crate
//!
//! This module contains the errors returned while assembling and running the
//! server. Request-level failures are `crud_controller::ApiError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    DataAccess(#[from] data_access::DataAccessError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
