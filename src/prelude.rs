//! Convenience re-exports for common portal usage
//!
//! # Example
//!
//! ```rust
//! use portal::prelude::*;
//! ```

// Core portal components
pub use crate::core::Portal;
pub use crate::errors::PortalError;
pub use crate::routines;
pub use crate::state::AppState;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, Environment, ServerConfig};

// Routine execution
pub use data_access::prelude::*;

// Validation, envelopes and HTTP errors
pub use crud_controller::prelude::*;

// Common external dependencies
pub use anyhow;
pub use tokio;
