//! Core portal functionality
//!
//! This module contains the `Portal` coordinator: it owns the shared pool
//! manager, the routine invoker and the server settings, and wires them into
//! the HTTP application.

use axum::Router;
use std::sync::Arc;

use crate::errors::PortalError;
use crate::server;
use crate::state::{AppState, SharedAuthorizer};
use config::{AppConfig, DatabaseConfig, ServerConfig};
use data_access::{PgExecutor, PoolManager, Procedures, RoutineExecutor};

/// Main portal coordinator
pub struct Portal<E: RoutineExecutor = PgExecutor> {
    state: AppState<E>,
    server: ServerConfig,
}

impl Portal<PgExecutor> {
    /// Create the portal from configuration
    ///
    /// No connection is opened here; the pool is created by the first routine call.
    pub fn new(config: AppConfig) -> Self {
        let pools = Arc::new(PoolManager::new(config.database));
        let procedures = Procedures::new(PgExecutor::new(pools));
        Self::with_procedures(procedures, config.server)
    }

    /// Shared pool manager
    pub fn pools(&self) -> &PoolManager<DatabaseConfig> {
        self.state.procedures.executor().pools()
    }
}

impl<E: RoutineExecutor + 'static> Portal<E> {
    /// Portal over any executor, with the placeholder authorizer
    pub fn with_procedures(procedures: Procedures<E>, server: ServerConfig) -> Self {
        Self {
            state: AppState::unenforced(procedures),
            server,
        }
    }

    /// Replace the authorizer used by every controller
    pub fn with_authorizer(self, authorizer: SharedAuthorizer) -> Self {
        Self {
            state: AppState::from_shared(self.state.procedures, authorizer),
            server: self.server,
        }
    }

    pub fn procedures(&self) -> &Procedures<E> {
        &self.state.procedures
    }

    pub fn state(&self) -> &AppState<E> {
        &self.state
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), PortalError> {
        self.state.procedures.ping().await?;
        Ok(())
    }

    /// HTTP application with every route and layer
    pub fn router(&self) -> Router {
        server::app(self.state.clone(), &self.server)
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn serve(self) -> Result<(), PortalError> {
        server::run(self.state, &self.server).await
    }
}
