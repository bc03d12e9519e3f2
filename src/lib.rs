//! # Portal
//!
//! Backend core for a news and media portal. HTTP handlers validate their
//! input with a `CrudController`, run exactly one stored routine (or a short
//! sequence inside a transaction) through `Procedures`, and answer with a
//! uniform JSON envelope.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portal::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!
//!     // The pool is created on the first database call, not here
//!     let portal = Portal::new(config);
//!
//!     let listing = portal
//!         .procedures()
//!         .execute(
//!             ProcedureCall::new(routines::news::LIST_PUBLISHED, ExpectedReturn::Multi)
//!                 .param("pagina_atual", 1)
//!                 .param("itens_por_pagina", 12)
//!                 .result_sets(["items", "total"]),
//!         )
//!         .await?
//!         .into_named()?;
//!     println!("{} news on the first page", listing["items"].len());
//!
//!     portal.serve().await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;
pub mod routes;
pub mod routines;
pub mod server;
pub mod state;

// Re-export the main public types for convenience
pub use core::Portal;
pub use errors::PortalError;
pub use state::AppState;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, Environment, ServerConfig};

// Re-export internal crates
pub use crud_controller;
pub use data_access;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use axum;
pub use sqlx;
