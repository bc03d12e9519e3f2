//! Convenience re-exports for common data-access usage

// Calls and output
pub use crate::call::{ExpectedReturn, ProcedureCall};
pub use crate::record_set::{ProcedureOutput, RawResult, RecordSet, Row};

// Execution
pub use crate::executor::{PgExecutor, RoutineExecutor};
pub use crate::invoker::Procedures;
pub use crate::pool::{PoolConnector, PoolManager};
pub use crate::transaction::UnitOfWork;

// Error types
pub use crate::errors::DataAccessError;

// Parameter values
pub use type_mapping::{Parameters, PostgresValue};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use futures::future::BoxFuture;
