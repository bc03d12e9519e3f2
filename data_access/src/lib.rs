//! Data Access - stored routine execution layer for the portal
//!
//! This crate owns the shared connection pool, binds named parameters to
//! server-side routines, scopes transactions, and reshapes routine output
//! into the `None` / `Single` / `Multi` contract.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod call;
pub mod errors;
pub mod executor;
pub mod invoker;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod pool;
pub mod prelude;
pub mod record_set;
pub mod row;
pub mod transaction;
pub mod validation;

pub use call::{ExpectedReturn, PreparedCall, ProcedureCall};
pub use errors::DataAccessError;
pub use executor::{PgExecutor, RoutineExecutor};
pub use invoker::Procedures;
pub use pool::{PoolConnector, PoolManager};
pub use record_set::{shape, ProcedureOutput, RawResult, RecordSet, Row};
pub use transaction::UnitOfWork;
pub use validation::{ValidatedParamName, ValidatedRoutineName, ValidationError};

pub use type_mapping::{Parameters, PostgresValue};
