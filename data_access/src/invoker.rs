//! Procedure invoker
//!
//! Binds, executes and shapes routine calls. Failures are logged with the
//! routine name and its parameters and returned unchanged; there is no retry
//! and no interpretation of routine-specific errors here.

use crate::call::ProcedureCall;
use crate::errors::DataAccessError;
use crate::executor::RoutineExecutor;
use crate::record_set::{shape, ProcedureOutput};

/// Entry point for running stored routines
#[derive(Debug, Clone)]
pub struct Procedures<E: RoutineExecutor> {
    executor: E,
}

impl<E: RoutineExecutor> Procedures<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run a call on a pooled connection
    pub async fn execute(&self, call: ProcedureCall) -> Result<ProcedureOutput, DataAccessError> {
        self.execute_in(call, None).await
    }

    /// Backend health check
    pub async fn ping(&self) -> Result<(), DataAccessError> {
        self.executor.ping().await
    }

    pub(crate) async fn execute_in(
        &self,
        call: ProcedureCall,
        tx: Option<&mut E::Transaction>,
    ) -> Result<ProcedureOutput, DataAccessError> {
        let in_transaction = tx.is_some();
        let result = async {
            let prepared = call.prepare()?;
            let raw = self.executor.run(&prepared, tx).await?;
            Ok::<_, DataAccessError>(shape(
                raw,
                prepared.expected(),
                prepared.result_set_names(),
            ))
        }
        .await;

        if let Err(error) = &result {
            tracing::error!(
                routine = %call.routine(),
                parameters = ?call.parameters(),
                expected = %call.expected(),
                in_transaction,
                error = %error,
                "Database request error"
            );
        }

        result
    }
}
