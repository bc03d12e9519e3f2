//! Transaction support for Procedures
//!
//! This module provides scoped units of work, allowing multiple routine
//! invocations to be executed atomically on one dedicated connection.

use futures::future::BoxFuture;

use crate::call::ProcedureCall;
use crate::errors::DataAccessError;
use crate::executor::RoutineExecutor;
use crate::invoker::Procedures;
use crate::record_set::ProcedureOutput;

/// An open transaction bound to one connection
///
/// `commit` and `rollback` consume the guard, so at most one terminal action can
/// run. A guard dropped without either logs a warning and the backend rolls the
/// transaction back.
///
/// # Example
/// ```ignore
/// let mut uow = procedures.begin().await?;
///
/// uow.execute(ProcedureCall::new("news.update_news", ExpectedReturn::None).param("id", 1)).await?;
/// uow.execute(ProcedureCall::new("news.replace_categories", ExpectedReturn::None).param("id", 1)).await?;
///
/// uow.commit().await?;
/// ```
pub struct UnitOfWork<'p, E: RoutineExecutor> {
    procedures: &'p Procedures<E>,
    tx: Option<E::Transaction>,
}

impl<E: RoutineExecutor> Procedures<E> {
    /// Begin a new transaction
    pub async fn begin(&self) -> Result<UnitOfWork<'_, E>, DataAccessError> {
        let tx = self.executor().begin().await?;
        Ok(UnitOfWork {
            procedures: self,
            tx: Some(tx),
        })
    }

    /// Run `work` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// A failed rollback is logged; the error from `work` is what the caller sees.
    ///
    /// ```ignore
    /// let id = procedures
    ///     .transaction(|uow| {
    ///         Box::pin(async move {
    ///             let created = uow.execute(insert_call).await?;
    ///             uow.execute(link_call).await?;
    ///             Ok::<_, DataAccessError>(created)
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn transaction<'p, T, Er, F>(&'p self, work: F) -> Result<T, Er>
    where
        F: for<'t> FnOnce(&'t mut UnitOfWork<'p, E>) -> BoxFuture<'t, Result<T, Er>> + Send,
        T: Send,
        Er: From<DataAccessError> + Send,
    {
        let mut uow = self.begin().await?;

        match work(&mut uow).await {
            Ok(value) => {
                uow.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = uow.rollback().await {
                    tracing::error!(error = %rollback_error, "Failed to rollback transaction");
                }
                Err(error)
            }
        }
    }
}

impl<'p, E: RoutineExecutor> UnitOfWork<'p, E> {
    /// Run a call on this transaction's connection
    pub async fn execute(&mut self, call: ProcedureCall) -> Result<ProcedureOutput, DataAccessError> {
        self.procedures.execute_in(call, self.tx.as_mut()).await
    }

    /// Commit the transaction
    pub async fn commit(mut self) -> Result<(), DataAccessError> {
        match self.tx.take() {
            Some(tx) => self.procedures.executor().commit(tx).await,
            None => Ok(()),
        }
    }

    /// Rollback the transaction
    pub async fn rollback(mut self) -> Result<(), DataAccessError> {
        match self.tx.take() {
            Some(tx) => self.procedures.executor().rollback(tx).await,
            None => Ok(()),
        }
    }
}

impl<E: RoutineExecutor> Drop for UnitOfWork<'_, E> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::warn!("Unit of work dropped without commit or rollback; rolling back");
        }
    }
}
