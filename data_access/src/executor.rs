//! Routine execution backends
//!
//! [`RoutineExecutor`] is the seam between shaping/transaction logic and the
//! actual database. [`PgExecutor`] runs routines on PostgreSQL through the
//! shared pool.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgConnection, Postgres, Transaction};
use std::sync::Arc;

use crate::call::{ExpectedReturn, PreparedCall};
use crate::errors::DataAccessError;
use crate::pool::PoolManager;
use crate::record_set::RawResult;
use crate::row::{cursor_names, decode_rows, is_cursor_result};
use crate::{debug_log, trace_log};
use config::DatabaseConfig;
use type_mapping::PostgresValue;

/// Backend capable of running prepared routine calls and scoping transactions
#[async_trait]
pub trait RoutineExecutor: Send + Sync {
    /// Dedicated connection state for one transaction
    type Transaction: Send;

    async fn begin(&self) -> Result<Self::Transaction, DataAccessError>;

    async fn commit(&self, tx: Self::Transaction) -> Result<(), DataAccessError>;

    async fn rollback(&self, tx: Self::Transaction) -> Result<(), DataAccessError>;

    /// Run a call on the transaction's connection, or on a pooled one when `tx` is `None`
    async fn run(
        &self,
        call: &PreparedCall,
        tx: Option<&mut Self::Transaction>,
    ) -> Result<RawResult, DataAccessError>;

    /// Cheap round trip used by health checks
    async fn ping(&self) -> Result<(), DataAccessError>;
}

/// PostgreSQL executor backed by the lazily created shared pool
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pools: Arc<PoolManager<DatabaseConfig>>,
}

impl PgExecutor {
    pub fn new(pools: Arc<PoolManager<DatabaseConfig>>) -> Self {
        Self { pools }
    }

    pub fn pools(&self) -> &PoolManager<DatabaseConfig> {
        &self.pools
    }
}

#[async_trait]
impl RoutineExecutor for PgExecutor {
    type Transaction = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Transaction, DataAccessError> {
        let pool = self.pools.get_pool().await?;
        Ok(pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Transaction) -> Result<(), DataAccessError> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: Self::Transaction) -> Result<(), DataAccessError> {
        Ok(tx.rollback().await?)
    }

    async fn run(
        &self,
        call: &PreparedCall,
        tx: Option<&mut Self::Transaction>,
    ) -> Result<RawResult, DataAccessError> {
        match tx {
            Some(tx) => run_on(&mut **tx, call).await,
            None if call.expected() == ExpectedReturn::Multi => {
                // Cursors only live inside a transaction
                let pool = self.pools.get_pool().await?;
                let mut own = pool.begin().await?;
                let raw = run_on(&mut own, call).await?;
                own.commit().await?;
                Ok(raw)
            }
            None => {
                let pool = self.pools.get_pool().await?;
                let mut conn = pool.acquire().await?;
                run_on(&mut conn, call).await
            }
        }
    }

    async fn ping(&self) -> Result<(), DataAccessError> {
        let pool = self.pools.get_pool().await?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &PostgresValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        PostgresValue::Text(v) => query.bind(v.clone()),
        PostgresValue::Integer(v) => query.bind(*v),
        PostgresValue::BigInt(v) => query.bind(*v),
        PostgresValue::SmallInt(v) => query.bind(*v),
        PostgresValue::Float(v) => query.bind(*v),
        PostgresValue::Boolean(v) => query.bind(*v),
        PostgresValue::Uuid(v) => query.bind(*v),
        PostgresValue::Timestamp(v) => query.bind(*v),
        PostgresValue::Decimal(v) => query.bind(v.clone()),
        PostgresValue::Json(v) => query.bind(sqlx::types::Json(v.clone())),
        PostgresValue::TextArray(v) => query.bind(v.clone()),
        // Inlined into the statement text
        PostgresValue::Null => query,
    }
}

fn quote_cursor(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Boxed so the future is checked for `Send` at one concrete lifetime
fn run_on<'a>(conn: &'a mut PgConnection, call: &'a PreparedCall) -> BoxFuture<'a, Result<RawResult, DataAccessError>> {
    Box::pin(async move {
        let sql = call.sql();
        debug_log!(routine = %call.routine(), sql = %sql, "Executing routine");
        trace_log!(bound = call.bound_values().count(), "Binding routine arguments");

        let mut query = sqlx::query(&sql);
        for value in call.bound_values() {
            query = bind_value(query, value);
        }

        match call.expected() {
            ExpectedReturn::None => {
                let result = sqlx::Executor::execute(&mut *conn, query).await?;
                Ok(RawResult {
                    recordsets: Vec::new(),
                    rows_affected: vec![result.rows_affected()],
                })
            }
            ExpectedReturn::Single => {
                let rows = sqlx::Executor::fetch_all(&mut *conn, query).await?;
                Ok(RawResult::from_sets(vec![decode_rows(&rows)?]))
            }
            ExpectedReturn::Multi => {
                let rows = sqlx::Executor::fetch_all(&mut *conn, query).await?;
                if !is_cursor_result(&rows) {
                    return Ok(RawResult::from_sets(vec![decode_rows(&rows)?]));
                }

                let mut recordsets = Vec::new();
                for cursor in cursor_names(&rows)? {
                    let fetch = format!("FETCH ALL FROM {}", quote_cursor(&cursor));
                    let fetched = sqlx::Executor::fetch_all(&mut *conn, sqlx::raw_sql(&fetch)).await?;
                    recordsets.push(decode_rows(&fetched)?);
                }
                debug_log!(routine = %call.routine(), sets = recordsets.len(), "Fetched cursor result sets");
                Ok(RawResult::from_sets(recordsets))
            }
        }
    })
}
