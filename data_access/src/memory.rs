//! In-memory routine executor
//!
//! Scripted responses per routine plus a log of calls and transaction events.
//! Used by this crate's tests and, through the `testing` feature, by crates
//! built on top of it.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::call::{ExpectedReturn, PreparedCall};
use crate::errors::DataAccessError;
use crate::executor::RoutineExecutor;
use crate::record_set::RawResult;
use type_mapping::Parameters;

/// Transaction lifecycle events, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEvent {
    Begin(usize),
    Commit(usize),
    Rollback(usize),
    /// Dropped while still open
    DroppedOpen(usize),
}

/// One call as the executor saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub routine: String,
    pub parameters: Parameters,
    pub expected: ExpectedReturn,
    pub transaction: Option<usize>,
}

#[derive(Debug, Clone)]
enum Scripted {
    Respond(RawResult),
    Fail(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    scripts: HashMap<String, VecDeque<Scripted>>,
    calls: Vec<RecordedCall>,
    events: Vec<TransactionEvent>,
    next_transaction: usize,
    fail_commit: bool,
    fail_rollback: bool,
    fail_ping: bool,
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Executor that never touches a database
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    state: Arc<Mutex<MemoryState>>,
}

/// Transaction handle issued by [`MemoryExecutor`]
#[derive(Debug)]
pub struct MemoryTransaction {
    id: usize,
    state: Arc<Mutex<MemoryState>>,
    finished: bool,
}

impl MemoryTransaction {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            lock(&self.state).events.push(TransactionEvent::DroppedOpen(self.id));
        }
    }
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, routine: &str, scripted: Scripted) {
        lock(&self.state)
            .scripts
            .entry(routine.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Queue a result for `routine`; the last queued entry repeats
    pub fn respond(&self, routine: &str, raw: RawResult) {
        self.script(routine, Scripted::Respond(raw));
    }

    /// Queue a failure for `routine`; the last queued entry repeats
    pub fn fail(&self, routine: &str, message: &str) {
        self.script(routine, Scripted::Fail(message.to_string()));
    }

    pub fn fail_commit(&self) {
        lock(&self.state).fail_commit = true;
    }

    pub fn fail_rollback(&self) {
        lock(&self.state).fail_rollback = true;
    }

    pub fn fail_ping(&self) {
        lock(&self.state).fail_ping = true;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state).calls.clone()
    }

    pub fn events(&self) -> Vec<TransactionEvent> {
        lock(&self.state).events.clone()
    }

    fn finish(&self, mut tx: MemoryTransaction, event: TransactionEvent, fail: bool) -> Result<(), DataAccessError> {
        tx.finished = true;
        if fail {
            return Err(DataAccessError::Database(sqlx::Error::Protocol(format!(
                "terminal action failed for transaction {}",
                tx.id
            ))));
        }
        lock(&self.state).events.push(event);
        Ok(())
    }
}

#[async_trait]
impl RoutineExecutor for MemoryExecutor {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, DataAccessError> {
        let mut state = lock(&self.state);
        state.next_transaction += 1;
        let id = state.next_transaction;
        state.events.push(TransactionEvent::Begin(id));
        Ok(MemoryTransaction {
            id,
            state: Arc::clone(&self.state),
            finished: false,
        })
    }

    async fn commit(&self, tx: MemoryTransaction) -> Result<(), DataAccessError> {
        let fail = lock(&self.state).fail_commit;
        let id = tx.id;
        self.finish(tx, TransactionEvent::Commit(id), fail)
    }

    async fn rollback(&self, tx: MemoryTransaction) -> Result<(), DataAccessError> {
        let fail = lock(&self.state).fail_rollback;
        let id = tx.id;
        self.finish(tx, TransactionEvent::Rollback(id), fail)
    }

    async fn run(
        &self,
        call: &PreparedCall,
        tx: Option<&mut MemoryTransaction>,
    ) -> Result<RawResult, DataAccessError> {
        let mut state = lock(&self.state);
        state.calls.push(RecordedCall {
            routine: call.routine().to_string(),
            parameters: call
                .arguments()
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            expected: call.expected(),
            transaction: tx.map(|tx| tx.id),
        });

        let scripted = match state.scripts.get_mut(call.routine().as_str()) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match scripted {
            Some(Scripted::Respond(raw)) => Ok(raw),
            Some(Scripted::Fail(message)) => Err(DataAccessError::Database(sqlx::Error::Protocol(message))),
            None => Ok(RawResult::default()),
        }
    }

    async fn ping(&self) -> Result<(), DataAccessError> {
        if lock(&self.state).fail_ping {
            return Err(DataAccessError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}
