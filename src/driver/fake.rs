//! Scripted in-process driver for unit tests.
//!
//! Counts prepared handles, closed handles and forwarded cancel requests so
//! tests can check that every handle is released exactly once.

use super::{
    Connection, DriverCancel, DriverError, ExecSummary, PrepareOptions, StatementHandle,
};
use crate::execution::QueryTimeout;
use crate::statement::ColumnSpec;
use crate::value::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// What every statement prepared on a [`FakeConnection`] does
#[derive(Debug, Clone)]
pub(crate) enum Script {
    Rows(Vec<Vec<Value>>),
    Exec(ExecSummary),
    Fail(&'static str),
    /// Spin until the timeout controller reports an interruption
    Block,
    /// Record a cancel on the controller, then return the rows normally
    RowsAfterCancel(Vec<Vec<Value>>),
    /// Record a cancel on the controller, then fail with a driver error
    FailAfterCancel(&'static str),
    /// Sit out the deadline without polling, then fail with a driver error
    FailAfterDeadline(&'static str),
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub prepared: AtomicUsize,
    pub closed: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl Counters {
    pub fn prepared(&self) -> usize {
        self.prepared.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakeConnection {
    pub script: Script,
    /// Overrides the placeholder count reported by prepared handles
    pub parameter_count: Option<usize>,
    pub counters: Arc<Counters>,
    pub last_options: parking_lot::Mutex<Option<PrepareOptions>>,
}

impl FakeConnection {
    pub fn new(script: Script) -> Self {
        FakeConnection {
            script,
            parameter_count: None,
            counters: Arc::new(Counters::default()),
            last_options: parking_lot::Mutex::new(None),
        }
    }
}

impl Connection for FakeConnection {
    type Statement<'c>
        = FakeHandle<'c>
    where
        Self: 'c;

    fn prepare_statement(
        &self,
        sql: &str,
        options: PrepareOptions,
    ) -> Result<FakeHandle<'_>, DriverError> {
        self.counters.prepared.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock() = Some(options);
        Ok(FakeHandle {
            conn: self,
            parameter_count: self
                .parameter_count
                .unwrap_or_else(|| crate::statement::placeholders::count(sql)),
            control: None,
        })
    }
}

pub(crate) struct FakeHandle<'c> {
    conn: &'c FakeConnection,
    parameter_count: usize,
    control: Option<QueryTimeout>,
}

impl FakeHandle<'_> {
    fn block(&self) -> Result<(), DriverError> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if self.control.as_ref().is_some_and(|c| c.check().is_err()) {
                return Err(DriverError::Interrupted);
            }
            thread::sleep(Duration::from_millis(1));
        }
        Err(DriverError::sql(std::io::Error::other("fake statement never interrupted")))
    }

    /// Fail the way a driver does when it gives up waiting on a lock
    fn fail_late(&self, message: &'static str) -> DriverError {
        match (&self.conn.script, &self.control) {
            (Script::FailAfterCancel(_), Some(control)) => control.cancel(),
            (Script::FailAfterDeadline(_), Some(control)) => {
                let limit = Instant::now() + Duration::from_secs(10);
                while control.remaining().is_some_and(|r| !r.is_zero()) && Instant::now() < limit {
                    thread::sleep(Duration::from_millis(1));
                }
            }
            _ => {}
        }
        DriverError::sql(std::io::Error::other(message))
    }
}

impl StatementHandle for FakeHandle<'_> {
    fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    fn apply_timeout(&mut self, control: &QueryTimeout) -> Result<(), DriverError> {
        self.control = Some(control.clone());
        Ok(())
    }

    fn canceller(&self) -> Arc<dyn DriverCancel> {
        Arc::new(FakeCancel(Arc::clone(&self.conn.counters)))
    }

    fn query(
        &mut self,
        _params: &[Value],
        _columns: &[ColumnSpec],
        max_rows: Option<usize>,
    ) -> Result<Vec<Vec<Value>>, DriverError> {
        let mut rows = match &self.conn.script {
            Script::Rows(rows) => rows.clone(),
            Script::RowsAfterCancel(rows) => {
                if let Some(control) = &self.control {
                    control.cancel();
                }
                rows.clone()
            }
            Script::Fail(message) => return Err(DriverError::sql(std::io::Error::other(*message))),
            Script::FailAfterCancel(message) | Script::FailAfterDeadline(message) => {
                return Err(self.fail_late(message))
            }
            Script::Block => {
                self.block()?;
                Vec::new()
            }
            Script::Exec(_) => Vec::new(),
        };
        if let Some(max) = max_rows {
            rows.truncate(max);
        }
        Ok(rows)
    }

    fn execute(&mut self, _params: &[Value]) -> Result<ExecSummary, DriverError> {
        match &self.conn.script {
            Script::Exec(summary) => Ok(summary.clone()),
            Script::Fail(message) => Err(DriverError::sql(std::io::Error::other(*message))),
            Script::FailAfterCancel(message) | Script::FailAfterDeadline(message) => {
                Err(self.fail_late(message))
            }
            Script::Block => {
                self.block()?;
                Ok(ExecSummary::default())
            }
            Script::Rows(_) | Script::RowsAfterCancel(_) => Ok(ExecSummary::default()),
        }
    }

    fn close(self) -> Result<(), DriverError> {
        Ok(())
    }
}

impl Drop for FakeHandle<'_> {
    fn drop(&mut self) {
        self.conn.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeCancel(Arc<Counters>);

impl DriverCancel for FakeCancel {
    fn cancel(&self) {
        self.0.cancels.fetch_add(1, Ordering::SeqCst);
    }
}
