//! One execution attempt of a statement.
//!
//! An [`Invocation`] moves through `Unstarted -> Running -> {Completed, Failed,
//! Cancelled}`. The statement handle exists only while `Running` and is
//! released on every way out of it, including panics.

use super::policy::{Outcome, Policy};
use super::timeout::{CancelHandle, Interrupt, QueryTimeout};
use crate::driver::{Connection, DriverCancel, DriverError, PrepareOptions, StatementHandle};
use crate::error::{BindError, DecodeError, QueryError, QueryResult};
use crate::statement::{check_params, Cardinality, StatementDescriptor};
use crate::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle state of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationState {
    Unstarted,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl InvocationState {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            InvocationState::Completed | InvocationState::Failed | InvocationState::Cancelled
        )
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvocationState::Unstarted => "unstarted",
            InvocationState::Running => "running",
            InvocationState::Completed => "completed",
            InvocationState::Failed => "failed",
            InvocationState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

struct Slot {
    state: InvocationState,
    /// Driver cancellation path, present only while a handle is live
    driver: Option<Arc<dyn DriverCancel>>,
}

struct Shared {
    statement: &'static str,
    cancel: CancelHandle,
    slot: Mutex<Slot>,
}

impl Shared {
    fn state(&self) -> InvocationState {
        self.slot.lock().state
    }

    fn attach(&self, driver: Arc<dyn DriverCancel>) {
        let mut slot = self.slot.lock();
        if slot.state == InvocationState::Running {
            slot.driver = Some(driver);
        }
    }

    /// Drop the driver path so a late cancel cannot reach a released handle
    fn detach(&self) {
        self.slot.lock().driver = None;
    }

    fn finish(&self, state: InvocationState) {
        let mut slot = self.slot.lock();
        slot.driver = None;
        slot.state = state;
    }
}

/// Cancels an invocation from any thread
#[derive(Clone)]
pub struct Canceller {
    shared: Arc<Shared>,
}

impl Canceller {
    /// Request cancellation of the running statement.
    ///
    /// Fails with [`QueryError::InvocationState`] before execution has begun.
    /// Once the invocation has finished this is a no-op. The request reaches
    /// the driver at most once, however often this is called.
    pub fn cancel(&self) -> QueryResult<()> {
        let mut slot = self.shared.slot.lock();
        match slot.state {
            InvocationState::Unstarted => Err(QueryError::InvocationState {
                statement: self.shared.statement,
                message: "no active execution to cancel",
            }),
            InvocationState::Running => {
                if self.shared.cancel.cancel() {
                    if let Some(driver) = slot.driver.take() {
                        driver.cancel();
                    }
                    debug!(statement = self.shared.statement, "cancel_forwarded");
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn state(&self) -> InvocationState {
        self.shared.state()
    }
}

impl fmt::Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller")
            .field("statement", &self.shared.statement)
            .field("state", &self.state())
            .finish()
    }
}

/// Marks the invocation `Failed` unless finished explicitly
struct RunGuard<'a> {
    shared: &'a Shared,
    finished: bool,
}

impl<'a> RunGuard<'a> {
    fn begin(shared: &'a Shared) -> Self {
        shared.slot.lock().state = InvocationState::Running;
        RunGuard {
            shared,
            finished: false,
        }
    }

    fn finish(mut self, state: InvocationState) {
        self.shared.finish(state);
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.finish(InvocationState::Failed);
        }
    }
}

/// One execution attempt of a [`StatementDescriptor`] with concrete parameters.
///
/// `execute` consumes the invocation, so it runs at most once and creates at
/// most one statement handle.
pub struct Invocation<'c, C: Connection> {
    conn: &'c C,
    statement: StatementDescriptor,
    params: Vec<Value>,
    timeout: Option<Duration>,
    slow_query: Option<Duration>,
    /// Cardinality the caller's result type expects, checked once running
    requested: Option<Cardinality>,
    shared: Arc<Shared>,
}

impl<'c, C: Connection> Invocation<'c, C> {
    pub fn new(conn: &'c C, statement: StatementDescriptor, params: Vec<Value>) -> Self {
        Invocation {
            conn,
            statement,
            params,
            timeout: None,
            slow_query: None,
            requested: None,
            shared: Arc::new(Shared {
                statement: statement.name,
                cancel: CancelHandle::new(),
                slot: Mutex::new(Slot {
                    state: InvocationState::Unstarted,
                    driver: None,
                }),
            }),
        }
    }

    /// Set the wall-clock timeout, measured from when the statement handle is
    /// created. Must be called before `execute`; a zero duration expires
    /// before the statement runs.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn set_slow_query_threshold(&mut self, threshold: Option<Duration>) {
        self.slow_query = threshold;
    }

    pub fn statement(&self) -> &StatementDescriptor {
        &self.statement
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn state(&self) -> InvocationState {
        self.shared.state()
    }

    /// A handle that can cancel this invocation from another thread
    pub fn canceller(&self) -> Canceller {
        Canceller {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Same as `self.canceller().cancel()`
    pub fn cancel(&self) -> QueryResult<()> {
        self.canceller().cancel()
    }

    /// Run the statement and interpret its result by cardinality
    pub fn execute(self) -> QueryResult<Outcome> {
        self.execute_with(Ok)
    }

    /// Run the statement, then map the interpreted result with `finish`.
    ///
    /// `finish` runs before the invocation reaches its final state, so a
    /// decode failure leaves the invocation `Failed`.
    pub fn execute_with<T, F>(self, finish: F) -> QueryResult<T>
    where
        F: FnOnce(Outcome) -> QueryResult<T>,
    {
        let span = tracing::debug_span!(
            "invocation",
            statement = self.statement.name,
            cardinality = %self.statement.cardinality,
            id = %Uuid::new_v4(),
        );
        let _entered = span.enter();

        let started = Instant::now();
        let guard = RunGuard::begin(&self.shared);
        let result = self.run().and_then(finish);

        let state = match &result {
            Ok(_) => InvocationState::Completed,
            Err(err) if err.is_interrupted() => InvocationState::Cancelled,
            Err(_) => InvocationState::Failed,
        };
        guard.finish(state);

        let elapsed = started.elapsed();
        debug!(state = %state, elapsed_us = elapsed.as_micros() as u64, "invocation_finished");
        if self.slow_query.is_some_and(|threshold| elapsed >= threshold) {
            warn!(
                statement = self.statement.name,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow_query"
            );
        }
        result
    }

    /// Like [`Invocation::execute_with`], but first requires the statement to
    /// be declared with `requested`. A mismatch leaves the invocation `Failed`
    /// without creating a statement handle.
    pub(crate) fn execute_as<T, F>(mut self, requested: Cardinality, finish: F) -> QueryResult<T>
    where
        F: FnOnce(Outcome) -> QueryResult<T>,
    {
        self.requested = Some(requested);
        self.execute_with(finish)
    }

    fn run(&self) -> QueryResult<Outcome> {
        let statement = &self.statement;
        if let Some(requested) = self.requested {
            if statement.cardinality != requested {
                return Err(QueryError::ShapeMismatch {
                    statement: statement.name,
                    declared: statement.cardinality,
                    requested,
                });
            }
        }
        check_params(statement, &self.params).map_err(|source| self.bind_error(source))?;

        let policy = Policy::of(statement.cardinality);
        let options = PrepareOptions {
            return_generated_keys: policy.wants_generated_keys(),
        };
        let mut handle = self
            .conn
            .prepare_statement(statement.sql, options)
            .map_err(|source| QueryError::Driver {
                statement: statement.name,
                source,
            })?;
        debug!(params = self.params.len(), "statement_prepared");

        // The clock starts with the handle
        let control = QueryTimeout::with_handle(self.timeout, &self.shared.cancel);
        let raw = self.drive(policy, &mut handle, &control);

        self.shared.detach();
        if let Err(e) = handle.close() {
            warn!(statement = statement.name, error = %e, "statement_close_failed");
        }

        let raw = match raw {
            Ok(raw) => raw,
            // A timeout or cancel explains whatever the driver reported
            Err(err) if !err.is_interrupted() => {
                return Err(match control.check() {
                    Err(interrupt) => self.interrupted(interrupt),
                    Ok(()) => err,
                });
            }
            Err(err) => return Err(err),
        };
        if let Some(interrupt) = control.interrupt() {
            return Err(self.interrupted(interrupt));
        }
        policy.interpret(statement.name, raw)
    }

    fn drive<H: StatementHandle>(
        &self,
        policy: Policy,
        handle: &mut H,
        control: &QueryTimeout,
    ) -> QueryResult<super::policy::RawResult> {
        let declared = self.statement.params.len();
        let reported = handle.parameter_count();
        if reported != declared {
            return Err(self.bind_error(BindError::PlaceholderCount {
                placeholders: reported,
                declared,
            }));
        }

        handle
            .apply_timeout(control)
            .map_err(|e| self.driver_error(e, control))?;
        self.shared.attach(handle.canceller());
        control.check().map_err(|i| self.interrupted(i))?;

        policy
            .run(&self.statement, handle, &self.params)
            .map_err(|e| self.driver_error(e, control))
    }

    fn bind_error(&self, source: BindError) -> QueryError {
        QueryError::Bind {
            statement: self.statement.name,
            source,
        }
    }

    fn interrupted(&self, interrupt: Interrupt) -> QueryError {
        let statement = self.statement.name;
        match interrupt {
            Interrupt::TimedOut(source) => QueryError::Timeout { statement, source },
            Interrupt::Cancelled { elapsed } => QueryError::Cancelled { statement, elapsed },
        }
    }

    fn driver_error(&self, err: DriverError, control: &QueryTimeout) -> QueryError {
        let statement = self.statement.name;
        match err {
            DriverError::Interrupted => self.interrupted(control.interrupt().unwrap_or(
                Interrupt::Cancelled {
                    elapsed: control.elapsed(),
                },
            )),
            DriverError::ColumnCount { expected, actual } => QueryError::Decode {
                statement,
                source: DecodeError::ColumnCount { expected, actual },
            },
            DriverError::Conversion { index, message } => QueryError::Decode {
                statement,
                source: DecodeError::Driver { index, message },
            },
            source @ DriverError::Sql(_) => QueryError::Driver { statement, source },
        }
    }
}

impl<C: Connection> fmt::Debug for Invocation<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("statement", &self.statement.name)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .field("state", &self.state())
            .finish()
    }
}
