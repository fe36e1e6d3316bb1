//! SQLite driver over `rusqlite`.
//!
//! - Timeouts and cancel requests are observed through a progress handler
//!   that polls the invocation's [`QueryTimeout`] every
//!   [`PROGRESS_INTERVAL`] virtual machine operations, and between rows.
//! - A cancel from another thread calls `sqlite3_interrupt` through
//!   [`rusqlite::InterruptHandle`].
//! - Neither reaches SQLite's busy handler, so lock waits are cut into
//!   [`BUSY_SLICE`] pieces and the controller is polled between them.
//! - Generated keys come from a `RETURNING` column when the statement has one,
//!   otherwise from `last_insert_rowid()` when the statement moved it.

use super::{
    Connection, DriverCancel, DriverError, ExecSummary, PrepareOptions, StatementHandle,
};
use crate::execution::QueryTimeout;
use crate::statement::ColumnSpec;
use crate::value::{SqlType, Value};
use chrono::NaiveDateTime;
use rusqlite::types::ToSqlOutput;
use rusqlite::{params_from_iter, ErrorCode, InterruptHandle, ToSql};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::trace;

/// Virtual machine operations between two progress callbacks
pub const PROGRESS_INTERVAL: i32 = 1000;

/// Longest single lock wait inside SQLite while an invocation runs
pub const BUSY_SLICE: Duration = Duration::from_millis(20);

/// Lock wait allowed without a deadline; also rusqlite's connection default
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Null => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Null)),
            Value::Integer(v) => v.to_sql(),
            Value::Real(v) => v.to_sql(),
            Value::Text(s) => s.to_sql(),
            Value::Blob(b) => b.to_sql(),
            Value::Bool(b) => b.to_sql(),
            Value::Timestamp(t) => t.to_sql(),
        }
    }
}

impl Connection for rusqlite::Connection {
    type Statement<'c>
        = SqliteStatement<'c>
    where
        Self: 'c;

    fn prepare_statement(
        &self,
        sql: &str,
        options: PrepareOptions,
    ) -> Result<SqliteStatement<'_>, DriverError> {
        let stmt = self.prepare(sql).map_err(map_error)?;
        Ok(SqliteStatement {
            conn: self,
            stmt,
            options,
            control: None,
            progress: None,
        })
    }
}

/// A prepared statement on a `rusqlite::Connection`
pub struct SqliteStatement<'c> {
    conn: &'c rusqlite::Connection,
    stmt: rusqlite::Statement<'c>,
    options: PrepareOptions,
    control: Option<QueryTimeout>,
    progress: Option<ProgressGuard<'c>>,
}

impl SqliteStatement<'_> {
    fn interrupted(&self) -> bool {
        self.control
            .as_ref()
            .is_some_and(|control| control.check().is_err())
    }

    /// Re-run `attempt` while it fails on a locked database.
    ///
    /// Stops once the controller reports an interruption, or after
    /// [`DEFAULT_BUSY_TIMEOUT`] when there is no deadline.
    fn retry_busy<T>(
        &mut self,
        mut attempt: impl FnMut(&mut Self) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let started = Instant::now();
        let mut retries = 0u32;
        loop {
            let tried = Instant::now();
            let err = match attempt(self) {
                Err(err) if is_busy(&err) => err,
                other => return other,
            };
            let Some(control) = &self.control else {
                return Err(err);
            };
            if control.check().is_err() {
                trace!(retries, "lock_wait_interrupted");
                return Err(DriverError::Interrupted);
            }
            if control.remaining().is_none() && started.elapsed() >= DEFAULT_BUSY_TIMEOUT {
                return Err(err);
            }
            retries += 1;
            // SQLite may report busy without waiting at all
            let pause = busy_slice(control).saturating_sub(tried.elapsed());
            if !pause.is_zero() {
                thread::sleep(pause);
            }
        }
    }

    fn query_once(
        &mut self,
        params: &[Value],
        columns: &[ColumnSpec],
        max_rows: Option<usize>,
    ) -> Result<Vec<Vec<Value>>, DriverError> {
        let mut out = Vec::new();
        let mut rows = self.stmt.query(params_from_iter(params)).map_err(map_error)?;
        while let Some(row) = rows.next().map_err(map_error)? {
            let mut record = Vec::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                record.push(read_column(row, index, column.ty)?);
            }
            out.push(record);

            if max_rows.is_some_and(|max| out.len() >= max) {
                break;
            }
            if self
                .control
                .as_ref()
                .is_some_and(|control| control.check().is_err())
            {
                return Err(DriverError::Interrupted);
            }
        }
        Ok(out)
    }

    fn execute_once(&mut self, params: &[Value]) -> Result<ExecSummary, DriverError> {
        let mut summary = ExecSummary::default();

        if self.stmt.column_count() > 0 {
            // RETURNING clause: step every row, keys come from its first column
            let want_keys = self.options.return_generated_keys;
            let mut rows = self.stmt.query(params_from_iter(params)).map_err(map_error)?;
            while let Some(row) = rows.next().map_err(map_error)? {
                summary.affected_rows += 1;
                if want_keys {
                    if let Some(key) = row.get::<_, Option<i64>>(0).map_err(|e| {
                        DriverError::Conversion {
                            index: 0,
                            message: e.to_string(),
                        }
                    })? {
                        summary.generated_keys.push(key);
                    }
                }
            }
            drop(rows);
            if self.interrupted() {
                return Err(DriverError::Interrupted);
            }
            return Ok(summary);
        }

        let rowid_before = self.conn.last_insert_rowid();
        let affected = self.stmt.execute(params_from_iter(params)).map_err(map_error)?;
        summary.affected_rows = affected as u64;
        // Only a completed INSERT moves last_insert_rowid, whatever the
        // statement's leading keyword
        let rowid = self.conn.last_insert_rowid();
        if self.options.return_generated_keys && affected > 0 && rowid != rowid_before {
            summary.generated_keys.push(rowid);
        }
        Ok(summary)
    }
}

impl StatementHandle for SqliteStatement<'_> {
    fn parameter_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    fn apply_timeout(&mut self, control: &QueryTimeout) -> Result<(), DriverError> {
        self.conn
            .busy_timeout(busy_slice(control))
            .map_err(map_error)?;
        let check = control.clone();
        self.conn
            .progress_handler(PROGRESS_INTERVAL, Some(move || check.check().is_err()));
        self.progress = Some(ProgressGuard { conn: self.conn });
        self.control = Some(control.clone());
        Ok(())
    }

    fn canceller(&self) -> Arc<dyn DriverCancel> {
        Arc::new(SqliteCancel(self.conn.get_interrupt_handle()))
    }

    fn query(
        &mut self,
        params: &[Value],
        columns: &[ColumnSpec],
        max_rows: Option<usize>,
    ) -> Result<Vec<Vec<Value>>, DriverError> {
        let actual = self.stmt.column_count();
        if actual != columns.len() {
            return Err(DriverError::ColumnCount {
                expected: columns.len(),
                actual,
            });
        }
        self.retry_busy(|stmt| stmt.query_once(params, columns, max_rows))
    }

    fn execute(&mut self, params: &[Value]) -> Result<ExecSummary, DriverError> {
        self.retry_busy(|stmt| stmt.execute_once(params))
    }

    fn close(self) -> Result<(), DriverError> {
        let SqliteStatement { stmt, progress, .. } = self;
        drop(progress);
        stmt.finalize().map_err(map_error)
    }
}

/// Removes the progress handler and restores the connection's lock wait when
/// the statement is released
struct ProgressGuard<'c> {
    conn: &'c rusqlite::Connection,
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
        let _ = self.conn.busy_timeout(DEFAULT_BUSY_TIMEOUT);
    }
}

struct SqliteCancel(InterruptHandle);

impl DriverCancel for SqliteCancel {
    fn cancel(&self) {
        self.0.interrupt();
    }
}

fn read_column(
    row: &rusqlite::Row<'_>,
    index: usize,
    ty: SqlType,
) -> Result<Value, DriverError> {
    let value = match ty {
        SqlType::Integer => row.get::<_, Option<i64>>(index).map(|v| v.map(Value::Integer)),
        SqlType::Real => row.get::<_, Option<f64>>(index).map(|v| v.map(Value::Real)),
        SqlType::Text | SqlType::Enum(_) => {
            row.get::<_, Option<String>>(index).map(|v| v.map(Value::Text))
        }
        SqlType::Blob => row.get::<_, Option<Vec<u8>>>(index).map(|v| v.map(Value::Blob)),
        SqlType::Bool => row.get::<_, Option<bool>>(index).map(|v| v.map(Value::Bool)),
        SqlType::Timestamp => row
            .get::<_, Option<NaiveDateTime>>(index)
            .map(|v| v.map(Value::Timestamp)),
    };
    value
        .map(|v| v.unwrap_or(Value::Null))
        .map_err(|e| DriverError::Conversion {
            index,
            message: e.to_string(),
        })
}

fn map_error(err: rusqlite::Error) -> DriverError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::OperationInterrupted => {
            DriverError::Interrupted
        }
        other => DriverError::sql(other),
    }
}

/// Lock wait for one attempt, never past the deadline
fn busy_slice(control: &QueryTimeout) -> Duration {
    control
        .remaining()
        .map_or(BUSY_SLICE, |remaining| remaining.min(BUSY_SLICE))
}

fn is_busy(err: &DriverError) -> bool {
    let DriverError::Sql(source) = err else {
        return false;
    };
    matches!(
        source.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::DatabaseBusy
    )
}
