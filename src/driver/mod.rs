//! Driver Seam
//!
//! The runtime talks to a relational connection only through these traits.
//! A [`Connection`] is owned by the caller; the runtime prepares one
//! [`StatementHandle`] per invocation and always releases it with
//! [`StatementHandle::close`].
//!
//! [`sqlite`] implements the seam for `rusqlite::Connection`.

#[cfg(test)]
pub(crate) mod fake;
pub mod sqlite;

use crate::execution::QueryTimeout;
use crate::statement::ColumnSpec;
use crate::value::Value;
use std::sync::Arc;

/// Options fixed when the statement handle is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareOptions {
    /// Collect generated keys from [`StatementHandle::execute`]
    pub return_generated_keys: bool,
}

/// What a side-effect statement reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecSummary {
    pub affected_rows: u64,
    /// Keys assigned by the database, empty unless requested at prepare time
    pub generated_keys: Vec<i64>,
}

/// Forwards a cancel request to the driver's own interruption mechanism.
///
/// Called from a thread other than the one running the statement.
pub trait DriverCancel: Send + Sync {
    fn cancel(&self);
}

/// A live relational connection
pub trait Connection {
    type Statement<'c>: StatementHandle
    where
        Self: 'c;

    /// Prepare `sql` into a fresh statement handle
    fn prepare_statement(
        &self,
        sql: &str,
        options: PrepareOptions,
    ) -> Result<Self::Statement<'_>, DriverError>;
}

/// The cancellable resource that runs one invocation
pub trait StatementHandle {
    /// Placeholder count reported by the driver
    fn parameter_count(&self) -> usize;

    /// Attach the invocation's timeout controller.
    ///
    /// The driver polls `control` while the statement runs and stops with
    /// [`DriverError::Interrupted`] once it reports an interruption.
    fn apply_timeout(&mut self, control: &QueryTimeout) -> Result<(), DriverError>;

    /// Cancellation path for this handle, usable from another thread
    fn canceller(&self) -> Arc<dyn DriverCancel>;

    /// Run a row-returning statement, reading each column as declared.
    ///
    /// Stops reading after `max_rows` rows when set.
    fn query(
        &mut self,
        params: &[Value],
        columns: &[ColumnSpec],
        max_rows: Option<usize>,
    ) -> Result<Vec<Vec<Value>>, DriverError>;

    /// Run a side-effect statement
    fn execute(&mut self, params: &[Value]) -> Result<ExecSummary, DriverError>;

    /// Release the handle
    fn close(self) -> Result<(), DriverError>;
}

/// Failure reported by a driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The statement stopped because of a timeout or cancel request
    #[error("statement interrupted")]
    Interrupted,

    #[error("result has {actual} columns, statement declares {expected}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("column {index}: {message}")]
    Conversion { index: usize, message: String },

    #[error("{0}")]
    Sql(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DriverError {
    pub fn sql<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DriverError::Sql(Box::new(err))
    }
}
