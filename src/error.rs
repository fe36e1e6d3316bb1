//! Error Types
//!
//! Every failure an invocation can report. Each [`QueryError`] names the
//! statement it came from, and [`QueryError::kind`] collapses the variants into
//! the categories callers branch on.

use crate::driver::DriverError;
use crate::execution::TimeoutError;
use crate::statement::Cardinality;
use crate::value::SqlType;
use std::time::Duration;

/// Failure category of a [`QueryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// More rows than a `One` statement allows, or no generated key
    CardinalityViolation,
    /// A column could not be converted to its declared type
    DecodeFailure,
    /// The invocation's timeout elapsed
    ExecutionTimeout,
    /// The invocation was cancelled
    ExecutionCancelled,
    /// Opaque failure reported by the driver
    DriverFailure,
    /// Parameters do not fit the statement
    BindFailure,
    /// Operation not valid in the invocation's current state
    InvalidState,
}

/// Error returned by statement execution
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("{statement}: expected one row in result set, but got many")]
    MultipleRows { statement: &'static str },

    #[error("{statement}: no generated key returned")]
    NoGeneratedKey { statement: &'static str },

    #[error("{statement}: {source}")]
    Decode {
        statement: &'static str,
        source: DecodeError,
    },

    #[error("{statement}: {source}")]
    Bind {
        statement: &'static str,
        source: BindError,
    },

    #[error("{statement}: {source}")]
    Timeout {
        statement: &'static str,
        source: TimeoutError,
    },

    #[error("{statement}: execution cancelled after {elapsed:?}")]
    Cancelled {
        statement: &'static str,
        elapsed: Duration,
    },

    #[error("{statement}: {message}")]
    InvocationState {
        statement: &'static str,
        message: &'static str,
    },

    #[error("{statement}: statement is declared {declared}, executed as {requested}")]
    ShapeMismatch {
        statement: &'static str,
        declared: Cardinality,
        requested: Cardinality,
    },

    #[error("{statement}: driver error: {source}")]
    Driver {
        statement: &'static str,
        source: DriverError,
    },
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::MultipleRows { .. } | QueryError::NoGeneratedKey { .. } => {
                ErrorKind::CardinalityViolation
            }
            QueryError::Decode { .. } => ErrorKind::DecodeFailure,
            QueryError::Bind { .. } | QueryError::ShapeMismatch { .. } => ErrorKind::BindFailure,
            QueryError::Timeout { .. } => ErrorKind::ExecutionTimeout,
            QueryError::Cancelled { .. } => ErrorKind::ExecutionCancelled,
            QueryError::InvocationState { .. } => ErrorKind::InvalidState,
            QueryError::Driver { .. } => ErrorKind::DriverFailure,
        }
    }

    /// Name of the statement that failed
    pub fn statement(&self) -> &'static str {
        match self {
            QueryError::MultipleRows { statement }
            | QueryError::NoGeneratedKey { statement }
            | QueryError::Decode { statement, .. }
            | QueryError::Bind { statement, .. }
            | QueryError::Timeout { statement, .. }
            | QueryError::Cancelled { statement, .. }
            | QueryError::InvocationState { statement, .. }
            | QueryError::ShapeMismatch { statement, .. }
            | QueryError::Driver { statement, .. } => statement,
        }
    }

    /// Whether the invocation ended because of a timeout or a cancel request
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ExecutionTimeout | ErrorKind::ExecutionCancelled
        )
    }
}

/// A result row that does not match the declared result shape
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("column {index} ({column}) is NULL but declared non-nullable")]
    UnexpectedNull { index: usize, column: &'static str },

    #[error("column {index} ({column}): expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        column: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column {index} ({column}): value {value} out of range for {target}")]
    OutOfRange {
        index: usize,
        column: &'static str,
        value: i64,
        target: &'static str,
    },

    #[error("column {index} ({column}): no {enum_name} variant for {value:?}")]
    UnknownVariant {
        index: usize,
        column: &'static str,
        enum_name: &'static str,
        value: String,
    },

    #[error("row has {actual} columns, statement declares {expected}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("column index {index} out of bounds for row of width {width}")]
    IndexOutOfBounds { index: usize, width: usize },

    #[error("column {index}: {message}")]
    Driver { index: usize, message: String },
}

/// Parameters that do not fit a statement's declared parameter list
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("statement declares {declared} parameters, {supplied} supplied")]
    ParameterCount { declared: usize, supplied: usize },

    #[error("SQL text has {placeholders} placeholders, {declared} parameters declared")]
    PlaceholderCount { placeholders: usize, declared: usize },

    #[error("parameter {position} ({name}) is NULL but declared non-nullable")]
    NullParameter { position: usize, name: &'static str },

    #[error("parameter {position} ({name}): expected {expected}, got {got}")]
    TypeMismatch {
        position: usize,
        name: &'static str,
        expected: SqlType,
        got: &'static str,
    },
}

/// Result type for statement execution
pub type QueryResult<T> = Result<T, QueryError>;
