//! # sqlrt
//!
//! Runtime for pre-compiled, parameterized SQL statements: binds typed
//! parameters by position, executes under a cardinality contract, decodes rows
//! into typed records, and supports cancellation and timeouts from another
//! thread.
//!
//! ## Pipeline
//!
//! ```text
//! StatementDescriptor (const, checked at build time)
//!     ↓ + params![..]
//! Invocation        → bind check, prepare handle, arm timeout
//!     ↓
//! Driver            → rows / affected count / generated keys
//!     ↓
//! Policy            → One | Many | Exec | ExecReturningKey | ExecReturningCount
//!     ↓
//! Row decoding      → typed records (FromRow)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlrt::{params, statement, ColumnSpec, Executor, ParamSpec, SqlType};
//!
//! statement! {
//!     pub GET_AUTHOR = {
//!         name: "GetAuthor",
//!         cardinality: One,
//!         sql: "SELECT id, name, bio FROM authors WHERE id = ?",
//!         params: [ParamSpec::new("id", SqlType::Integer)],
//!         columns: [
//!             ColumnSpec::new("id", SqlType::Integer),
//!             ColumnSpec::new("name", SqlType::Text),
//!             ColumnSpec::nullable("bio", SqlType::Text),
//!         ],
//!     }
//! }
//!
//! let conn = rusqlite::Connection::open_in_memory()?;
//! let exec = Executor::new(&conn);
//! let author: Option<(i64, String, Option<String>)> =
//!     exec.one(GET_AUTHOR, params![1i64]).with_timeout(Duration::from_secs(5)).execute()?;
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod execution;
pub mod harness;
pub mod logging;
pub mod query;
pub mod row;
pub mod statement;
pub mod value;

pub use config::{Config, HarnessConfig, LoggingConfig, RuntimeConfig, StorageMode};
pub use driver::{Connection, DriverError, StatementHandle};
pub use error::{BindError, DecodeError, ErrorKind, QueryError, QueryResult};
pub use execution::{
    CancelHandle, Canceller, Interrupt, Invocation, InvocationState, Outcome, QueryTimeout,
    TimeoutError,
};
pub use query::{ExecKeyQuery, ExecQuery, ExecRowsQuery, Executor, ListQuery, RowQuery};
pub use row::{decode_record, FromColumn, FromRow, Row};
pub use statement::{Cardinality, ColumnSpec, ParamSpec, StatementDescriptor};
pub use value::{FromValue, Mismatch, SqlEnum, SqlType, Value};
