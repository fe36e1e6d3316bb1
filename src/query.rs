//! Typed statement façades.
//!
//! [`Executor`] binds a caller-owned connection to runtime settings and builds
//! one typed query per cardinality:
//!
//! | Cardinality | Query | `execute` returns |
//! |---|---|---|
//! | `One` | [`RowQuery`] | `Option<T>` |
//! | `Many` | [`ListQuery`] | `Vec<T>` |
//! | `ExecNoResult` | [`ExecQuery`] | `()` |
//! | `ExecReturningKey` | [`ExecKeyQuery`] | `i64` |
//! | `ExecReturningCount` | [`ExecRowsQuery`] | `u64` |
//!
//! ```rust,ignore
//! let exec = Executor::new(&conn);
//! let id = exec.exec_key(CREATE_AUTHOR, params!["Brian Kernighan", None::<String>]).execute()?;
//! let author: Option<Author> = exec.one(GET_AUTHOR, params![id]).execute()?;
//! ```

use crate::config::RuntimeConfig;
use crate::driver::Connection;
use crate::error::{QueryError, QueryResult};
use crate::execution::{Canceller, Invocation, InvocationState, Outcome};
use crate::row::{decode_record, FromRow};
use crate::statement::{Cardinality, StatementDescriptor};
use crate::value::Value;
use std::marker::PhantomData;
use std::time::Duration;

/// Builds invocations on one connection
pub struct Executor<'c, C: Connection> {
    conn: &'c C,
    config: RuntimeConfig,
}

impl<'c, C: Connection> Clone for Executor<'c, C> {
    fn clone(&self) -> Self {
        Executor {
            conn: self.conn,
            config: self.config,
        }
    }
}

impl<'c, C: Connection> Executor<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Executor::with_config(conn, RuntimeConfig::default())
    }

    pub fn with_config(conn: &'c C, config: RuntimeConfig) -> Self {
        Executor { conn, config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Untyped invocation with the configured default timeout
    pub fn invocation(&self, statement: StatementDescriptor, params: Vec<Value>) -> Invocation<'c, C> {
        let mut invocation = Invocation::new(self.conn, statement, params);
        if let Some(timeout) = self.config.default_timeout() {
            invocation.set_timeout(timeout);
        }
        invocation.set_slow_query_threshold(self.config.slow_query_threshold());
        invocation
    }

    pub fn one<T: FromRow>(&self, statement: StatementDescriptor, params: Vec<Value>) -> RowQuery<'c, C, T> {
        RowQuery {
            invocation: self.invocation(statement, params),
            _record: PhantomData,
        }
    }

    pub fn many<T: FromRow>(&self, statement: StatementDescriptor, params: Vec<Value>) -> ListQuery<'c, C, T> {
        ListQuery {
            invocation: self.invocation(statement, params),
            _record: PhantomData,
        }
    }

    pub fn exec(&self, statement: StatementDescriptor, params: Vec<Value>) -> ExecQuery<'c, C> {
        ExecQuery {
            invocation: self.invocation(statement, params),
        }
    }

    pub fn exec_key(&self, statement: StatementDescriptor, params: Vec<Value>) -> ExecKeyQuery<'c, C> {
        ExecKeyQuery {
            invocation: self.invocation(statement, params),
        }
    }

    pub fn exec_rows(&self, statement: StatementDescriptor, params: Vec<Value>) -> ExecRowsQuery<'c, C> {
        ExecRowsQuery {
            invocation: self.invocation(statement, params),
        }
    }
}

/// Controls every typed query shares with its invocation
macro_rules! invocation_controls {
    ($query:ident $(<$t:ident>)?) => {
        impl<'c, C: Connection $(, $t: FromRow)?> $query<'c, C $(, $t)?> {
            /// Set the wall-clock timeout; see [`Invocation::set_timeout`]
            pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
                self.invocation.set_timeout(timeout);
                self
            }

            pub fn with_timeout(mut self, timeout: Duration) -> Self {
                self.invocation.set_timeout(timeout);
                self
            }

            pub fn canceller(&self) -> Canceller {
                self.invocation.canceller()
            }

            pub fn cancel(&self) -> QueryResult<()> {
                self.invocation.cancel()
            }

            pub fn state(&self) -> InvocationState {
                self.invocation.state()
            }

            pub fn statement(&self) -> &StatementDescriptor {
                self.invocation.statement()
            }
        }
    };
}

fn unexpected(statement: &'static str) -> QueryError {
    QueryError::InvocationState {
        statement,
        message: "driver result does not match the statement's cardinality",
    }
}

/// Query returning at most one record
pub struct RowQuery<'c, C: Connection, T> {
    invocation: Invocation<'c, C>,
    _record: PhantomData<fn() -> T>,
}

invocation_controls!(RowQuery<T>);

impl<'c, C: Connection, T: FromRow> RowQuery<'c, C, T> {
    /// `None` when nothing matched; more than one row is an error
    pub fn execute(self) -> QueryResult<Option<T>> {
        let statement = *self.invocation.statement();
        self.invocation.execute_as(Cardinality::One, |outcome| match outcome {
            Outcome::Row(None) => Ok(None),
            Outcome::Row(Some(values)) => decode_record(statement.columns, &values)
                .map(Some)
                .map_err(|source| QueryError::Decode {
                    statement: statement.name,
                    source,
                }),
            _ => Err(unexpected(statement.name)),
        })
    }
}

/// Query returning records in result order
pub struct ListQuery<'c, C: Connection, T> {
    invocation: Invocation<'c, C>,
    _record: PhantomData<fn() -> T>,
}

invocation_controls!(ListQuery<T>);

impl<'c, C: Connection, T: FromRow> ListQuery<'c, C, T> {
    pub fn execute(self) -> QueryResult<Vec<T>> {
        let statement = *self.invocation.statement();
        self.invocation.execute_as(Cardinality::Many, |outcome| match outcome {
            Outcome::Rows(rows) => rows
                .iter()
                .map(|values| decode_record(statement.columns, values))
                .collect::<Result<Vec<T>, _>>()
                .map_err(|source| QueryError::Decode {
                    statement: statement.name,
                    source,
                }),
            _ => Err(unexpected(statement.name)),
        })
    }
}

/// Side-effect statement
pub struct ExecQuery<'c, C: Connection> {
    invocation: Invocation<'c, C>,
}

invocation_controls!(ExecQuery);

impl<'c, C: Connection> ExecQuery<'c, C> {
    pub fn execute(self) -> QueryResult<()> {
        let name = self.invocation.statement().name;
        self.invocation.execute_as(Cardinality::ExecNoResult, |outcome| match outcome {
            Outcome::Done => Ok(()),
            _ => Err(unexpected(name)),
        })
    }
}

/// Insert returning the generated key
pub struct ExecKeyQuery<'c, C: Connection> {
    invocation: Invocation<'c, C>,
}

invocation_controls!(ExecKeyQuery);

impl<'c, C: Connection> ExecKeyQuery<'c, C> {
    /// Fails with `NoGeneratedKey` when the statement produced no key
    pub fn execute(self) -> QueryResult<i64> {
        let name = self.invocation.statement().name;
        self.invocation.execute_as(Cardinality::ExecReturningKey, |outcome| match outcome {
            Outcome::Key(key) => Ok(key),
            _ => Err(unexpected(name)),
        })
    }
}

/// Statement returning the number of affected rows
pub struct ExecRowsQuery<'c, C: Connection> {
    invocation: Invocation<'c, C>,
}

invocation_controls!(ExecRowsQuery);

impl<'c, C: Connection> ExecRowsQuery<'c, C> {
    pub fn execute(self) -> QueryResult<u64> {
        let name = self.invocation.statement().name;
        self.invocation.execute_as(Cardinality::ExecReturningCount, |outcome| match outcome {
            Outcome::Count(count) => Ok(count),
            _ => Err(unexpected(name)),
        })
    }
}
