//! Result interpretation.
//!
//! Every cardinality runs through the same execution path; they differ only in
//! which driver call is made and how its raw result is checked.

use crate::driver::{DriverError, ExecSummary, StatementHandle};
use crate::error::{QueryError, QueryResult};
use crate::statement::{Cardinality, StatementDescriptor};
use crate::value::Value;

/// Raw driver result before cardinality checks
#[derive(Debug)]
pub(crate) enum RawResult {
    Rows(Vec<Vec<Value>>),
    Summary(ExecSummary),
}

/// Interpreted result of one execution
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `One`: the row, or `None` when nothing matched
    Row(Option<Vec<Value>>),
    /// `Many`: rows in result order
    Rows(Vec<Vec<Value>>),
    /// `ExecNoResult`
    Done,
    /// `ExecReturningKey`
    Key(i64),
    /// `ExecReturningCount`
    Count(u64),
}

/// How a cardinality drives the handle and checks the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Policy {
    FirstRow,
    AllRows,
    Discard,
    GeneratedKey,
    AffectedCount,
}

impl Policy {
    pub(crate) const fn of(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::One => Policy::FirstRow,
            Cardinality::Many => Policy::AllRows,
            Cardinality::ExecNoResult => Policy::Discard,
            Cardinality::ExecReturningKey => Policy::GeneratedKey,
            Cardinality::ExecReturningCount => Policy::AffectedCount,
        }
    }

    pub(crate) const fn wants_generated_keys(self) -> bool {
        matches!(self, Policy::GeneratedKey)
    }

    /// Run the statement on `handle`
    pub(crate) fn run<H: StatementHandle>(
        self,
        statement: &StatementDescriptor,
        handle: &mut H,
        params: &[Value],
    ) -> Result<RawResult, DriverError> {
        match self {
            // A second row is enough to prove the violation
            Policy::FirstRow => handle
                .query(params, statement.columns, Some(2))
                .map(RawResult::Rows),
            Policy::AllRows => handle
                .query(params, statement.columns, None)
                .map(RawResult::Rows),
            Policy::Discard | Policy::GeneratedKey | Policy::AffectedCount => {
                handle.execute(params).map(RawResult::Summary)
            }
        }
    }

    /// Check the raw result against the cardinality contract
    pub(crate) fn interpret(self, statement: &'static str, raw: RawResult) -> QueryResult<Outcome> {
        match (self, raw) {
            (Policy::FirstRow, RawResult::Rows(mut rows)) => {
                if rows.len() > 1 {
                    return Err(QueryError::MultipleRows { statement });
                }
                Ok(Outcome::Row(rows.pop()))
            }
            (Policy::AllRows, RawResult::Rows(rows)) => Ok(Outcome::Rows(rows)),
            (Policy::Discard, RawResult::Summary(_)) => Ok(Outcome::Done),
            (Policy::GeneratedKey, RawResult::Summary(summary)) => summary
                .generated_keys
                .first()
                .copied()
                .map(Outcome::Key)
                .ok_or(QueryError::NoGeneratedKey { statement }),
            (Policy::AffectedCount, RawResult::Summary(summary)) => {
                Ok(Outcome::Count(summary.affected_rows))
            }
            _ => Err(QueryError::InvocationState {
                statement,
                message: "driver result does not match the statement's cardinality",
            }),
        }
    }
}
