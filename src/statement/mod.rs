//! Statement Descriptors
//!
//! A descriptor is the immutable, compiled description of one query: its SQL
//! text with anonymous `?` placeholders, the ordered parameter list, the ordered
//! result columns and the cardinality contract. Descriptors are `const` values
//! shared by every invocation of the query.
//!
//! ## Build-time checks
//!
//! [`statement!`](crate::statement) emits a `const` assertion next to the
//! descriptor. A parameter list that disagrees with the placeholders in the SQL
//! text fails compilation instead of binding values to the wrong slots:
//!
//! ```rust,ignore
//! sqlrt::statement! {
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
//! ```

mod bind;
pub mod placeholders;

pub(crate) use bind::check_params;

use crate::value::SqlType;
use std::fmt;

/// Declared result shape of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Zero or one row; two or more rows is a violation
    One,
    /// Any number of rows, in result order
    Many,
    /// Side effects only
    ExecNoResult,
    /// Side effects plus one generated key
    ExecReturningKey,
    /// Side effects plus the affected-row count
    ExecReturningCount,
}

impl Cardinality {
    pub const fn name(self) -> &'static str {
        match self {
            Cardinality::One => "one",
            Cardinality::Many => "many",
            Cardinality::ExecNoResult => "exec",
            Cardinality::ExecReturningKey => "execlastid",
            Cardinality::ExecReturningCount => "execrows",
        }
    }

    /// Whether rows are decoded into records
    pub const fn returns_rows(self) -> bool {
        matches!(self, Cardinality::One | Cardinality::Many)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name())
    }
}

/// One positional parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: SqlType,
    pub nullable: bool,
}

impl ParamSpec {
    pub const fn new(name: &'static str, ty: SqlType) -> Self {
        ParamSpec {
            name,
            ty,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str, ty: SqlType) -> Self {
        ParamSpec {
            name,
            ty,
            nullable: true,
        }
    }
}

/// One result column, read by position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: SqlType,
    pub nullable: bool,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, ty: SqlType) -> Self {
        ColumnSpec {
            name,
            ty,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str, ty: SqlType) -> Self {
        ColumnSpec {
            name,
            ty,
            nullable: true,
        }
    }
}

/// Compiled, immutable description of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementDescriptor {
    pub name: &'static str,
    pub sql: &'static str,
    pub cardinality: Cardinality,
    pub params: &'static [ParamSpec],
    pub columns: &'static [ColumnSpec],
}

impl StatementDescriptor {
    pub const fn new(
        name: &'static str,
        sql: &'static str,
        cardinality: Cardinality,
        params: &'static [ParamSpec],
        columns: &'static [ColumnSpec],
    ) -> Self {
        StatementDescriptor {
            name,
            sql,
            cardinality,
            params,
            columns,
        }
    }

    pub const fn placeholder_count(&self) -> usize {
        placeholders::count(self.sql)
    }

    /// Check the descriptor's internal consistency.
    ///
    /// Returns a description of the first problem found.
    pub const fn shape_error(&self) -> Option<&'static str> {
        let scan = placeholders::scan(self.sql);
        if scan.numbered > 0 {
            return Some("numbered placeholders are not supported; use anonymous `?`");
        }
        if scan.positional != self.params.len() {
            return Some("placeholder count in SQL text does not match declared parameters");
        }
        if self.cardinality.returns_rows() && self.columns.is_empty() {
            return Some("row-returning statement declares no result columns");
        }
        match self.cardinality {
            Cardinality::ExecNoResult | Cardinality::ExecReturningCount
                if !self.columns.is_empty() =>
            {
                Some("statement without a result declares result columns")
            }
            Cardinality::ExecReturningKey if self.columns.len() > 1 => {
                Some("generated-key statement declares more than one result column")
            }
            _ => None,
        }
    }

    /// Fail const evaluation if the descriptor is inconsistent
    pub const fn assert_well_formed(&self) {
        if let Some(problem) = self.shape_error() {
            panic!("{}", problem);
        }
    }
}

/// Declare a [`StatementDescriptor`] constant checked at compile time
#[macro_export]
macro_rules! statement {
    (
        $(#[$meta:meta])*
        $vis:vis $ident:ident = {
            name: $name:literal,
            cardinality: $card:ident,
            sql: $sql:expr,
            params: [$($param:expr),* $(,)?],
            columns: [$($column:expr),* $(,)?] $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis const $ident: $crate::StatementDescriptor = {
            const PARAMS: &[$crate::ParamSpec] = &[$($param),*];
            const COLUMNS: &[$crate::ColumnSpec] = &[$($column),*];
            $crate::StatementDescriptor::new($name, $sql, $crate::Cardinality::$card, PARAMS, COLUMNS)
        };

        const _: () = $ident.assert_well_formed();
    };
}
