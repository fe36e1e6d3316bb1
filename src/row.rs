//! Positional row decoding.
//!
//! Columns are read by index in the order the statement declares them, never
//! by name. Before a record mapper runs, [`decode_record`] checks the row width
//! and rejects NULL in every non-nullable declared column.

use crate::error::DecodeError;
use crate::statement::ColumnSpec;
use crate::value::{FromValue, Mismatch, Value};
use chrono::NaiveDateTime;

/// One result row paired with its declared columns
#[derive(Debug, Clone, Copy)]
pub struct Row<'r> {
    columns: &'r [ColumnSpec],
    values: &'r [Value],
}

impl<'r> Row<'r> {
    pub fn new(columns: &'r [ColumnSpec], values: &'r [Value]) -> Self {
        Row { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &'r [ColumnSpec] {
        self.columns
    }

    /// Raw value at `index`
    pub fn value(&self, index: usize) -> Result<&'r Value, DecodeError> {
        self.values.get(index).ok_or(DecodeError::IndexOutOfBounds {
            index,
            width: self.values.len(),
        })
    }

    fn column_name(&self, index: usize) -> &'static str {
        self.columns.get(index).map_or("?", |c| c.name)
    }

    /// Read a non-null column
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, DecodeError> {
        let value = self.value(index)?;
        if value.is_null() {
            return Err(DecodeError::UnexpectedNull {
                index,
                column: self.column_name(index),
            });
        }
        T::from_value(value).map_err(|m| self.mismatch(index, m))
    }

    /// Read a nullable column; NULL becomes `None`
    pub fn get_opt<T: FromValue>(&self, index: usize) -> Result<Option<T>, DecodeError> {
        let value = self.value(index)?;
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value)
            .map(Some)
            .map_err(|m| self.mismatch(index, m))
    }

    fn mismatch(&self, index: usize, mismatch: Mismatch) -> DecodeError {
        let column = self.column_name(index);
        match mismatch {
            Mismatch::Type { expected, found } => DecodeError::TypeMismatch {
                index,
                column,
                expected,
                found,
            },
            Mismatch::OutOfRange { value, target } => DecodeError::OutOfRange {
                index,
                column,
                value,
                target,
            },
            Mismatch::UnknownVariant { enum_name, value } => DecodeError::UnknownVariant {
                index,
                column,
                enum_name,
                value,
            },
        }
    }
}

/// Maps one row to a typed record
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> Result<Self, DecodeError>;
}

/// A single column read inside a tuple record
pub trait FromColumn: Sized {
    fn from_column(row: &Row<'_>, index: usize) -> Result<Self, DecodeError>;
}

impl<T: FromValue> FromColumn for T {
    fn from_column(row: &Row<'_>, index: usize) -> Result<Self, DecodeError> {
        row.get(index)
    }
}

impl<T: FromValue> FromColumn for Option<T> {
    fn from_column(row: &Row<'_>, index: usize) -> Result<Self, DecodeError> {
        row.get_opt(index)
    }
}

macro_rules! scalar_from_row {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
                    row.get(0)
                }
            }
        )+
    };
}

scalar_from_row!(i64, i32, u32, f64, String, Vec<u8>, bool, NaiveDateTime);

impl<T: FromValue> FromRow for Option<T> {
    fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
        row.get_opt(0)
    }
}

macro_rules! tuple_from_row {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: FromColumn),+> FromRow for ($($name,)+) {
            fn from_row(row: &Row<'_>) -> Result<Self, DecodeError> {
                Ok(($($name::from_column(row, $index)?,)+))
            }
        }
    };
}

tuple_from_row!(A: 0, B: 1);
tuple_from_row!(A: 0, B: 1, C: 2);
tuple_from_row!(A: 0, B: 1, C: 2, D: 3);

/// Check `values` against the declared columns, then map them with `T`
pub fn decode_record<T: FromRow>(
    columns: &[ColumnSpec],
    values: &[Value],
) -> Result<T, DecodeError> {
    if values.len() != columns.len() {
        return Err(DecodeError::ColumnCount {
            expected: columns.len(),
            actual: values.len(),
        });
    }
    if let Some((index, column)) = columns
        .iter()
        .zip(values)
        .enumerate()
        .find(|(_, (column, value))| !column.nullable && value.is_null())
        .map(|(index, (column, _))| (index, column))
    {
        return Err(DecodeError::UnexpectedNull {
            index,
            column: column.name,
        });
    }
    T::from_row(&Row::new(columns, values))
}
