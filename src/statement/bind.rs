//! Parameter checks run before a statement handle is created.

use super::StatementDescriptor;
use crate::error::BindError;
use crate::value::Value;

/// Verify that `params` fits the statement's declared parameter list.
///
/// Values are matched to slots strictly by position.
pub(crate) fn check_params(
    statement: &StatementDescriptor,
    params: &[Value],
) -> Result<(), BindError> {
    let scan = super::placeholders::scan(statement.sql);
    let placeholders = scan.positional + scan.numbered;
    if scan.numbered > 0 || placeholders != statement.params.len() {
        return Err(BindError::PlaceholderCount {
            placeholders,
            declared: statement.params.len(),
        });
    }

    if params.len() != statement.params.len() {
        return Err(BindError::ParameterCount {
            declared: statement.params.len(),
            supplied: params.len(),
        });
    }

    for (position, (spec, value)) in statement.params.iter().zip(params).enumerate() {
        if value.is_null() {
            if !spec.nullable {
                return Err(BindError::NullParameter {
                    position,
                    name: spec.name,
                });
            }
            continue;
        }
        if !spec.ty.accepts(value) {
            return Err(BindError::TypeMismatch {
                position,
                name: spec.name,
                expected: spec.ty,
                got: value.type_name(),
            });
        }
    }

    Ok(())
}
