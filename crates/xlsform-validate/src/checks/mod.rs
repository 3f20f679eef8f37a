//! Per-cell checks.
//!
//! Checks run in a fixed order and stop at the first failure for a cell:
//! required, then type, then constraint. A blank optional cell passes
//! without further checks.

pub(crate) mod constraint;
pub(crate) mod datatype;
pub(crate) mod required;

use calamine::Data;
use xlsform_common::is_blank;
use xlsform_model::FieldRule;

use crate::eval::EvalContext;

/// Result of checking one cell against one rule.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellOutcome {
    Valid,
    RequiredEmpty,
    InvalidType,
    /// Constraint failed; carries the violation detail.
    ConstraintViolation(String),
}

/// Run every check for one cell.
pub(crate) fn run_all(rule: &FieldRule, cell: &Data, ctx: EvalContext) -> CellOutcome {
    if is_blank(cell) {
        return required::check(rule);
    }
    let Some(value) = datatype::check(rule, cell) else {
        return CellOutcome::InvalidType;
    };
    constraint::check(rule, &value, ctx)
}
