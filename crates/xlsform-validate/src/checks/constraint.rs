//! Constraint check.

use xlsform_model::FieldRule;

use super::CellOutcome;
use crate::coerce::Value;
use crate::eval::{EvalContext, first_failure};

/// Evaluate the rule's constraint against a typed value.
pub(crate) fn check(rule: &FieldRule, value: &Value, ctx: EvalContext) -> CellOutcome {
    let Some(constraint) = &rule.constraint else {
        return CellOutcome::Valid;
    };
    match first_failure(constraint, value, ctx) {
        Some(failed) => CellOutcome::ConstraintViolation(failed.describe()),
        None => CellOutcome::Valid,
    }
}
