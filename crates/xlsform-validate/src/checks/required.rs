//! Required field check.

use xlsform_model::FieldRule;

use super::CellOutcome;

/// Outcome for a blank cell.
pub(crate) fn check(rule: &FieldRule) -> CellOutcome {
    if rule.required {
        CellOutcome::RequiredEmpty
    } else {
        CellOutcome::Valid
    }
}
