//! Validation of one data sheet against its field rules.

use tracing::{debug, trace};
use xlsform_common::SheetGrid;
use xlsform_model::{CellRef, FieldRule, ValidationError};

use crate::checks::{self, CellOutcome};
use crate::error::{Result, ValidateError};
use crate::eval::EvalContext;

/// Check every data row of a sheet, row-major in rule order.
pub(crate) fn validate_sheet(
    grid: &SheetGrid,
    rules: &[FieldRule],
    ctx: EvalContext,
) -> Result<Vec<ValidationError>> {
    let sheet = grid.name();
    let no_data = || ValidateError::NoDataRows {
        sheet: sheet.to_string(),
    };
    let header = grid.header().ok_or_else(no_data)?;

    let mut errors = Vec::new();
    let mut columns: Vec<(&FieldRule, u32)> = Vec::with_capacity(rules.len());
    for rule in rules {
        match header.column(&rule.field_name) {
            Some(col) => columns.push((rule, col)),
            None if rule.required => {
                errors.push(ValidationError::missing_column(sheet, &rule.field_name));
            }
            None => trace!(sheet, field = %rule.field_name, "optional column absent"),
        }
    }

    let mut row_count = 0usize;
    for row in grid.data_rows(&header) {
        row_count += 1;
        for &(rule, col) in &columns {
            let cell = CellRef::new(row.row, col);
            let field = rule.field_name.as_str();
            match checks::run_all(rule, row.get(col), ctx) {
                CellOutcome::Valid => {}
                CellOutcome::RequiredEmpty => {
                    errors.push(ValidationError::required_empty(sheet, cell, field));
                }
                CellOutcome::InvalidType => {
                    errors.push(ValidationError::invalid_type(sheet, cell, field, rule.data_type));
                }
                CellOutcome::ConstraintViolation(detail) => {
                    errors.push(ValidationError::constraint_violation(
                        sheet, cell, field, &detail,
                    ));
                }
            }
        }
    }
    if row_count == 0 {
        return Err(no_data());
    }

    debug!(
        sheet,
        rows = row_count,
        columns = columns.len(),
        errors = errors.len(),
        "validated sheet"
    );
    Ok(errors)
}
