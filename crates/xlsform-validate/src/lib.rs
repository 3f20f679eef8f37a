//! Validation of submitted workbooks against XLSForm rules.
//!
//! For each target sheet of a [`RuleSet`], every data row is checked against
//! every applicable [`FieldRule`](xlsform_model::FieldRule):
//!
//! - **Required**: blank cells in required fields
//! - **Type**: values that do not coerce to the declared data type
//! - **Constraint**: typed values outside a choice list or failing an expression
//!
//! Content problems are collected as [`ValidationError`]s and never abort the
//! scan; only unreadable input fails with [`ValidateError`].
//!
//! ```ignore
//! let rules = xlsform_schema::parse(&schema_bytes)?;
//! let result = xlsform_validate::validate(&rules, &data_bytes)?;
//! for error in &result.errors {
//!     println!("{error}");
//! }
//! ```

mod checks;
mod coerce;
mod error;
mod eval;
mod options;
mod sheet;

use calamine::Reader;
use tracing::{debug, debug_span};
use xlsform_common::{find_sheet, open_workbook, read_sheet};
use xlsform_model::{RuleSet, SheetTarget, ValidationError, ValidationResult};

pub use error::{Result, ValidateError};
pub use options::ValidateOptions;

use eval::EvalContext;

/// Validate data workbook bytes against a rule set.
pub fn validate(rule_set: &RuleSet, data_bytes: &[u8]) -> Result<ValidationResult> {
    validate_with(rule_set, data_bytes, &ValidateOptions::default())
}

/// Validate with explicit options.
///
/// Errors are ordered by sheet (rule set order), then row, then rule, so
/// identical inputs always give identical results.
pub fn validate_with(
    rule_set: &RuleSet,
    data_bytes: &[u8],
    options: &ValidateOptions,
) -> Result<ValidationResult> {
    let span = debug_span!("validate", bytes = data_bytes.len());
    let _guard = span.enter();

    let mut workbook = open_workbook(data_bytes)?;
    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(ValidateError::NoWorksheets);
    }
    let ctx = EvalContext {
        today: options.resolve_today(),
    };

    let mut errors = Vec::new();
    for sheet_rules in rule_set.sheets() {
        let resolved = match &sheet_rules.target {
            SheetTarget::First => sheet_names.first().map(String::as_str),
            SheetTarget::Named(name) => find_sheet(&sheet_names, name),
        };
        let Some(sheet_name) = resolved.map(str::to_string) else {
            let fields = sheet_rules
                .fields
                .iter()
                .map(|rule| rule.field_name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            debug!(target_sheet = %sheet_rules.target, "expected sheet not found");
            errors.push(ValidationError::missing_sheet(
                &sheet_rules.target.to_string(),
                &fields,
            ));
            continue;
        };
        let grid = read_sheet(&mut workbook, &sheet_name)?;
        errors.extend(sheet::validate_sheet(&grid, &sheet_rules.fields, ctx)?);
    }

    debug!(errors = errors.len(), "validation finished");
    Ok(ValidationResult::from_errors(errors))
}
