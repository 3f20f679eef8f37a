//! Validation errors and the overall validation result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell::CellRef;
use crate::data_type::DataType;

/// What kind of check produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required field left blank.
    RequiredEmpty,
    /// Value could not be coerced to the declared type.
    InvalidType,
    /// Typed value failed its constraint.
    ConstraintViolation,
    /// Expected data sheet not present in the workbook.
    MissingSheet,
    /// Required field has no column in the data sheet.
    MissingColumn,
}

impl ErrorKind {
    /// Cell-level kinds point at one cell; the others describe a whole sheet.
    pub fn is_cell_level(&self) -> bool {
        matches!(
            self,
            Self::RequiredEmpty | Self::InvalidType | Self::ConstraintViolation
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::RequiredEmpty => "Required",
            Self::InvalidType => "Type",
            Self::ConstraintViolation => "Constraint",
            Self::MissingSheet => "Missing sheet",
            Self::MissingColumn => "Missing column",
        }
    }
}

/// One failed check, located by literal spreadsheet coordinates.
///
/// Sheet-level errors use row and column `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub sheet: String,
    /// 1-based row, counting the header row.
    pub row_index: u32,
    /// 1-based column.
    pub column_index: u32,
    pub field_name: String,
    pub reason: String,
    pub kind: ErrorKind,
}

impl ValidationError {
    pub fn required_empty(sheet: &str, cell: CellRef, field: &str) -> Self {
        Self::at_cell(
            sheet,
            cell,
            field,
            ErrorKind::RequiredEmpty,
            "required field empty".to_string(),
        )
    }

    pub fn invalid_type(sheet: &str, cell: CellRef, field: &str, expected: DataType) -> Self {
        Self::at_cell(
            sheet,
            cell,
            field,
            ErrorKind::InvalidType,
            format!("invalid type, expected {expected}"),
        )
    }

    pub fn constraint_violation(sheet: &str, cell: CellRef, field: &str, detail: &str) -> Self {
        Self::at_cell(
            sheet,
            cell,
            field,
            ErrorKind::ConstraintViolation,
            format!("value violates constraint: {detail}"),
        )
    }

    pub fn missing_sheet(sheet: &str, field: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            row_index: 0,
            column_index: 0,
            field_name: field.to_string(),
            reason: format!("sheet '{sheet}' not found in submitted workbook"),
            kind: ErrorKind::MissingSheet,
        }
    }

    pub fn missing_column(sheet: &str, field: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            row_index: 0,
            column_index: 0,
            field_name: field.to_string(),
            reason: format!("required column '{field}' not found in header row"),
            kind: ErrorKind::MissingColumn,
        }
    }

    fn at_cell(sheet: &str, cell: CellRef, field: &str, kind: ErrorKind, reason: String) -> Self {
        Self {
            sheet: sheet.to_string(),
            row_index: cell.row,
            column_index: cell.col,
            field_name: field.to_string(),
            reason,
            kind,
        }
    }

    /// Cell this error points at, or `None` for sheet-level errors.
    pub fn cell(&self) -> Option<CellRef> {
        if !self.kind.is_cell_level() || self.row_index == 0 || self.column_index == 0 {
            return None;
        }
        Some(CellRef::new(self.row_index, self.column_index))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell() {
            Some(cell) => write!(
                f,
                "{}!{} [{}]: {}",
                self.sheet, cell, self.field_name, self.reason
            ),
            None => write!(f, "{} [{}]: {}", self.sheet, self.field_name, self.reason),
        }
    }
}

/// Outcome of validating one submitted workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff `errors` is empty.
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Errors that reference a single cell.
    pub fn cell_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.cell().is_some())
    }

    /// Number of errors of a given kind.
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }
}
