//! Error types for submission validation.

use thiserror::Error;

/// Structural failures that stop validation.
///
/// Content problems never produce these; they are reported as
/// [`ValidationError`](xlsform_model::ValidationError)s instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidateError {
    /// Input is not a readable xlsx workbook.
    #[error("submission is not a readable xlsx workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    /// Workbook contains no worksheets.
    #[error("submission workbook contains no worksheets")]
    NoWorksheets,

    /// A sheet the rules expect has a header but no data rows.
    #[error("sheet '{sheet}' has no data rows")]
    NoDataRows { sheet: String },
}

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidateError>;
