//! Error types for workbook annotation.

use thiserror::Error;
use xlsform_model::CellRef;

/// Errors that prevent producing an annotated workbook.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnnotateError {
    // === Package Errors ===
    /// Input cannot be read or written as a zip package.
    #[error("cannot process xlsx package: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A package part is not well-formed XML.
    #[error("cannot process workbook XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Reading or writing a package part failed.
    #[error("I/O error while annotating: {0}")]
    Io(#[from] std::io::Error),

    /// A required package part is absent.
    #[error("workbook package has no '{part}' part")]
    MissingPart { part: String },

    /// A package part is well-formed XML but not a valid SpreadsheetML part.
    #[error("malformed '{part}' part: {reason}")]
    MalformedPart { part: String, reason: String },

    // === Error List Errors ===
    /// An error names a sheet that is not in the workbook.
    #[error("sheet '{sheet}' not found in workbook")]
    UnknownSheet { sheet: String },

    /// An error points outside the sheet's used range.
    #[error("cell {cell} is outside the used range of sheet '{sheet}'")]
    OutOfBounds { sheet: String, cell: CellRef },

    /// A flagged cell uses a style index the stylesheet does not define.
    #[error("cell style {style} is not defined in the stylesheet")]
    MissingCellFormat { style: u32 },

    // === Option Errors ===
    /// Highlight colour is not a hex RGB or ARGB value.
    #[error("invalid highlight colour '{value}': expected RRGGBB or AARRGGBB hex")]
    InvalidColor { value: String },
}

impl AnnotateError {
    /// True when the error list itself is inconsistent with the workbook,
    /// rather than the workbook being unreadable.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UnknownSheet { .. } | Self::OutOfBounds { .. })
    }
}

/// Result type for annotation operations.
pub type Result<T> = std::result::Result<T, AnnotateError>;
