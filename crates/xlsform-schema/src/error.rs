//! Error types for schema parsing.

use thiserror::Error;

/// Errors that abort schema parsing.
///
/// Row numbers are 1-based rows of the survey sheet.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    // === Workbook Errors ===
    /// Input is not a readable xlsx workbook.
    #[error("schema is not a readable xlsx workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    /// Required sheet not found.
    #[error("schema workbook has no '{sheet}' sheet")]
    MissingSheet { sheet: &'static str },

    /// Mandatory column missing from a sheet's header row.
    #[error("'{sheet}' sheet has no '{header}' column")]
    MissingHeader {
        sheet: &'static str,
        header: &'static str,
    },

    // === Survey Row Errors ===
    /// Named row without a type.
    #[error("survey row {row}: field '{name}' has no type")]
    MissingType { row: u32, name: String },

    /// Type token not recognised.
    #[error("survey row {row}: unknown type '{token}'")]
    UnknownType { row: u32, token: String },

    /// Select type without a choice list name.
    #[error("survey row {row}: type '{token}' needs a choice list name")]
    MissingListName { row: u32, token: String },

    /// Field row without a name.
    #[error("survey row {row}: field of type '{token}' has no name")]
    MissingName { row: u32, token: String },

    /// `required` column holds something other than yes/no.
    #[error("survey row {row}: invalid required value '{value}' for field '{field}'")]
    InvalidRequired {
        row: u32,
        field: String,
        value: String,
    },

    /// Constraint expression could not be parsed.
    #[error("survey row {row}: cannot parse constraint '{expression}' for field '{field}': {reason}")]
    InvalidConstraint {
        row: u32,
        field: String,
        expression: String,
        reason: String,
    },

    /// Select field references a list absent from the choices sheet.
    #[error("survey row {row}: field '{field}' references unknown choice list '{list}'")]
    UnknownChoiceList {
        row: u32,
        field: String,
        list: String,
    },

    /// `end group` without a matching `begin group`.
    #[error("survey row {row}: '{token}' without a matching begin")]
    UnbalancedGroup { row: u32, token: String },

    // === Content Errors ===
    /// Parsing succeeded but produced no field rules.
    #[error("schema defines no fields")]
    EmptySchema,
}

impl SchemaError {
    /// True when the schema is malformed, as opposed to well-formed but empty.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::EmptySchema)
    }

    /// Survey row the error refers to, if any.
    pub fn row(&self) -> Option<u32> {
        match self {
            Self::MissingType { row, .. }
            | Self::UnknownType { row, .. }
            | Self::MissingListName { row, .. }
            | Self::MissingName { row, .. }
            | Self::InvalidRequired { row, .. }
            | Self::InvalidConstraint { row, .. }
            | Self::UnknownChoiceList { row, .. }
            | Self::UnbalancedGroup { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// Result type for schema parsing.
pub type Result<T> = std::result::Result<T, SchemaError>;
