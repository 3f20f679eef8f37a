//! Field data types recognised in the survey sheet.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared data type of a survey field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Text,
    Integer,
    Decimal,
    Date,
    SelectOne,
    SelectMultiple,
}

impl DataType {
    /// Parse the leading type keyword of a survey `type` cell.
    ///
    /// Select types are returned without their list name; splitting the list
    /// name off is the parser's job.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "string" => Some(Self::Text),
            "integer" | "int" => Some(Self::Integer),
            "decimal" => Some(Self::Decimal),
            "date" => Some(Self::Date),
            "select_one" => Some(Self::SelectOne),
            "select_multiple" => Some(Self::SelectMultiple),
            _ => None,
        }
    }

    /// Keyword as written in an XLSForm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::SelectOne => "select_one",
            Self::SelectMultiple => "select_multiple",
        }
    }

    /// True for types whose values come from a choice list.
    pub fn is_select(&self) -> bool {
        matches!(self, Self::SelectOne | Self::SelectMultiple)
    }

    /// True for types that can be compared numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
