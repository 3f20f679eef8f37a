//! Shared types for XLSForm submission validation.
//!
//! This crate holds the value types exchanged between the schema parser, the
//! validation engine and the annotator:
//!
//! - **Rules** (`rule`): [`FieldRule`], [`Constraint`], [`RuleSet`]
//! - **Expressions** (`expr`): parsed XLSForm constraint expressions
//! - **Results** (`result`): [`ValidationError`], [`ValidationResult`]
//! - **Cells** (`cell`): 1-based cell coordinates and A1 references
//! - **Lookup** (`lookup`): case-insensitive header matching
//!
//! Nothing here performs I/O; every type is plain data and `Send + Sync`.

pub mod cell;
pub mod data_type;
pub mod expr;
pub mod lookup;
pub mod result;
pub mod rule;

pub use cell::{CellRef, column_letters, parse_column_letters};
pub use data_type::DataType;
pub use expr::{CompareOp, Expr, Literal, Operand, Pattern};
pub use lookup::{CaseInsensitiveSet, normalize_header};
pub use result::{ErrorKind, ValidationError, ValidationResult};
pub use rule::{Choice, Constraint, FieldRule, RuleSet, SheetRules, SheetTarget};
