//! Shared workbook reading utilities.
//!
//! Both the schema parser and the validation engine read `.xlsx` workbooks
//! from memory; this crate holds the pieces they share:
//!
//! - [`open_workbook`]: open a workbook from a byte slice
//! - [`SheetGrid`]: a worksheet's used range with absolute 1-based coordinates
//! - [`cell_text`] and friends: rendering calamine cell values as text

mod sheet;
mod value;

pub use sheet::{GridRow, HeaderRow, SheetGrid, find_sheet, open_workbook, read_sheet};
pub use value::{cell_datetime, cell_text, format_numeric, is_blank};
