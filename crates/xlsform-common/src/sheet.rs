//! Worksheet access with absolute coordinates.
//!
//! Calamine ranges start at the first non-empty cell, so a range's `(0, 0)`
//! is not necessarily `A1`. [`SheetGrid`] keeps the range origin and exposes
//! rows and columns by their 1-based spreadsheet position.

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx, XlsxError};
use xlsform_model::CaseInsensitiveSet;

use crate::value::{cell_text, is_blank};

static EMPTY: Data = Data::Empty;

/// Open an `.xlsx` workbook held in memory.
pub fn open_workbook(bytes: &[u8]) -> Result<Xlsx<Cursor<&[u8]>>, XlsxError> {
    Xlsx::new(Cursor::new(bytes))
}

/// Find a sheet by name, ignoring case and surrounding whitespace.
///
/// Returns the sheet name as stored in the workbook.
pub fn find_sheet<'a>(names: &'a [String], wanted: &str) -> Option<&'a str> {
    let wanted = wanted.trim();
    names
        .iter()
        .find(|name| name.trim().eq_ignore_ascii_case(wanted))
        .map(String::as_str)
}

/// Read one worksheet into a [`SheetGrid`].
pub fn read_sheet(
    workbook: &mut Xlsx<Cursor<&[u8]>>,
    name: &str,
) -> Result<SheetGrid, XlsxError> {
    let range = workbook.worksheet_range(name)?;
    Ok(SheetGrid::from_range(name, range))
}

/// The used range of a worksheet.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    name: String,
    range: Range<Data>,
    /// Absolute 1-based row of the range's first row.
    first_row: u32,
    /// Absolute 1-based column of the range's first column.
    first_col: u32,
}

/// The header row of a sheet: the first row with any non-blank cell.
#[derive(Debug, Clone)]
pub struct HeaderRow {
    /// Absolute 1-based row.
    pub row: u32,
    /// Header names keyed to their absolute 1-based column.
    pub columns: CaseInsensitiveSet,
    /// Non-blank header cells in column order.
    pub names: Vec<(u32, String)>,
}

impl HeaderRow {
    /// Absolute 1-based column of a header (case-insensitive).
    pub fn column(&self, name: &str) -> Option<u32> {
        self.columns
            .position(name)
            .and_then(|pos| u32::try_from(pos).ok())
    }
}

/// One row of a sheet with its absolute row number.
#[derive(Debug, Clone, Copy)]
pub struct GridRow<'a> {
    /// Absolute 1-based row.
    pub row: u32,
    cells: &'a [Data],
    first_col: u32,
}

impl<'a> GridRow<'a> {
    /// Cell at an absolute 1-based column; empty when outside the used range.
    pub fn get(&self, col: u32) -> &'a Data {
        col.checked_sub(self.first_col)
            .and_then(|idx| self.cells.get(idx as usize))
            .unwrap_or(&EMPTY)
    }

    /// Text rendering of the cell at an absolute column.
    pub fn text(&self, col: u32) -> String {
        cell_text(self.get(col))
    }

    /// Trimmed text, or `None` when blank.
    pub fn trimmed(&self, col: u32) -> Option<String> {
        let text = self.text(col);
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn is_blank_at(&self, col: u32) -> bool {
        is_blank(self.get(col))
    }

    /// True when every cell of the row is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(is_blank)
    }
}

impl SheetGrid {
    pub fn from_range(name: impl Into<String>, range: Range<Data>) -> Self {
        let (first_row, first_col) = range
            .start()
            .map_or((1, 1), |(row, col)| (row + 1, col + 1));
        Self {
            name: name.into(),
            range,
            first_row,
            first_col,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the sheet has no non-blank cell.
    pub fn is_empty(&self) -> bool {
        self.rows().all(|row| row.is_blank())
    }

    /// All rows of the used range, in order, including blank ones.
    pub fn rows(&self) -> impl Iterator<Item = GridRow<'_>> {
        let first_row = self.first_row;
        let first_col = self.first_col;
        self.range
            .rows()
            .enumerate()
            .map(move |(idx, cells)| GridRow {
                row: first_row + idx as u32,
                cells,
                first_col,
            })
    }

    /// The first row with any non-blank cell.
    pub fn header(&self) -> Option<HeaderRow> {
        let row = self.rows().find(|row| !row.is_blank())?;
        let mut columns = CaseInsensitiveSet::new();
        let mut names = Vec::new();
        for (idx, cell) in row.cells.iter().enumerate() {
            let text = cell_text(cell);
            let name = text.trim();
            if name.is_empty() {
                continue;
            }
            let col = self.first_col + idx as u32;
            columns.insert_at(name, col as usize);
            names.push((col, name.to_string()));
        }
        Some(HeaderRow {
            row: row.row,
            columns,
            names,
        })
    }

    /// Rows below the header, skipping rows that are entirely blank.
    pub fn data_rows(&self, header: &HeaderRow) -> impl Iterator<Item = GridRow<'_>> {
        let header_row = header.row;
        self.rows()
            .filter(move |row| row.row > header_row && !row.is_blank())
    }
}
