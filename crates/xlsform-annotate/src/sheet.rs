//! Worksheet part scanning and cell style rewriting.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use xlsform_model::CellRef;

use crate::error::{AnnotateError, Result};
use crate::xml::{attr_value, into_string, prefix_of, with_attrs, writer};

/// Bounds of a worksheet and the styles of the cells to be flagged.
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetScan {
    pub max_row: u32,
    pub max_col: u32,
    styles: HashMap<CellRef, u32>,
}

impl SheetScan {
    pub fn contains(&self, cell: CellRef) -> bool {
        cell.row <= self.max_row && cell.col <= self.max_col
    }

    /// Original style index of a cell; cells absent from the part use `0`.
    pub fn style_of(&self, cell: CellRef) -> u32 {
        self.styles.get(&cell).copied().unwrap_or(0)
    }
}

/// Row and column numbers while streaming `<sheetData>`.
///
/// `r` attributes are optional in SpreadsheetML; when absent the position
/// follows the previous row or cell.
#[derive(Debug, Default)]
struct Position {
    row: u32,
    col: u32,
}

impl Position {
    fn enter_row(&mut self, element: &BytesStart<'_>, part: &str) -> Result<u32> {
        self.row = match attr_value(element, b"r")? {
            Some(r) => r
                .trim()
                .parse()
                .map_err(|_| malformed(part, format!("invalid row number '{r}'")))?,
            None => self.row + 1,
        };
        self.col = 0;
        Ok(self.row)
    }

    fn enter_cell(&mut self, element: &BytesStart<'_>, part: &str) -> Result<CellRef> {
        self.col = match attr_value(element, b"r")? {
            Some(r) => {
                CellRef::parse_a1(&r)
                    .ok_or_else(|| malformed(part, format!("invalid cell reference '{r}'")))?
                    .col
            }
            None => self.col + 1,
        };
        Ok(CellRef::new(self.row, self.col))
    }
}

fn malformed(part: &str, reason: String) -> AnnotateError {
    AnnotateError::MalformedPart {
        part: part.to_string(),
        reason,
    }
}

/// Measure the used range and record the style of each `targets` cell.
pub(crate) fn scan(xml: &str, part: &str, targets: &BTreeSet<CellRef>) -> Result<SheetScan> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut scan = SheetScan::default();
    let mut position = Position::default();
    let mut in_sheet_data = false;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"dimension" => {
                    let last = attr_value(e, b"ref")?
                        .and_then(|r| r.rsplit(':').next().and_then(CellRef::parse_a1));
                    if let Some(cell) = last {
                        scan.max_row = scan.max_row.max(cell.row);
                        scan.max_col = scan.max_col.max(cell.col);
                    }
                }
                b"sheetData" => in_sheet_data = matches!(event, Event::Start(_)),
                b"row" if in_sheet_data => {
                    let row = position.enter_row(e, part)?;
                    scan.max_row = scan.max_row.max(row);
                }
                b"c" if in_sheet_data => {
                    let cell = position.enter_cell(e, part)?;
                    scan.max_row = scan.max_row.max(cell.row);
                    scan.max_col = scan.max_col.max(cell.col);
                    if targets.contains(&cell) {
                        let style = match attr_value(e, b"s")? {
                            Some(s) => s.trim().parse().map_err(|_| {
                                malformed(part, format!("invalid style index '{s}' on {cell}"))
                            })?,
                            None => 0,
                        };
                        scan.styles.insert(cell, style);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = false,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(scan)
}

/// Rewrite a worksheet so each cell in `flagged` uses the mapped style.
///
/// Existing cells only have their `s` attribute changed. Flagged cells with
/// no element are inserted as empty styled cells, keeping rows and cells in
/// ascending order.
pub(crate) fn rewrite(xml: &str, part: &str, flagged: &BTreeMap<CellRef, u32>) -> Result<String> {
    let mut pending: BTreeMap<u32, BTreeMap<u32, u32>> = BTreeMap::new();
    for (cell, &style) in flagged {
        pending.entry(cell.row).or_default().insert(cell.col, style);
    }

    let mut reader = Reader::from_str(xml);
    let mut out = writer();
    let mut position = Position::default();
    let mut in_sheet_data = false;
    let mut prefix = String::new();
    // Flagged cells of the current row not yet written.
    let mut row_cells: BTreeMap<u32, u32> = BTreeMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                in_sheet_data = true;
                prefix = prefix_of(e.name().as_ref());
                out.write_event(Event::Start(e))?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = prefix_of(e.name().as_ref());
                if pending.is_empty() {
                    out.write_event(Event::Empty(e))?;
                } else {
                    out.write_event(Event::Start(e.clone()))?;
                    write_rows(&mut out, &prefix, std::mem::take(&mut pending))?;
                    out.write_event(Event::End(e.to_end()))?;
                }
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"sheetData" => {
                write_rows(&mut out, &prefix, std::mem::take(&mut pending))?;
                in_sheet_data = false;
                out.write_event(Event::End(e))?;
            }
            Event::Start(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = position.enter_row(&e, part)?;
                write_rows(&mut out, &prefix, split_before(&mut pending, row))?;
                row_cells = pending.remove(&row).unwrap_or_default();
                out.write_event(Event::Start(e))?;
            }
            Event::Empty(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = position.enter_row(&e, part)?;
                write_rows(&mut out, &prefix, split_before(&mut pending, row))?;
                match pending.remove(&row) {
                    Some(cells) => {
                        out.write_event(Event::Start(e.clone()))?;
                        write_cells(&mut out, &prefix, row, cells)?;
                        out.write_event(Event::End(e.to_end()))?;
                    }
                    None => out.write_event(Event::Empty(e))?,
                }
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = position.row;
                write_cells(&mut out, &prefix, row, std::mem::take(&mut row_cells))?;
                out.write_event(Event::End(e))?;
            }
            Event::Start(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                let cell = position.enter_cell(&e, part)?;
                write_cells(&mut out, &prefix, cell.row, split_before(&mut row_cells, cell.col))?;
                let start = match row_cells.remove(&cell.col) {
                    Some(style) => with_attrs(&e, &[("s", style.to_string().as_str())])?,
                    None => e.into_owned(),
                };
                out.write_event(Event::Start(start))?;
            }
            Event::Empty(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                let cell = position.enter_cell(&e, part)?;
                write_cells(&mut out, &prefix, cell.row, split_before(&mut row_cells, cell.col))?;
                let empty = match row_cells.remove(&cell.col) {
                    Some(style) => with_attrs(&e, &[("s", style.to_string().as_str())])?,
                    None => e.into_owned(),
                };
                out.write_event(Event::Empty(empty))?;
            }
            Event::Eof => break,
            event => out.write_event(event)?,
        }
    }
    Ok(into_string(out))
}

/// Remove and return the entries keyed below `key`.
fn split_before<V>(map: &mut BTreeMap<u32, V>, key: u32) -> BTreeMap<u32, V> {
    let rest = map.split_off(&key);
    std::mem::replace(map, rest)
}

fn write_rows(
    out: &mut Writer<Vec<u8>>,
    prefix: &str,
    rows: BTreeMap<u32, BTreeMap<u32, u32>>,
) -> Result<()> {
    for (row, cells) in rows {
        let mut start = BytesStart::new(format!("{prefix}row"));
        start.push_attribute(("r", row.to_string().as_str()));
        out.write_event(Event::Start(start))?;
        write_cells(out, prefix, row, cells)?;
        out.write_event(Event::End(BytesEnd::new(format!("{prefix}row"))))?;
    }
    Ok(())
}

fn write_cells(
    out: &mut Writer<Vec<u8>>,
    prefix: &str,
    row: u32,
    cells: BTreeMap<u32, u32>,
) -> Result<()> {
    for (col, style) in cells {
        let mut cell = BytesStart::new(format!("{prefix}c"));
        cell.push_attribute(("r", CellRef::new(row, col).to_a1().as_str()));
        cell.push_attribute(("s", style.to_string().as_str()));
        out.write_event(Event::Empty(cell))?;
    }
    Ok(())
}
