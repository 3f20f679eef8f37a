//! Highlighting of invalid cells in a submitted xlsx workbook.
//!
//! [`annotate`] takes the original workbook bytes and the errors produced by
//! validation, and returns a copy in which every referenced cell carries a
//! solid fill. The package is edited in place rather than regenerated:
//!
//! - `xl/styles.xml` gains one fill and a highlighted copy of each cell
//!   format a flagged cell used
//! - worksheets with flagged cells have only those cells' `s` attribute
//!   changed (blank cells with no element are inserted)
//! - every other package entry is copied byte for byte
//!
//! Values, formulas, shared strings and all other formatting are preserved.
//! Sheet-level errors (missing sheet or column) reference no cell and are
//! skipped.

mod error;
mod options;
mod package;
mod sheet;
mod styles;
mod workbook;
mod xml;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, debug_span};
use xlsform_model::{CellRef, ValidationError};

pub use error::{AnnotateError, Result};
pub use options::{AnnotateOptions, DEFAULT_FILL_RGB};

use options::normalize_color;
use package::Package;
use workbook::{STYLES_PART, SheetParts, WORKBOOK_PART, WORKBOOK_RELS_PART};

/// Highlight every cell referenced by `errors` with the default fill.
pub fn annotate(original: &[u8], errors: &[ValidationError]) -> Result<Vec<u8>> {
    annotate_with(original, errors, &AnnotateOptions::default())
}

/// Highlight every cell referenced by `errors` using the given options.
///
/// Returns the original bytes unchanged when no error references a cell.
pub fn annotate_with(
    original: &[u8],
    errors: &[ValidationError],
    options: &AnnotateOptions,
) -> Result<Vec<u8>> {
    let span = debug_span!("annotate", bytes = original.len(), errors = errors.len());
    let _guard = span.enter();

    let fill_rgb = normalize_color(&options.fill_rgb)?;

    let mut by_sheet: BTreeMap<&str, BTreeSet<CellRef>> = BTreeMap::new();
    for error in errors {
        if let Some(cell) = error.cell() {
            by_sheet.entry(error.sheet.as_str()).or_default().insert(cell);
        }
    }
    if by_sheet.is_empty() {
        debug!("no cell-level errors, workbook left unchanged");
        return Ok(original.to_vec());
    }

    let mut package = Package::open(original)?;
    let workbook_xml = package.read_part(WORKBOOK_PART)?;
    let rels_xml = package.read_part(WORKBOOK_RELS_PART)?;
    let parts = SheetParts::parse(&workbook_xml, &rels_xml)?;

    // Sheet names are matched leniently, so two spellings can share a part.
    let mut by_part: BTreeMap<String, (&str, BTreeSet<CellRef>)> = BTreeMap::new();
    for (sheet, cells) in by_sheet {
        let part = parts
            .part_for(sheet)
            .ok_or_else(|| AnnotateError::UnknownSheet {
                sheet: sheet.to_string(),
            })?;
        by_part
            .entry(part.to_string())
            .or_insert_with(|| (sheet, BTreeSet::new()))
            .1
            .extend(cells);
    }

    let mut sheets = Vec::with_capacity(by_part.len());
    let mut used_styles = BTreeSet::new();
    for (part, (sheet, cells)) in by_part {
        let xml = package.read_part(&part)?;
        let scan = sheet::scan(&xml, &part, &cells)?;
        if let Some(&cell) = cells.iter().find(|&&cell| !scan.contains(cell)) {
            return Err(AnnotateError::OutOfBounds {
                sheet: sheet.to_string(),
                cell,
            });
        }
        used_styles.extend(cells.iter().map(|&cell| scan.style_of(cell)));
        sheets.push((part, xml, cells, scan));
    }

    let styles_xml = package.read_part(STYLES_PART)?;
    let highlight = styles::add_highlight(&styles_xml, &used_styles, &fill_rgb)?;

    let mut replacements = HashMap::with_capacity(sheets.len() + 1);
    let mut flagged_total = 0;
    for (part, xml, cells, scan) in sheets {
        let flagged: BTreeMap<CellRef, u32> = cells
            .iter()
            .map(|&cell| (cell, highlight.style_for(scan.style_of(cell))))
            .collect();
        flagged_total += flagged.len();
        let rewritten = sheet::rewrite(&xml, &part, &flagged)?;
        replacements.insert(part, rewritten);
    }
    replacements.insert(STYLES_PART.to_string(), highlight.xml);

    let output = package.rebuild(&replacements)?;
    debug!(
        cells = flagged_total,
        parts = replacements.len(),
        "annotated workbook"
    );
    Ok(output)
}
