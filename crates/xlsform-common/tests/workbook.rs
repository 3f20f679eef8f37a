//! Reads workbooks written by rust_xlsxwriter.

use calamine::Reader;
use rust_xlsxwriter::Workbook;
use xlsform_common::{find_sheet, open_workbook, read_sheet};

fn offset_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Cases").unwrap();
    // Header on row 2, starting in column B.
    sheet.write_string(1, 1, "case_id").unwrap();
    sheet.write_string(1, 2, "Age").unwrap();
    sheet.write_string(2, 1, "C-1").unwrap();
    sheet.write_number(2, 2, 41.0).unwrap();
    sheet.write_string(4, 1, "C-2").unwrap();
    sheet.write_number(4, 2, 2.5).unwrap();
    workbook.save_to_buffer().unwrap()
}

#[test]
fn reads_sheet_with_absolute_coordinates() {
    let bytes = offset_workbook();
    let mut workbook = open_workbook(&bytes).unwrap();
    let names = workbook.sheet_names();
    let name = find_sheet(&names, "cases").unwrap().to_string();

    let grid = read_sheet(&mut workbook, &name).unwrap();
    let header = grid.header().unwrap();
    assert_eq!(header.row, 2);
    assert_eq!(header.column("age"), Some(3));

    let rows: Vec<_> = grid.data_rows(&header).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].row, 3);
    assert_eq!(rows[0].text(3), "41");
    assert_eq!(rows[1].row, 5);
    assert_eq!(rows[1].text(3), "2.5");
    assert_eq!(rows[1].trimmed(2).as_deref(), Some("C-2"));
}

#[test]
fn rejects_bytes_that_are_not_a_workbook() {
    assert!(open_workbook(b"not a zip archive").is_err());
}
