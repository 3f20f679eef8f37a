//! End-to-end validation: generated schema and submission workbooks.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use xlsform_model::{ErrorKind, RuleSet};
use xlsform_validate::{ValidateError, ValidateOptions, validate, validate_with};

/// A cell written into a fixture sheet.
#[derive(Clone, Copy)]
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Date(u16, u8, u8),
    Blank,
}

use Cell::{Blank, Number, Text};

struct SheetSpec<'a> {
    name: &'a str,
    /// 0-based offset of the first written cell.
    origin: (u32, u16),
    rows: Vec<Vec<Cell<'a>>>,
}

fn sheet<'a>(name: &'a str, rows: Vec<Vec<Cell<'a>>>) -> SheetSpec<'a> {
    SheetSpec {
        name,
        origin: (0, 0),
        rows,
    }
}

fn build(sheets: &[SheetSpec<'_>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    for layout in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(layout.name).unwrap();
        for (r, row) in layout.rows.iter().enumerate() {
            let r = layout.origin.0 + r as u32;
            for (c, cell) in row.iter().enumerate() {
                let c = layout.origin.1 + c as u16;
                match *cell {
                    Text(s) if !s.is_empty() => {
                        worksheet.write_string(r, c, s).unwrap();
                    }
                    Number(n) => {
                        worksheet.write_number(r, c, n).unwrap();
                    }
                    Cell::Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(y, m, d).unwrap();
                        worksheet
                            .write_datetime_with_format(r, c, &date, &date_format)
                            .unwrap();
                    }
                    Text(_) | Blank => {}
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

fn text_rows<'a>(rows: &[&[&'a str]]) -> Vec<Vec<Cell<'a>>> {
    rows.iter()
        .map(|row| row.iter().map(|s| Text(*s)).collect())
        .collect()
}

fn case_rules() -> RuleSet {
    let schema = build(&[
        sheet(
            "survey",
            text_rows(&[
                &["type", "name", "required", "constraint", "constraint_message"],
                &["text", "case_id", "yes", "", ""],
                &["integer", "age", "yes", ". >= 0 and . <= 120", ""],
                &["select_one sex", "sex", "no", "", ""],
                &["date", "onset", "no", ". <= today()", "onset cannot be in the future"],
                &["select_multiple symptoms", "symptoms", "no", "", ""],
                &["decimal", "weight", "no", ". > 0", ""],
            ]),
        ),
        sheet(
            "choices",
            text_rows(&[
                &["list_name", "name", "label"],
                &["sex", "m", "Male"],
                &["sex", "f", "Female"],
                &["symptoms", "fever", "Fever"],
                &["symptoms", "rash", "Rash"],
            ]),
        ),
    ]);
    xlsform_schema::parse(&schema).unwrap()
}

fn options() -> ValidateOptions {
    ValidateOptions::new().with_today(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
}

fn header<'a>() -> Vec<Cell<'a>> {
    ["case_id", "age", "sex", "onset", "symptoms", "weight"]
        .into_iter()
        .map(Text)
        .collect()
}

#[test]
fn valid_submission_has_no_errors() {
    let data = build(&[sheet(
        "Cases",
        vec![
            header(),
            vec![
                Text("C-1"),
                Number(45.0),
                Text("f"),
                Cell::Date(2024, 5, 1),
                Text("fever rash"),
                Number(61.5),
            ],
            vec![
                Text("C-2"),
                Text("7"),
                Text("Male"),
                Text("2024-06-01"),
                Text("Fever"),
                Blank,
            ],
            vec![Text("C-3"), Number(0.0), Blank, Blank, Blank, Blank],
        ],
    )]);
    let result = validate_with(&case_rules(), &data, &options()).unwrap();
    assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
    assert!(result.errors.is_empty());
}

#[test]
fn age_scenario_reports_one_error_per_bad_cell() {
    let data = build(&[sheet(
        "Cases",
        vec![
            header(),
            vec![Text("C-1"), Text("abc")],
            vec![Text("C-2"), Number(150.0)],
            vec![Text("C-3"), Blank, Text("f")],
            vec![Text("C-4"), Number(45.0)],
        ],
    )]);
    let result = validate_with(&case_rules(), &data, &options()).unwrap();
    assert!(!result.is_valid);

    let summary: Vec<_> = result.errors.iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(summary.join("\n"), @r"
    Cases!B2 [age]: invalid type, expected integer
    Cases!B3 [age]: value violates constraint: outside range . >= 0 and . <= 120
    Cases!B4 [age]: required field empty
    ");
}

#[test]
fn single_blank_required_field_points_at_its_row() {
    let data = build(&[sheet(
        "Cases",
        vec![
            header(),
            vec![Text("C-1"), Number(30.0)],
            vec![Text("C-2"), Number(31.0)],
            vec![Blank, Number(32.0), Text("m")],
        ],
    )]);
    let result = validate_with(&case_rules(), &data, &options()).unwrap();
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.kind, ErrorKind::RequiredEmpty);
    assert_eq!((error.row_index, error.column_index), (4, 1));
    assert_eq!(error.field_name, "case_id");
    assert_eq!(error.reason, "required field empty");
}

#[test]
fn constraint_details_use_messages_and_list_names() {
    let data = build(&[sheet(
        "Cases",
        vec![
            header(),
            vec![
                Text("C-1"),
                Number(30.0),
                Text("x"),
                Text("2025-01-01"),
                Text("fever cough"),
                Number(-1.0),
            ],
        ],
    )]);
    let result = validate_with(&case_rules(), &data, &options()).unwrap();
    let reasons: Vec<_> = result.errors.iter().map(|e| e.reason.as_str()).collect();
    assert_eq!(
        reasons,
        [
            "value violates constraint: not in list 'sex'",
            "value violates constraint: onset cannot be in the future",
            "value violates constraint: not in list 'symptoms'",
            "value violates constraint: outside range . > 0",
        ]
    );
    assert!(
        result
            .errors
            .iter()
            .all(|e| e.kind == ErrorKind::ConstraintViolation)
    );
}

#[test]
fn coordinates_include_leading_offsets_and_ignore_column_order() {
    let data = build(&[SheetSpec {
        name: "Cases",
        origin: (2, 1),
        rows: vec![
            vec![Text("notes"), Text("age"), Text("case_id")],
            vec![Text("first"), Text("old"), Text("C-1")],
            vec![Blank, Blank, Blank],
            vec![Text("third"), Number(12.0), Blank],
        ],
    }]);
    let result = validate_with(&case_rules(), &data, &options()).unwrap();
    let located: Vec<_> = result
        .errors
        .iter()
        .map(|e| (e.kind, e.row_index, e.column_index))
        .collect();
    assert_eq!(
        located,
        [
            (ErrorKind::InvalidType, 4, 3),
            (ErrorKind::RequiredEmpty, 6, 4),
        ]
    );
}

#[test]
fn missing_sheets_and_columns_are_sheet_level_errors() {
    let schema = build(&[sheet(
        "survey",
        text_rows(&[
            &["type", "name", "required", "sheet"],
            &["text", "site", "yes", ""],
            &["text", "district", "no", ""],
            &["text", "phone", "yes", "Contacts"],
        ]),
    )]);
    let rules = xlsform_schema::parse(&schema).unwrap();
    let data = build(&[sheet("Sites", text_rows(&[&["other"], &["x"]]))]);

    let result = validate(&rules, &data).unwrap();
    let kinds: Vec<_> = result.errors.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [ErrorKind::MissingColumn, ErrorKind::MissingSheet]);
    assert!(result.errors.iter().all(|e| e.cell().is_none()));
    assert_eq!(result.errors[0].field_name, "site");
    assert_eq!(result.errors[1].sheet, "Contacts");
    assert_eq!(result.cell_errors().count(), 0);
}

#[test]
fn structural_failures() {
    let rules = case_rules();

    let header_only = build(&[sheet("Cases", vec![header(), vec![Blank, Blank]])]);
    let err = validate(&rules, &header_only).unwrap_err();
    assert!(matches!(err, ValidateError::NoDataRows { ref sheet } if sheet == "Cases"));

    let err = validate(&rules, b"PK not really a zip").unwrap_err();
    assert!(matches!(err, ValidateError::Workbook(_)));
}

#[test]
fn validation_is_idempotent() {
    let data = build(&[sheet(
        "Cases",
        vec![
            header(),
            vec![Text("C-1"), Text("abc"), Text("?")],
            vec![Blank, Number(500.0)],
        ],
    )]);
    let rules = case_rules();
    let first = validate_with(&rules, &data, &options()).unwrap();
    let second = validate_with(&rules, &data, &options()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.error_count(), 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Each cell yields at most one error, chosen by the first failing check.
    #[test]
    fn checks_short_circuit(value in prop_oneof![
        "[0-9]{1,4}",
        "-[0-9]{1,3}",
        "[a-z]{1,5}",
        " {0,2}",
        "[0-9]{1,3}\\.[05]",
    ]) {
        let rules = case_rules();
        let data = build(&[sheet(
            "Cases",
            vec![header(), vec![Text("C-1"), Text(&value)], vec![Text("C-2"), Number(1.0)]],
        )]);
        let result = validate_with(&rules, &data, &options()).unwrap();
        let age_errors: Vec<_> = result.errors.iter().filter(|e| e.field_name == "age").collect();
        prop_assert!(age_errors.len() <= 1);

        let trimmed = value.trim();
        let expected = if trimmed.is_empty() {
            Some(ErrorKind::RequiredEmpty)
        } else if let Some(n) = integer_value(trimmed) {
            (!(0..=120).contains(&n)).then_some(ErrorKind::ConstraintViolation)
        } else {
            Some(ErrorKind::InvalidType)
        };
        prop_assert_eq!(age_errors.first().map(|e| e.kind), expected);
    }
}

fn integer_value(text: &str) -> Option<i64> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(n);
    }
    text.strip_suffix(".0").and_then(|whole| whole.parse().ok())
}
