//! Validation runs against workbooks written to a temporary directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{Reader, Xlsx};
use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;
use xlsform_annotate::AnnotateOptions;
use xlsform_cli::pipeline::{
    RunOptions, check_inputs, load_schema, result_path, run_validation, run_validation_with,
};
use xlsform_cli::report::{ReportTargets, write_csv_report, write_json_report, write_reports};
use xlsform_model::ErrorKind;
use xlsform_validate::ValidateOptions;

fn write_workbook(path: &Path, sheets: &[(&str, &[&[&str]])]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let written = match value.parse::<f64>() {
                    Ok(number) => worksheet.write_number(r as u32, c as u16, number),
                    Err(_) => worksheet.write_string(r as u32, c as u16, *value),
                };
                written.unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

struct Fixture {
    dir: TempDir,
    schema: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let schema = dir.path().join("validation.xlsx");
        write_workbook(
            &schema,
            &[
                (
                    "survey",
                    &[
                        &["type", "name", "required", "constraint"],
                        &["text", "case_id", "yes", ""],
                        &["integer", "age", "yes", ". >= 0 and . <= 120"],
                        &["select_one outcome", "outcome", "no", ""],
                    ],
                ),
                (
                    "choices",
                    &[
                        &["list_name", "name", "label"],
                        &["outcome", "recovered", "Recovered"],
                        &["outcome", "died", "Died"],
                    ],
                ),
            ],
        );
        Self { dir, schema }
    }

    fn data(&self, name: &str, rows: &[&[&str]]) -> PathBuf {
        let path = self.dir.path().join(name);
        write_workbook(&path, &[("Cases", rows)]);
        path
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            validate: ValidateOptions::new()
                .with_today(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
            ..RunOptions::default()
        }
    }
}

const HEADER: &[&str] = &["case_id", "age", "outcome"];

#[test]
fn valid_submission_writes_no_result_file() {
    let fixture = Fixture::new();
    let data = fixture.data(
        "cases.xlsx",
        &[HEADER, &["C-1", "45", "recovered"], &["C-2", "3", ""]],
    );
    let outcome = run_validation(&fixture.schema, &data, &fixture.options()).unwrap();
    assert!(outcome.is_valid());
    assert_eq!(outcome.field_count, 3);
    assert!(outcome.annotated.is_none());
    assert!(!fixture.dir.path().join("results").exists());
}

#[test]
fn invalid_submission_is_highlighted_and_saved() {
    let fixture = Fixture::new();
    let data = fixture.data(
        "cases.xlsx",
        &[
            HEADER,
            &["C-1", "abc", "recovered"],
            &["C-2", "150", "unknown"],
            &["C-3", "", "died"],
        ],
    );
    let outcome = run_validation(&fixture.schema, &data, &fixture.options()).unwrap();

    assert!(!outcome.is_valid());
    assert_eq!(outcome.result.count_of(ErrorKind::InvalidType), 1);
    assert_eq!(outcome.result.count_of(ErrorKind::ConstraintViolation), 2);
    assert_eq!(outcome.result.count_of(ErrorKind::RequiredEmpty), 1);
    assert!(outcome.annotation_error.is_none());

    let saved = outcome.annotated.clone().unwrap();
    assert_eq!(saved, fixture.dir.path().join("results").join("cases_result.xlsx"));
    let bytes = fs::read(&saved).unwrap();
    let mut workbook = Xlsx::new(Cursor::new(bytes)).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Cases".to_string()]);
    let range = workbook.worksheet_range("Cases").unwrap();
    assert_eq!(range.get_size(), (4, 3));
}

#[test]
fn results_dir_and_colour_are_honoured() {
    let fixture = Fixture::new();
    let data = fixture.data("batch 7.xlsx", &[HEADER, &["", "12", ""]]);
    let results = fixture.dir.path().join("out").join("nested");
    let options = RunOptions {
        results_dir: Some(results.clone()),
        annotate: AnnotateOptions::new().with_fill_rgb("FFEB9C").unwrap(),
        ..fixture.options()
    };
    let outcome = run_validation(&fixture.schema, &data, &options).unwrap();
    assert_eq!(outcome.annotated, Some(results.join("batch 7_result.xlsx")));
    assert!(results.join("batch 7_result.xlsx").is_file());
}

#[test]
fn missing_columns_are_reported_without_highlighting_failure() {
    let fixture = Fixture::new();
    let data = fixture.dir.path().join("other.xlsx");
    write_workbook(&data, &[("Visits", &[&["visit"], &["1"]])]);
    let outcome = run_validation(&fixture.schema, &data, &fixture.options()).unwrap();
    assert!(!outcome.is_valid());
    // case_id and age are required; outcome is optional.
    assert_eq!(outcome.result.count_of(ErrorKind::MissingColumn), 2);
    assert_eq!(outcome.result.error_count(), 2);
    // Nothing to highlight; the copy is still saved unchanged.
    assert!(outcome.annotation_error.is_none());
    assert!(outcome.annotated.is_some());
}

#[test]
fn inputs_are_checked_before_validation() {
    let fixture = Fixture::new();
    let missing = fixture.dir.path().join("missing.xlsx");
    let err = check_inputs(&fixture.schema, &missing).unwrap_err();
    assert!(err.to_string().contains("data file not found"), "{err}");

    let err = check_inputs(&missing, &fixture.schema).unwrap_err();
    assert!(err.to_string().contains("XLSForm schema file not found"), "{err}");

    let csv = fixture.dir.path().join("cases.csv");
    fs::write(&csv, "case_id,age\nC-1,4\n").unwrap();
    let err = run_validation(&fixture.schema, &csv, &fixture.options()).unwrap_err();
    assert!(err.to_string().contains("(.xlsx), found: cases.csv"), "{err}");
    assert!(!fixture.dir.path().join("results").exists());
}

#[test]
fn unparseable_schema_stops_the_run() {
    let fixture = Fixture::new();
    let bad_schema = fixture.dir.path().join("bad.xlsx");
    write_workbook(
        &bad_schema,
        &[("survey", &[&["type", "name"], &["geopoint", "gps"]])],
    );
    let data = fixture.data("cases.xlsx", &[HEADER, &["C-1", "4", ""]]);

    let err = run_validation(&bad_schema, &data, &fixture.options()).unwrap_err();
    let message = format!("{err:#}");
    assert!(
        message.contains("schema could not be parsed, validation cannot run"),
        "{message}"
    );
    assert!(message.contains("unknown type 'geopoint'"), "{message}");
    assert!(load_schema(&bad_schema).is_err());
}

#[test]
fn reports_describe_the_run() {
    let fixture = Fixture::new();
    let data = fixture.data("cases.xlsx", &[HEADER, &["C-1", "abc", ""]]);
    let outcome = run_validation(&fixture.schema, &data, &fixture.options()).unwrap();

    let json_path = fixture.dir.path().join("reports").join("run.json");
    write_json_report(&json_path, &outcome).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["schema"], "xlsform-validator.validation-report");
    assert_eq!(json["is_valid"], false);
    assert_eq!(json["error_count"], 1);
    assert_eq!(json["errors"][0]["kind"], "invalid_type");
    assert_eq!(json["errors"][0]["row_index"], 2);
    assert_eq!(json["data_file"]["sha256"].as_str().unwrap().len(), 64);
    assert_eq!(json["data_file"]["sha256"], outcome.data.sha256.as_str());

    let csv_path = fixture.dir.path().join("reports").join("errors.csv");
    write_csv_report(&csv_path, &outcome.result.errors).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    insta::assert_snapshot!(csv, @r#"
    sheet,cell,row,column,field,kind,reason
    Cases,B2,2,2,age,invalid_type,"invalid type, expected integer"
    "#);
}

#[test]
fn errors_are_available_before_highlighting() {
    let fixture = Fixture::new();
    let data = fixture.data("cases.xlsx", &[HEADER, &["C-1", "abc", ""]]);
    let results = fixture.dir.path().join("results");
    let mut seen = None;
    let outcome = run_validation_with(&fixture.schema, &data, &fixture.options(), |outcome| {
        assert!(outcome.annotated.is_none());
        assert!(!results.exists());
        seen = Some(outcome.result.error_count());
    })
    .unwrap();
    assert_eq!(seen, Some(1));
    assert!(outcome.annotated.is_some());
}

#[test]
fn unwritable_reports_keep_the_error_list() {
    let fixture = Fixture::new();
    let data = fixture.data("cases.xlsx", &[HEADER, &["C-1", "abc", ""]]);
    let mut outcome = run_validation(&fixture.schema, &data, &fixture.options()).unwrap();

    // A regular file cannot hold a reports directory.
    let blocked = fixture.dir.path().join("validation.xlsx");
    let targets = ReportTargets {
        json: Some(blocked.join("run.json")),
        csv: Some(blocked.join("errors.csv")),
    };
    write_reports(&mut outcome, &targets);

    assert_eq!(outcome.report_errors.len(), 2);
    assert!(outcome.report_errors[0].contains("create directory"), "{:?}", outcome.report_errors);
    assert_eq!(outcome.result.error_count(), 1);
    assert_eq!(outcome.result.count_of(ErrorKind::InvalidType), 1);
    assert!(outcome.annotated.is_some());
}

#[test]
fn requested_reports_are_written() {
    let fixture = Fixture::new();
    let data = fixture.data("cases.xlsx", &[HEADER, &["C-1", "4", ""]]);
    let mut outcome = run_validation(&fixture.schema, &data, &fixture.options()).unwrap();
    let targets = ReportTargets {
        json: Some(fixture.dir.path().join("run.json")),
        csv: Some(fixture.dir.path().join("errors.csv")),
    };
    write_reports(&mut outcome, &targets);
    assert!(outcome.report_errors.is_empty());
    assert!(fixture.dir.path().join("run.json").is_file());
    let csv = fs::read_to_string(fixture.dir.path().join("errors.csv")).unwrap();
    assert_eq!(csv, "");
}

#[test]
fn result_path_uses_data_stem() {
    let path = result_path(Path::new("/in/mpox_week1.xlsx"), None);
    assert_eq!(path, PathBuf::from("/in/results/mpox_week1_result.xlsx"));
}
