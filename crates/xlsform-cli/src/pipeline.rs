//! Validation run: input checks, parse, validate, highlight, save.
//!
//! The core crates work on bytes; this module owns every file-system
//! interaction around them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{error, info, info_span, warn};
use xlsform_annotate::{AnnotateOptions, annotate_with};
use xlsform_model::{RuleSet, ValidationResult};
use xlsform_validate::{ValidateOptions, validate_with};

use crate::report::sha256_hex;

/// Extension accepted for submitted workbooks.
pub const DATA_EXTENSION: &str = "xlsx";

/// Default results directory, relative to the data file.
pub const RESULTS_DIR_NAME: &str = "results";

/// One file read for a run, with its digest.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub path: PathBuf,
    pub sha256: String,
}

/// Options for a validation run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Where to save the highlighted workbook (default `<data dir>/results`).
    pub results_dir: Option<PathBuf>,
    pub validate: ValidateOptions,
    pub annotate: AnnotateOptions,
}

/// Everything a validation run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub schema: InputFile,
    pub data: InputFile,
    pub field_count: usize,
    pub result: ValidationResult,
    /// Highlighted copy of the submission, when it was invalid and saved.
    pub annotated: Option<PathBuf>,
    /// Why highlighting failed; the error list is still reported.
    pub annotation_error: Option<String>,
    /// Reports that could not be written.
    pub report_errors: Vec<String>,
}

impl RunOutcome {
    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }
}

/// Check that both inputs exist and the data file is an `.xlsx` workbook.
pub fn check_inputs(schema_path: &Path, data_path: &Path) -> Result<()> {
    if !schema_path.is_file() {
        bail!("XLSForm schema file not found: {}", schema_path.display());
    }
    if !data_path.is_file() {
        bail!("data file not found: {}", data_path.display());
    }
    if !has_data_extension(data_path) {
        let name = data_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        bail!("data file must be an Excel workbook (.xlsx), found: {name}");
    }
    Ok(())
}

fn has_data_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DATA_EXTENSION))
}

/// Path of the highlighted workbook: `<results dir>/<data stem>_result.xlsx`.
pub fn result_path(data_path: &Path, results_dir: Option<&Path>) -> PathBuf {
    let dir = match results_dir {
        Some(dir) => dir.to_path_buf(),
        None => data_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(RESULTS_DIR_NAME),
    };
    let stem = data_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "submission".to_string());
    dir.join(format!("{stem}_result.{DATA_EXTENSION}"))
}

/// Read and parse a schema workbook.
pub fn load_schema(schema_path: &Path) -> Result<(RuleSet, InputFile)> {
    let bytes = fs::read(schema_path)
        .with_context(|| format!("read schema {}", schema_path.display()))?;
    let rules = xlsform_schema::parse(&bytes).with_context(|| {
        format!(
            "schema could not be parsed, validation cannot run: {}",
            schema_path.display()
        )
    })?;
    let input = InputFile {
        path: schema_path.to_path_buf(),
        sha256: sha256_hex(&bytes),
    };
    Ok((rules, input))
}

/// Run a full validation of one submission.
///
/// Structural failures (missing files, unreadable workbooks, invalid schema)
/// are errors. Content problems end up in the returned result, and a failure
/// to save the highlighted copy is recorded in `annotation_error`.
pub fn run_validation(
    schema_path: &Path,
    data_path: &Path,
    options: &RunOptions,
) -> Result<RunOutcome> {
    run_validation_with(schema_path, data_path, options, |_| {})
}

/// Run a full validation, handing the outcome to `on_validated` as soon as
/// the submission is validated and before the highlighted copy is written.
pub fn run_validation_with<F>(
    schema_path: &Path,
    data_path: &Path,
    options: &RunOptions,
    on_validated: F,
) -> Result<RunOutcome>
where
    F: FnOnce(&RunOutcome),
{
    let span = info_span!("submission", data = %data_path.display());
    let _guard = span.enter();
    let start = Instant::now();

    check_inputs(schema_path, data_path)?;
    info!("Starting Excel validation");

    let (rules, schema) = load_schema(schema_path)?;
    info!(
        schema = %schema_path.display(),
        fields = rules.field_count(),
        sheets = rules.sheets().len(),
        "schema loaded"
    );

    let data_bytes =
        fs::read(data_path).with_context(|| format!("read data file {}", data_path.display()))?;
    let data = InputFile {
        path: data_path.to_path_buf(),
        sha256: sha256_hex(&data_bytes),
    };
    info!(data = %data_path.display(), "validating submission");
    let result = validate_with(&rules, &data_bytes, &options.validate)
        .with_context(|| format!("validate {}", data_path.display()))?;

    let mut outcome = RunOutcome {
        schema,
        data,
        field_count: rules.field_count(),
        result,
        annotated: None,
        annotation_error: None,
        report_errors: Vec::new(),
    };

    if outcome.is_valid() {
        info!(duration_ms = start.elapsed().as_millis(), "validation result: VALID");
        on_validated(&outcome);
        return Ok(outcome);
    }
    warn!(
        errors = outcome.result.error_count(),
        duration_ms = start.elapsed().as_millis(),
        "validation result: INVALID"
    );
    on_validated(&outcome);

    let target = result_path(data_path, options.results_dir.as_deref());
    match save_highlighted(&data_bytes, &outcome.result, &target, &options.annotate) {
        Ok(()) => {
            info!(path = %target.display(), "highlighted workbook saved");
            warn!(
                "review the highlighted cells in {} and resubmit the corrected file",
                target.display()
            );
            outcome.annotated = Some(target);
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "could not produce highlighted workbook");
            outcome.annotation_error = Some(format!("{err:#}"));
        }
    }
    Ok(outcome)
}

fn save_highlighted(
    data_bytes: &[u8],
    result: &ValidationResult,
    target: &Path,
    options: &AnnotateOptions,
) -> Result<()> {
    let highlighted =
        annotate_with(data_bytes, &result.errors, options).context("highlight invalid cells")?;
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create results directory {}", dir.display()))?;
    }
    fs::write(target, highlighted).with_context(|| format!("write {}", target.display()))?;
    Ok(())
}
