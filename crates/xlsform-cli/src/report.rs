//! Machine-readable reports of a validation run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info};
use xlsform_model::{ErrorKind, ValidationError};

use crate::pipeline::{InputFile, RunOutcome};

const REPORT_SCHEMA: &str = "xlsform-validator.validation-report";
const REPORT_SCHEMA_VERSION: u32 = 1;

/// Hex-encoded SHA-256 of a byte buffer.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Serialize)]
pub struct ValidationReportPayload<'a> {
    pub schema: &'static str,
    pub schema_version: u32,
    pub generated_at: String,
    pub tool_version: &'static str,
    pub schema_file: FileEntry,
    pub data_file: FileEntry,
    pub field_count: usize,
    pub is_valid: bool,
    pub error_count: usize,
    pub annotated_file: Option<String>,
    pub annotation_error: Option<&'a str>,
    pub errors: &'a [ValidationError],
}

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub sha256: String,
}

impl From<&InputFile> for FileEntry {
    fn from(input: &InputFile) -> Self {
        Self {
            path: input.path.display().to_string(),
            sha256: input.sha256.clone(),
        }
    }
}

/// One CSV row per validation error.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    sheet: &'a str,
    cell: String,
    row: u32,
    column: u32,
    field: &'a str,
    kind: ErrorKind,
    reason: &'a str,
}

pub fn build_payload(outcome: &RunOutcome) -> ValidationReportPayload<'_> {
    ValidationReportPayload {
        schema: REPORT_SCHEMA,
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        tool_version: env!("CARGO_PKG_VERSION"),
        schema_file: FileEntry::from(&outcome.schema),
        data_file: FileEntry::from(&outcome.data),
        field_count: outcome.field_count,
        is_valid: outcome.result.is_valid,
        error_count: outcome.result.error_count(),
        annotated_file: outcome
            .annotated
            .as_ref()
            .map(|path| path.display().to_string()),
        annotation_error: outcome.annotation_error.as_deref(),
        errors: &outcome.result.errors,
    }
}

/// Write the run as pretty-printed JSON.
pub fn write_json_report(path: &Path, outcome: &RunOutcome) -> Result<PathBuf> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(&build_payload(outcome))?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write JSON report {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Write the error list as CSV, one row per error.
///
/// Sheet-level errors have an empty `cell` and zero coordinates.
pub fn write_csv_report(path: &Path, errors: &[ValidationError]) -> Result<PathBuf> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create CSV report {}", path.display()))?;
    for error in errors {
        writer.serialize(CsvRow {
            sheet: &error.sheet,
            cell: error.cell().map(|c| c.to_a1()).unwrap_or_default(),
            row: error.row_index,
            column: error.column_index,
            field: &error.field_name,
            kind: error.kind,
            reason: &error.reason,
        })?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

/// Report files requested for a run.
#[derive(Debug, Clone, Default)]
pub struct ReportTargets {
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

/// Write the requested reports, recording failures in `report_errors`.
pub fn write_reports(outcome: &mut RunOutcome, targets: &ReportTargets) {
    if let Some(path) = &targets.json {
        match write_json_report(path, outcome) {
            Ok(path) => info!(path = %path.display(), "JSON report written"),
            Err(err) => record_failure(outcome, &err),
        }
    }
    if let Some(path) = &targets.csv {
        match write_csv_report(path, &outcome.result.errors) {
            Ok(path) => info!(path = %path.display(), "CSV report written"),
            Err(err) => record_failure(outcome, &err),
        }
    }
}

fn record_failure(outcome: &mut RunOutcome, err: &anyhow::Error) {
    let reason = format!("{err:#}");
    error!(error = %reason, "could not write report");
    outcome.report_errors.push(reason);
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    }
    Ok(())
}
