use anyhow::{Context, Result};

use xlsform_annotate::AnnotateOptions;
use xlsform_cli::pipeline::{RunOptions, RunOutcome, load_schema, run_validation_with};
use xlsform_cli::report::{ReportTargets, write_reports};
use xlsform_model::RuleSet;

use crate::cli::{SchemaArgs, ValidateArgs};
use crate::summary::print_summary;

pub fn run_validate(args: &ValidateArgs) -> Result<RunOutcome> {
    let mut annotate = AnnotateOptions::default();
    if let Some(color) = &args.highlight_color {
        annotate = annotate.with_fill_rgb(color).context("--highlight-color")?;
    }
    let options = RunOptions {
        results_dir: args.results_dir.clone(),
        annotate,
        ..RunOptions::default()
    };

    // The error summary is printed before highlighting is attempted.
    let mut outcome = run_validation_with(&args.schema, &args.data, &options, print_summary)?;

    let targets = ReportTargets {
        json: args.report_json.clone(),
        csv: args.report_csv.clone(),
    };
    write_reports(&mut outcome, &targets);
    Ok(outcome)
}

pub fn run_schema(args: &SchemaArgs) -> Result<RuleSet> {
    let (rules, _) = load_schema(&args.schema)?;
    Ok(rules)
}
