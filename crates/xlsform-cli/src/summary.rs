use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use xlsform_cli::pipeline::RunOutcome;
use xlsform_model::{ErrorKind, RuleSet, ValidationError};

const KINDS: [ErrorKind; 5] = [
    ErrorKind::RequiredEmpty,
    ErrorKind::InvalidType,
    ErrorKind::ConstraintViolation,
    ErrorKind::MissingSheet,
    ErrorKind::MissingColumn,
];

/// Print the validation result and error list.
pub fn print_summary(outcome: &RunOutcome) {
    println!("Schema: {}", outcome.schema.path.display());
    println!("Submission: {}", outcome.data.path.display());
    if outcome.is_valid() {
        println!("Result: VALID");
        return;
    }
    println!("Result: INVALID ({} errors)", outcome.result.error_count());

    print_counts(outcome);
    print_error_table(&outcome.result.errors);
}

/// Print where the highlighted copy went and any file that was not written.
pub fn print_outputs(outcome: &RunOutcome) {
    if let Some(path) = &outcome.annotated {
        println!("Highlighted workbook: {}", path.display());
    }
    if let Some(reason) = &outcome.annotation_error {
        eprintln!("Highlighting failed: {reason}");
        eprintln!("The error list above is complete; no highlighted workbook was written.");
    }
    for reason in &outcome.report_errors {
        eprintln!("Report not written: {reason}");
    }
}

fn print_counts(outcome: &RunOutcome) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Check"), header_cell("Errors")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for kind in KINDS {
        let count = outcome.result.count_of(kind);
        table.add_row(vec![Cell::new(kind.label()), count_cell(count)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        count_cell(outcome.result.error_count()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

fn print_error_table(errors: &[ValidationError]) {
    if errors.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Cell"),
        header_cell("Field"),
        header_cell("Check"),
        header_cell("Reason"),
    ]);
    apply_error_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for error in errors {
        let cell = match error.cell() {
            Some(cell) => Cell::new(cell),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&error.sheet),
            cell,
            Cell::new(&error.field_name).fg(Color::Blue),
            kind_cell(error.kind),
            Cell::new(&error.reason),
        ]);
    }
    println!();
    println!("Errors:");
    println!("{table}");
}

/// Print the field rules of a parsed schema.
pub fn print_rules(rules: &RuleSet) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Required"),
        header_cell("Constraint"),
        header_cell("Row"),
    ]);
    apply_error_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Right);
    for (target, rule) in rules.iter() {
        let required = if rule.required {
            Cell::new("yes").fg(Color::Green)
        } else {
            dim_cell("no")
        };
        let constraint = match &rule.constraint {
            Some(constraint) => Cell::new(constraint.describe()),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(target),
            Cell::new(&rule.field_name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(rule.data_type),
            required,
            constraint,
            Cell::new(rule.schema_row),
        ]);
    }
    println!("{table}");
    println!(
        "{} fields across {} sheets",
        rules.field_count(),
        rules.sheets().len()
    );
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(60);
}

fn apply_error_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    if table.column_count() >= 5 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(20)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::UpperBoundary(Width::Fixed(24)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
            ColumnConstraint::UpperBoundary(Width::Percentage(50)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn kind_cell(kind: ErrorKind) -> Cell {
    let color = match kind {
        ErrorKind::RequiredEmpty => Color::Yellow,
        ErrorKind::InvalidType | ErrorKind::ConstraintViolation => Color::Red,
        ErrorKind::MissingSheet | ErrorKind::MissingColumn => Color::Magenta,
    };
    Cell::new(kind.label()).fg(color)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Red).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
