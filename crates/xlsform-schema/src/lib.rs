//! XLSForm schema parsing.
//!
//! Reads a schema-definition workbook (an XLSForm with a `survey` sheet and
//! an optional `choices` sheet) into a [`RuleSet`]: one ordered list of
//! [`FieldRule`](xlsform_model::FieldRule)s per target data sheet.
//!
//! ```ignore
//! let rules = xlsform_schema::parse(&schema_bytes)?;
//! for (sheet, rule) in rules.iter() {
//!     println!("{sheet}: {} ({})", rule.field_name, rule.data_type);
//! }
//! ```

mod choices;
mod constraint;
mod error;
mod survey;

use calamine::Reader;
use tracing::{debug, debug_span};
use xlsform_common::{find_sheet, open_workbook, read_sheet};
use xlsform_model::{Constraint, RuleSet};

pub use error::{Result, SchemaError};

use choices::{CHOICES_SHEET, ChoiceLists};
use survey::SURVEY_SHEET;

/// Parse schema workbook bytes into a rule set.
///
/// Fails when the bytes are not a readable workbook, the `survey` sheet or a
/// mandatory header is missing, a row is malformed, or no field rules result.
pub fn parse(schema_bytes: &[u8]) -> Result<RuleSet> {
    let span = debug_span!("parse_schema", bytes = schema_bytes.len());
    let _guard = span.enter();

    let mut workbook = open_workbook(schema_bytes)?;
    let sheet_names = workbook.sheet_names();

    let survey_name = find_sheet(&sheet_names, SURVEY_SHEET)
        .ok_or(SchemaError::MissingSheet {
            sheet: SURVEY_SHEET,
        })?
        .to_string();
    let survey = read_sheet(&mut workbook, &survey_name)?;
    let fields = survey::read_fields(&survey)?;
    debug!(fields = fields.len(), sheet = %survey_name, "read survey sheet");

    let lists = if fields.iter().any(|f| f.list_name.is_some()) {
        let choices_name = find_sheet(&sheet_names, CHOICES_SHEET)
            .ok_or(SchemaError::MissingSheet {
                sheet: CHOICES_SHEET,
            })?
            .to_string();
        let grid = read_sheet(&mut workbook, &choices_name)?;
        let lists = choices::read_lists(&grid)?;
        debug!(lists = lists.len(), "read choices sheet");
        lists
    } else {
        ChoiceLists::default()
    };

    let mut rules = RuleSet::new();
    for field in fields {
        let mut rule = field.rule;
        if let Some(list_name) = field.list_name {
            let choices = lists
                .get(&list_name)
                .ok_or_else(|| SchemaError::UnknownChoiceList {
                    row: rule.schema_row,
                    field: rule.field_name.clone(),
                    list: list_name.clone(),
                })?
                .to_vec();
            let allowed = Constraint::AllowedValues { list_name, choices };
            rule.constraint = Some(match rule.constraint.take() {
                Some(expression) => allowed.combine(expression),
                None => allowed,
            });
        }
        rules.push(field.target, rule);
    }

    if rules.is_empty() {
        return Err(SchemaError::EmptySchema);
    }
    debug!(
        sheets = rules.sheets().len(),
        fields = rules.field_count(),
        "parsed schema"
    );
    Ok(rules)
}
