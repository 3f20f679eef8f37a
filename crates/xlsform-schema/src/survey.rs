//! Survey sheet reading.
//!
//! Every recognised header is looked up by name, so column order and header
//! case never matter. Rows are classified by their type token into field
//! rows, group markers and rows that carry no data.

use tracing::trace;
use xlsform_common::{GridRow, HeaderRow, SheetGrid};
use xlsform_model::{Constraint, DataType, FieldRule, SheetTarget};

use crate::constraint::parse_expression;
use crate::error::{Result, SchemaError};

pub(crate) const SURVEY_SHEET: &str = "survey";

/// Row types that describe form metadata or display-only content.
const NON_DATA_TYPES: &[&str] = &[
    "note",
    "calculate",
    "start",
    "end",
    "today",
    "deviceid",
    "username",
    "phonenumber",
    "simserial",
    "subscriberid",
    "audit",
    "hidden",
];

/// A survey field before its choice list is resolved.
#[derive(Debug, Clone)]
pub(crate) struct SurveyField {
    pub target: SheetTarget,
    pub rule: FieldRule,
    /// Choice list referenced by a select type.
    pub list_name: Option<String>,
}

/// Classified type token of a survey row.
#[derive(Debug, Clone, PartialEq)]
enum RowKind {
    Field {
        data_type: DataType,
        list_name: Option<String>,
    },
    BeginScope,
    EndScope,
    Skip,
}

fn classify(token: &str, row: u32) -> Result<RowKind> {
    let lowered = token.trim().to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let unknown = || SchemaError::UnknownType {
        row,
        token: token.trim().to_string(),
    };

    let (head, rest) = match words.as_slice() {
        [] => return Err(unknown()),
        ["begin", "group" | "repeat", ..] => return Ok(RowKind::BeginScope),
        ["end", "group" | "repeat", ..] => return Ok(RowKind::EndScope),
        ["select", "one", rest @ ..] => ("select_one", rest),
        ["select", "multiple", rest @ ..] => ("select_multiple", rest),
        [head, rest @ ..] => (*head, rest),
    };

    match head {
        "begin_group" | "begin_repeat" => return Ok(RowKind::BeginScope),
        "end_group" | "end_repeat" => return Ok(RowKind::EndScope),
        _ => {}
    }

    if NON_DATA_TYPES.contains(&head) && rest.is_empty() {
        return Ok(RowKind::Skip);
    }

    let data_type = DataType::parse(head).ok_or_else(unknown)?;
    if data_type.is_select() {
        let Some(list_name) = rest.first() else {
            return Err(SchemaError::MissingListName {
                row,
                token: token.trim().to_string(),
            });
        };
        if rest.len() > 1 {
            return Err(unknown());
        }
        // List names are matched as written, so recover the original case.
        let original = token
            .split_whitespace()
            .last()
            .unwrap_or(*list_name)
            .to_string();
        return Ok(RowKind::Field {
            data_type,
            list_name: Some(original),
        });
    }
    if !rest.is_empty() {
        return Err(unknown());
    }
    Ok(RowKind::Field {
        data_type,
        list_name: None,
    })
}

fn parse_required(value: Option<&str>) -> Option<bool> {
    let Some(value) = value else {
        return Some(false);
    };
    match value.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "true()" | "1" => Some(true),
        "no" | "n" | "false" | "false()" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Absolute columns of the recognised survey headers.
struct SurveyColumns {
    type_col: u32,
    name: u32,
    required: Option<u32>,
    constraint: Option<u32>,
    constraint_message: Option<u32>,
    sheet: Option<u32>,
}

impl SurveyColumns {
    fn locate(header: &HeaderRow) -> Result<Self> {
        let mandatory = |name: &'static str| {
            header.column(name).ok_or(SchemaError::MissingHeader {
                sheet: SURVEY_SHEET,
                header: name,
            })
        };
        Ok(Self {
            type_col: mandatory("type")?,
            name: mandatory("name")?,
            required: header.column("required"),
            constraint: header.column("constraint"),
            constraint_message: header.column("constraint_message"),
            sheet: header.column("sheet"),
        })
    }

    fn recognised(&self) -> impl Iterator<Item = u32> + '_ {
        [self.type_col, self.name]
            .into_iter()
            .chain(self.required)
            .chain(self.constraint)
            .chain(self.constraint_message)
            .chain(self.sheet)
    }

    fn value(row: &GridRow<'_>, col: Option<u32>) -> Option<String> {
        col.and_then(|col| row.trimmed(col))
    }
}

/// Read every field row of the survey sheet, in row order.
pub(crate) fn read_fields(grid: &SheetGrid) -> Result<Vec<SurveyField>> {
    let Some(header) = grid.header() else {
        return Ok(Vec::new());
    };
    let columns = SurveyColumns::locate(&header)?;
    // Innermost scope last; `None` for an unnamed group.
    let mut scopes: Vec<Option<String>> = Vec::new();
    let mut fields = Vec::new();

    for row in grid.rows().filter(|row| row.row > header.row) {
        if columns.recognised().all(|col| row.is_blank_at(col)) {
            continue;
        }
        let row_number = row.row;
        let type_token = SurveyColumns::value(&row, Some(columns.type_col));
        let name = SurveyColumns::value(&row, Some(columns.name));
        let sheet = SurveyColumns::value(&row, columns.sheet);

        let Some(type_token) = type_token else {
            match name {
                Some(name) => {
                    return Err(SchemaError::MissingType {
                        row: row_number,
                        name,
                    });
                }
                // Only optional columns filled in; nothing to validate.
                None => continue,
            }
        };

        let (data_type, list_name) = match classify(&type_token, row_number)? {
            RowKind::Skip => {
                trace!(row = row_number, token = %type_token, "skipping non-data row");
                continue;
            }
            RowKind::BeginScope => {
                scopes.push(sheet.or(name));
                continue;
            }
            RowKind::EndScope => {
                if scopes.pop().is_none() {
                    return Err(SchemaError::UnbalancedGroup {
                        row: row_number,
                        token: type_token,
                    });
                }
                continue;
            }
            RowKind::Field {
                data_type,
                list_name,
            } => (data_type, list_name),
        };

        let Some(name) = name else {
            return Err(SchemaError::MissingName {
                row: row_number,
                token: type_token,
            });
        };

        let required_text = SurveyColumns::value(&row, columns.required);
        let required = parse_required(required_text.as_deref()).ok_or_else(|| {
            SchemaError::InvalidRequired {
                row: row_number,
                field: name.clone(),
                value: required_text.clone().unwrap_or_default(),
            }
        })?;

        let mut rule = FieldRule::new(name.clone(), data_type)
            .required(required)
            .at_row(row_number);
        if let Some(source) = SurveyColumns::value(&row, columns.constraint) {
            let expr =
                parse_expression(&source).map_err(|reason| SchemaError::InvalidConstraint {
                    row: row_number,
                    field: name.clone(),
                    expression: source.clone(),
                    reason,
                })?;
            rule = rule.with_constraint(Constraint::Expression {
                source,
                expr,
                message: SurveyColumns::value(&row, columns.constraint_message),
            });
        }

        let target = match sheet {
            Some(sheet) => SheetTarget::Named(sheet),
            None => scopes
                .iter()
                .rev()
                .find_map(Clone::clone)
                .map_or(SheetTarget::First, SheetTarget::Named),
        };
        fields.push(SurveyField {
            target,
            rule,
            list_name,
        });
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_data_types() {
        assert_eq!(
            classify(" Integer ", 2).unwrap(),
            RowKind::Field {
                data_type: DataType::Integer,
                list_name: None
            }
        );
        assert_eq!(
            classify("select one Sex_List", 2).unwrap(),
            RowKind::Field {
                data_type: DataType::SelectOne,
                list_name: Some("Sex_List".to_string())
            }
        );
        assert_eq!(
            classify("select_multiple symptoms", 2).unwrap(),
            RowKind::Field {
                data_type: DataType::SelectMultiple,
                list_name: Some("symptoms".to_string())
            }
        );
    }

    #[test]
    fn test_classify_markers_and_skips() {
        assert_eq!(classify("begin group", 2).unwrap(), RowKind::BeginScope);
        assert_eq!(classify("begin_repeat", 2).unwrap(), RowKind::BeginScope);
        assert_eq!(classify("End Group", 2).unwrap(), RowKind::EndScope);
        assert_eq!(classify("end", 2).unwrap(), RowKind::Skip);
        assert_eq!(classify("note", 2).unwrap(), RowKind::Skip);
    }

    #[test]
    fn test_classify_errors() {
        assert!(matches!(
            classify("geopoint", 7),
            Err(SchemaError::UnknownType { row: 7, .. })
        ));
        assert!(matches!(
            classify("select_one", 3),
            Err(SchemaError::MissingListName { row: 3, .. })
        ));
        assert!(matches!(
            classify("integer extra", 3),
            Err(SchemaError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_parse_required() {
        for yes in ["yes", "Y", "TRUE", "true()", "1"] {
            assert_eq!(parse_required(Some(yes)), Some(true), "{yes}");
        }
        for no in ["no", "n", "False", "false()", "0", " "] {
            assert_eq!(parse_required(Some(no)), Some(false), "{no}");
        }
        assert_eq!(parse_required(None), Some(false));
        assert_eq!(parse_required(Some("maybe")), None);
    }
}
