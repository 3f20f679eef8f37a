//! Field rules and the rule set built from a schema workbook.

use std::fmt;

use crate::data_type::DataType;
use crate::expr::Expr;

/// One entry of a choice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    pub label: Option<String>,
}

impl Choice {
    /// Check whether a submitted value names this choice.
    ///
    /// Matches the choice name or its label, trimmed and case-insensitive.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.trim().to_lowercase();
        if self.name.trim().to_lowercase() == value {
            return true;
        }
        self.label
            .as_deref()
            .is_some_and(|label| label.trim().to_lowercase() == value)
    }
}

/// Restriction on acceptable values beyond type correctness.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Value must name one of the choices of a list.
    AllowedValues { list_name: String, choices: Vec<Choice> },
    /// Value must satisfy a constraint expression.
    Expression {
        /// Expression as written in the schema.
        source: String,
        expr: Expr,
        /// Author-supplied `constraint_message`.
        message: Option<String>,
    },
    /// Every inner constraint must hold.
    All(Vec<Constraint>),
}

impl Constraint {
    /// Combine two constraints, flattening nested `All`.
    pub fn combine(self, other: Constraint) -> Constraint {
        let mut parts = Vec::new();
        for c in [self, other] {
            match c {
                Constraint::All(inner) => parts.extend(inner),
                single => parts.push(single),
            }
        }
        Constraint::All(parts)
    }

    /// Allowed set, if this constraint (or one of its parts) is a choice list.
    pub fn allowed_values(&self) -> Option<(&str, &[Choice])> {
        match self {
            Constraint::AllowedValues { list_name, choices } => Some((list_name, choices)),
            Constraint::All(parts) => parts.iter().find_map(Constraint::allowed_values),
            Constraint::Expression { .. } => None,
        }
    }

    /// Short description used in violation reasons.
    pub fn describe(&self) -> String {
        match self {
            Constraint::AllowedValues { list_name, .. } => format!("not in list '{list_name}'"),
            Constraint::Expression {
                source,
                expr,
                message,
            } => match message {
                Some(message) => message.clone(),
                None if expr.is_numeric_range() => format!("outside range {source}"),
                None => source.clone(),
            },
            Constraint::All(parts) => parts
                .iter()
                .map(Constraint::describe)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Validation rule for one column of a data sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// Column header expected in the data sheet.
    pub field_name: String,
    pub data_type: DataType,
    pub required: bool,
    pub constraint: Option<Constraint>,
    /// 1-based row of the survey sheet this rule was read from.
    pub schema_row: u32,
}

impl FieldRule {
    pub fn new(field_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            field_name: field_name.into(),
            data_type,
            required: false,
            constraint: None,
            schema_row: 0,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn at_row(mut self, row: u32) -> Self {
        self.schema_row = row;
        self
    }
}

/// Data sheet a group of rules applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SheetTarget {
    /// The first worksheet of the submitted workbook.
    First,
    /// A worksheet matched by name, case-insensitively.
    Named(String),
}

impl SheetTarget {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    fn same_as(&self, other: &SheetTarget) -> bool {
        match (self, other) {
            (Self::First, Self::First) => true,
            (Self::Named(a), Self::Named(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            _ => false,
        }
    }
}

impl fmt::Display for SheetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("<first sheet>"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Ordered rules for one data sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRules {
    pub target: SheetTarget,
    pub fields: Vec<FieldRule>,
}

/// Ordered mapping from data sheet to its field rules.
///
/// Sheets keep the order in which they first appear in the schema, and rules
/// keep survey row order within a sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    sheets: Vec<SheetRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to its target sheet, creating the sheet entry on first use.
    pub fn push(&mut self, target: SheetTarget, rule: FieldRule) {
        if let Some(entry) = self.sheets.iter_mut().find(|s| s.target.same_as(&target)) {
            entry.fields.push(rule);
            return;
        }
        self.sheets.push(SheetRules {
            target,
            fields: vec![rule],
        });
    }

    pub fn sheets(&self) -> &[SheetRules] {
        &self.sheets
    }

    /// Rules for a target, if any.
    pub fn rules_for(&self, target: &SheetTarget) -> &[FieldRule] {
        self.sheets
            .iter()
            .find(|s| s.target.same_as(target))
            .map(|s| s.fields.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of field rules across all sheets.
    pub fn field_count(&self) -> usize {
        self.sheets.iter().map(|s| s.fields.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Iterate over `(target, rule)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&SheetTarget, &FieldRule)> {
        self.sheets
            .iter()
            .flat_map(|s| s.fields.iter().map(move |f| (&s.target, f)))
    }
}
