//! Constraint evaluation against coerced values.

use std::cmp::Ordering;

use chrono::NaiveDate;
use xlsform_model::{Choice, Constraint, Expr, Literal, Operand};

use crate::coerce::{Value, parse_date_text};

/// Evaluation context shared by every cell of a run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvalContext {
    pub today: NaiveDate,
}

/// Scalar operand of a comparison.
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

/// Returns the first failing part of a constraint, or `None` when it holds.
pub(crate) fn first_failure<'c>(
    constraint: &'c Constraint,
    value: &Value,
    ctx: EvalContext,
) -> Option<&'c Constraint> {
    match constraint {
        Constraint::All(parts) => parts
            .iter()
            .find_map(|part| first_failure(part, value, ctx)),
        Constraint::AllowedValues { choices, .. } => {
            (!in_choices(choices, value)).then_some(constraint)
        }
        Constraint::Expression { expr, .. } => (!holds(expr, value, ctx)).then_some(constraint),
    }
}

fn in_choices(choices: &[Choice], value: &Value) -> bool {
    let allowed = |token: &str| choices.iter().any(|choice| choice.matches(token));
    match value {
        Value::Choices(tokens) => tokens.iter().all(|token| allowed(token)),
        other => allowed(&other.text()),
    }
}

/// Evaluate an expression for one value.
pub(crate) fn holds(expr: &Expr, value: &Value, ctx: EvalContext) -> bool {
    match expr {
        Expr::And(lhs, rhs) => holds(lhs, value, ctx) && holds(rhs, value, ctx),
        Expr::Or(lhs, rhs) => holds(lhs, value, ctx) || holds(rhs, value, ctx),
        Expr::Not(inner) => !holds(inner, value, ctx),
        Expr::Regex(pattern) => pattern.is_match(&value.text()),
        Expr::Compare { lhs, op, rhs } => {
            let lhs = resolve(lhs, value, ctx);
            let rhs = resolve(rhs, value, ctx);
            compare(&lhs, &rhs).is_some_and(|ordering| op.holds(ordering))
        }
    }
}

fn resolve(operand: &Operand, value: &Value, ctx: EvalContext) -> Scalar {
    match operand {
        Operand::Value => match value {
            Value::Integer(v) => Scalar::Number(*v as f64),
            Value::Decimal(v) => Scalar::Number(*v),
            Value::Date(dt) => Scalar::Date(dt.date()),
            other => Scalar::Text(other.text()),
        },
        Operand::StringLength => Scalar::Number(value.text().chars().count() as f64),
        Operand::Literal(Literal::Number(n)) => Scalar::Number(*n),
        Operand::Literal(Literal::Text(s)) => Scalar::Text(s.clone()),
        Operand::Literal(Literal::Date(d)) => Scalar::Date(*d),
        Operand::Literal(Literal::Today) => Scalar::Date(ctx.today),
    }
}

/// Order two scalars, or `None` when their kinds are incompatible.
fn compare(lhs: &Scalar, rhs: &Scalar) -> Option<Ordering> {
    match (lhs, rhs) {
        (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b),
        (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
        (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
        // Quoted dates such as `. > '2020-01-01'` compare as dates.
        (Scalar::Date(a), Scalar::Text(b)) => parse_date_text(b).map(|b| a.cmp(&b.date())),
        (Scalar::Text(a), Scalar::Date(b)) => parse_date_text(a).map(|a| a.date().cmp(b)),
        _ => None,
    }
}
