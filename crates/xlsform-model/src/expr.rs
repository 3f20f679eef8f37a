//! Parsed XLSForm constraint expressions.
//!
//! Only the subset needed for flat tabular checks is represented: comparisons
//! against the current value (`.`), `string-length(.)`, `regex(., '...')` and
//! the boolean connectives. Parsing lives in the schema crate and evaluation
//! in the validation engine; this module only holds the tree.

use std::fmt;

use chrono::NaiveDate;
use regex::Regex;

/// Boolean constraint expression over the current cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare {
        lhs: Operand,
        op: CompareOp,
        rhs: Operand,
    },
    Regex(Pattern),
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `.`, the value being checked.
    Value,
    /// `string-length(.)`
    StringLength,
    Literal(Literal),
}

/// Literal values allowed in expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    /// `today()`, resolved at evaluation time.
    Today,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Parse an operator token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "=" | "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// Operator with its operands swapped (`a < b` is `b > a`).
    pub fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
        }
    }

    /// Apply the operator to an ordering result.
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Eq => ordering == Equal,
            Self::Ne => ordering != Equal,
            Self::Lt => ordering == Less,
            Self::Le => ordering != Greater,
            Self::Gt => ordering == Greater,
            Self::Ge => ordering != Less,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled regular expression that compares by source text.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(regex: Regex) -> Self {
        Self(regex)
    }

    pub fn regex(&self) -> &Regex {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Expr {
    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn negate(inner: Expr) -> Self {
        Self::Not(Box::new(inner))
    }

    /// True when the expression only bounds the value numerically
    /// (comparisons of `.` against number literals joined by `and`).
    pub fn is_numeric_range(&self) -> bool {
        match self {
            Self::And(lhs, rhs) => lhs.is_numeric_range() && rhs.is_numeric_range(),
            Self::Compare { lhs, op, rhs } => {
                !matches!(op, CompareOp::Eq | CompareOp::Ne)
                    && matches!(
                        (lhs, rhs),
                        (Operand::Value, Operand::Literal(Literal::Number(_)))
                            | (Operand::Literal(Literal::Number(_)), Operand::Value)
                    )
            }
            _ => false,
        }
    }
}
