//! Data type check.

use calamine::Data;
use xlsform_model::FieldRule;

use crate::coerce::{Value, coerce};

/// Coerce a non-blank cell to the rule's type; `None` is a type failure.
pub(crate) fn check(rule: &FieldRule, cell: &Data) -> Option<Value> {
    coerce(cell, rule.data_type)
}
