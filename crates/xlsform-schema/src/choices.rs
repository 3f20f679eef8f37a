//! Choices sheet reading.

use std::collections::HashMap;

use xlsform_common::SheetGrid;
use xlsform_model::Choice;

use crate::error::{Result, SchemaError};

pub(crate) const CHOICES_SHEET: &str = "choices";

/// Choice lists keyed by list name, each in sheet order.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChoiceLists {
    lists: HashMap<String, Vec<Choice>>,
}

impl ChoiceLists {
    pub fn get(&self, list_name: &str) -> Option<&[Choice]> {
        self.lists.get(list_name.trim()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }
}

/// Read all choice lists. Rows without a list name or choice name are skipped.
pub(crate) fn read_lists(grid: &SheetGrid) -> Result<ChoiceLists> {
    let mut lists = ChoiceLists::default();
    let Some(header) = grid.header() else {
        return Ok(lists);
    };
    let missing = |header: &'static str| SchemaError::MissingHeader {
        sheet: CHOICES_SHEET,
        header,
    };
    let list_col = header.column("list_name").ok_or_else(|| missing("list_name"))?;
    let name_col = header.column("name").ok_or_else(|| missing("name"))?;
    let label_col = header.column("label");

    for row in grid.data_rows(&header) {
        let (Some(list_name), Some(name)) = (row.trimmed(list_col), row.trimmed(name_col)) else {
            continue;
        };
        let label = label_col.and_then(|col| row.trimmed(col));
        lists
            .lists
            .entry(list_name)
            .or_default()
            .push(Choice { name, label });
    }
    Ok(lists)
}
