//! Sheet name to worksheet part resolution.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{AnnotateError, Result};
use crate::xml::{attr_text, attr_value};

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub(crate) const STYLES_PART: &str = "xl/styles.xml";

/// Worksheet names in workbook order, each with its package part path.
#[derive(Debug, Clone, Default)]
pub(crate) struct SheetParts {
    parts: Vec<(String, String)>,
}

impl SheetParts {
    /// Build from `xl/workbook.xml` and its relationships part.
    pub fn parse(workbook_xml: &str, rels_xml: &str) -> Result<Self> {
        let targets = relationship_targets(rels_xml)?;
        let mut parts = Vec::new();
        for (name, rel_id) in sheet_rel_ids(workbook_xml)? {
            let target = targets
                .get(&rel_id)
                .ok_or_else(|| AnnotateError::MalformedPart {
                    part: WORKBOOK_RELS_PART.to_string(),
                    reason: format!("no relationship '{rel_id}' for sheet '{name}'"),
                })?;
            parts.push((name, resolve_target(target)));
        }
        Ok(Self { parts })
    }

    /// Part path for a sheet name; exact match first, then case-insensitive.
    pub fn part_for(&self, sheet: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(name, _)| name == sheet)
            .or_else(|| {
                self.parts
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(sheet.trim()))
            })
            .map(|(_, part)| part.as_str())
    }
}

/// `(sheet name, relationship id)` pairs from `<sheets>`.
fn sheet_rel_ids(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut out = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_text(&e, b"name")?;
                let rel_id = attr_value(&e, b"id")?;
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    out.push((name, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Relationship id to target path.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut out = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id")?;
                let target = attr_text(&e, b"Target")?;
                if let (Some(id), Some(target)) = (id, target) {
                    out.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

/// Resolve a relationship target relative to `xl/`.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = vec!["xl"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
