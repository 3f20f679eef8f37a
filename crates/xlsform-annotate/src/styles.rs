//! Stylesheet rewriting.
//!
//! Appends one solid fill to `<fills>` and, for every original cell format a
//! flagged cell uses, a copy of that `<xf>` pointing at the new fill. The
//! copies keep number format, font, border and alignment.

use std::collections::{BTreeSet, HashMap};

use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use tracing::trace;

use crate::error::{AnnotateError, Result};
use crate::workbook::STYLES_PART;
use crate::xml::{into_string, prefix_of, with_attrs, writer};

/// A rewritten stylesheet and the style remapping it introduces.
#[derive(Debug, Clone)]
pub(crate) struct Highlight {
    pub xml: String,
    /// Original `cellXfs` index to its highlighted copy.
    pub styles: HashMap<u32, u32>,
}

impl Highlight {
    /// Highlighted style for an original style index.
    pub fn style_for(&self, original: u32) -> u32 {
        self.styles.get(&original).copied().unwrap_or(original)
    }
}

/// What the first pass learns about the stylesheet.
struct StyleScan {
    fill_count: u32,
    /// Events of each `<xf>` in `<cellXfs>`, in index order.
    cell_xfs: Vec<Vec<Event<'static>>>,
    saw_fills: bool,
    saw_cell_xfs: bool,
}

fn scan(xml: &str) -> Result<StyleScan> {
    let mut reader = Reader::from_str(xml);
    let mut scan = StyleScan {
        fill_count: 0,
        cell_xfs: Vec::new(),
        saw_fills: false,
        saw_cell_xfs: false,
    };
    let mut in_fills = false;
    let mut in_cell_xfs = false;
    let mut current_xf: Option<Vec<Event<'static>>> = None;

    loop {
        let event = reader.read_event()?;
        if let Some(xf) = current_xf.as_mut() {
            let closes = matches!(&event, Event::End(e) if e.local_name().as_ref() == b"xf");
            xf.push(event.into_owned());
            if closes {
                scan.cell_xfs.extend(current_xf.take());
            }
            continue;
        }
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"fills" => {
                    scan.saw_fills = true;
                    in_fills = true;
                }
                b"fill" if in_fills => scan.fill_count += 1,
                b"cellXfs" => {
                    scan.saw_cell_xfs = true;
                    in_cell_xfs = true;
                }
                b"xf" if in_cell_xfs => {
                    current_xf = Some(vec![Event::Start(e.clone().into_owned())]);
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"fills" => scan.saw_fills = true,
                b"fill" if in_fills => scan.fill_count += 1,
                b"cellXfs" => scan.saw_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    scan.cell_xfs.push(vec![Event::Empty(e.clone().into_owned())]);
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"fills" => in_fills = false,
                b"cellXfs" => in_cell_xfs = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(scan)
}

fn malformed(reason: &str) -> AnnotateError {
    AnnotateError::MalformedPart {
        part: STYLES_PART.to_string(),
        reason: reason.to_string(),
    }
}

fn highlight_fill(prefix: &str, fill_rgb: &str) -> Vec<Event<'static>> {
    let tag = |local: &str| format!("{prefix}{local}");
    let mut pattern = BytesStart::new(tag("patternFill"));
    pattern.push_attribute(("patternType", "solid"));
    let mut fg = BytesStart::new(tag("fgColor"));
    fg.push_attribute(("rgb", fill_rgb));
    let mut bg = BytesStart::new(tag("bgColor"));
    bg.push_attribute(("indexed", "64"));
    vec![
        Event::Start(BytesStart::new(tag("fill"))),
        Event::Start(pattern),
        Event::Empty(fg),
        Event::Empty(bg),
        Event::End(BytesEnd::new(tag("patternFill"))),
        Event::End(BytesEnd::new(tag("fill"))),
    ]
}

/// Copy of an `<xf>` that applies the given fill.
fn highlighted_xf(events: &[Event<'static>], fill_id: &str) -> Result<Vec<Event<'static>>> {
    let mut out = Vec::with_capacity(events.len());
    for (idx, event) in events.iter().enumerate() {
        let rewritten = match event {
            Event::Start(e) if idx == 0 => {
                Event::Start(with_attrs(e, &[("fillId", fill_id), ("applyFill", "1")])?)
            }
            Event::Empty(e) if idx == 0 => {
                Event::Empty(with_attrs(e, &[("fillId", fill_id), ("applyFill", "1")])?)
            }
            other => other.clone(),
        };
        out.push(rewritten);
    }
    Ok(out)
}

/// Add a highlight fill and highlighted copies of the `used` cell formats.
pub(crate) fn add_highlight(
    xml: &str,
    used: &BTreeSet<u32>,
    fill_rgb: &str,
) -> Result<Highlight> {
    let scan = scan(xml)?;
    if !scan.saw_fills {
        return Err(malformed("no <fills> element"));
    }
    if !scan.saw_cell_xfs {
        return Err(malformed("no <cellXfs> element"));
    }
    let base = scan.cell_xfs.len() as u32;
    if let Some(&style) = used.iter().find(|&&style| style >= base) {
        return Err(AnnotateError::MissingCellFormat { style });
    }

    let fill_id = scan.fill_count.to_string();
    let styles: HashMap<u32, u32> = used
        .iter()
        .enumerate()
        .map(|(offset, &style)| (style, base + offset as u32))
        .collect();
    let mut copies = Vec::new();
    for &style in used {
        copies.extend(highlighted_xf(&scan.cell_xfs[style as usize], &fill_id)?);
    }
    let fill_count = (scan.fill_count + 1).to_string();
    let xf_count = (base + used.len() as u32).to_string();

    let mut reader = Reader::from_str(xml);
    let mut out = writer();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"fills" => {
                let start = with_attrs(&e, &[("count", fill_count.as_str())])?;
                out.write_event(Event::Start(start))?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"fills" => {
                let prefix = prefix_of(e.name().as_ref());
                let start = with_attrs(&e, &[("count", fill_count.as_str())])?;
                out.write_event(Event::Start(start))?;
                for event in highlight_fill(&prefix, fill_rgb) {
                    out.write_event(event)?;
                }
                out.write_event(Event::End(BytesEnd::new(format!("{prefix}fills"))))?;
            }
            Event::End(e) if e.local_name().as_ref() == b"fills" => {
                let prefix = prefix_of(e.name().as_ref());
                for event in highlight_fill(&prefix, fill_rgb) {
                    out.write_event(event)?;
                }
                out.write_event(Event::End(e))?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => {
                let start = with_attrs(&e, &[("count", xf_count.as_str())])?;
                out.write_event(Event::Start(start))?;
            }
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => {
                for event in &copies {
                    out.write_event(event.clone())?;
                }
                out.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => out.write_event(event)?,
        }
    }
    trace!(fill_id = %fill_id, copies = styles.len(), "extended stylesheet");

    Ok(Highlight {
        xml: into_string(out),
        styles,
    })
}
