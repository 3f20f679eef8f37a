//! Small quick-xml helpers shared by the part rewriters.

use std::borrow::Cow;

use quick_xml::Writer;
use quick_xml::events::BytesStart;

use crate::error::Result;

/// Raw value of an attribute, matched by local name.
pub(crate) fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}

/// Unescaped attribute value, for names that may contain entities.
pub(crate) fn attr_text(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    let Some(raw) = attr_value(element, key)? else {
        return Ok(None);
    };
    let text = quick_xml::escape::unescape(&raw)
        .map(Cow::into_owned)
        .map_err(quick_xml::Error::from)?;
    Ok(Some(text))
}

/// Copy an element, replacing (or appending) the given attributes.
///
/// Attributes keep their original order and escaping.
pub(crate) fn with_attrs(
    element: &BytesStart<'_>,
    replacements: &[(&str, &str)],
) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    let mut applied = vec![false; replacements.len()];
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key.as_ref();
        match replacements.iter().position(|(k, _)| k.as_bytes() == key) {
            Some(idx) => {
                out.push_attribute((replacements[idx].0, replacements[idx].1));
                applied[idx] = true;
            }
            None => out.push_attribute(attr),
        }
    }
    for ((key, value), done) in replacements.iter().zip(applied) {
        if !done {
            out.push_attribute((*key, *value));
        }
    }
    Ok(out)
}

/// Namespace prefix of an element name, including the colon.
pub(crate) fn prefix_of(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.split_once(':') {
        Some((prefix, _)) => format!("{prefix}:"),
        None => String::new(),
    }
}

/// New in-memory writer.
pub(crate) fn writer() -> Writer<Vec<u8>> {
    Writer::new(Vec::new())
}

/// Finish a writer and return its output as a string.
pub(crate) fn into_string(writer: Writer<Vec<u8>>) -> String {
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_attrs_replaces_and_appends() {
        let element = BytesStart::from_content(r#"c r="B2" s="3" t="s""#, 1);
        let updated = with_attrs(&element, &[("s", "7"), ("x", "1")]).unwrap();
        assert_eq!(attr_value(&updated, b"r").unwrap().as_deref(), Some("B2"));
        assert_eq!(attr_value(&updated, b"s").unwrap().as_deref(), Some("7"));
        assert_eq!(attr_value(&updated, b"t").unwrap().as_deref(), Some("s"));
        assert_eq!(attr_value(&updated, b"x").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_prefix_of() {
        assert_eq!(prefix_of(b"x:sheetData"), "x:");
        assert_eq!(prefix_of(b"sheetData"), "");
    }

    #[test]
    fn test_attr_text_unescapes() {
        let element = BytesStart::from_content(r#"sheet name="R&amp;D""#, 5);
        assert_eq!(attr_text(&element, b"name").unwrap().as_deref(), Some("R&D"));
    }
}
