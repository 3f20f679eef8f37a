//! Annotation options.

use crate::error::{AnnotateError, Result};

/// Default highlight: Excel's light red "bad" fill.
pub const DEFAULT_FILL_RGB: &str = "FFFFC7CE";

/// Options controlling how flagged cells are marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotateOptions {
    /// Fill colour as 8-digit ARGB hex.
    pub fill_rgb: String,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            fill_rgb: DEFAULT_FILL_RGB.to_string(),
        }
    }
}

impl AnnotateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fill colour from `RRGGBB`, `AARRGGBB` or either with a leading `#`.
    pub fn with_fill_rgb(mut self, value: &str) -> Result<Self> {
        self.fill_rgb = normalize_color(value)?;
        Ok(self)
    }
}

/// Normalize a colour to uppercase ARGB, defaulting alpha to opaque.
pub(crate) fn normalize_color(value: &str) -> Result<String> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || AnnotateError::InvalidColor {
        value: value.to_string(),
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    match hex.len() {
        6 => Ok(format!("FF{}", hex.to_ascii_uppercase())),
        8 => Ok(hex.to_ascii_uppercase()),
        _ => Err(invalid()),
    }
}
