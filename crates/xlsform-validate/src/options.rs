//! Validation options.

use chrono::NaiveDate;

/// Options for a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Date used for `today()` in constraints. Defaults to the local date.
    pub today: Option<NaiveDate>,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `today()` to a fixed date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub(crate) fn resolve_today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
