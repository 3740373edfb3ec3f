/// JSON summary output.
use crate::error::AppError;
use crate::output::{Formatter, LoadSummary};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, summary: &LoadSummary) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(summary)?)
    }
}
