use crate::error::Result;
use crate::report::TeamReport;

pub trait JsonReport {
    fn render_json(&self) -> Result<String>;
}

impl JsonReport for TeamReport {
    fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
