use crate::error::{Error, Result};
use crate::model::Quarter;
use chrono::{DateTime, Utc};
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Creation-date window for pull request searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Window {
    pub since: DateTime<Utc>,
    pub until: Option<DateTime<Utc>>,
}

// Create
impl Window {
    pub fn since(since: DateTime<Utc>) -> Self {
        Self { since, until: None }
    }

    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Self> {
        if since > until {
            return Err(Error::InvalidWindow {
                since: since.format(DATE_FORMAT).to_string(),
                until: until.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self {
            since,
            until: Some(until),
        })
    }

    /// Open-ended window starting with the quarter `quarters - 1` before `now`'s.
    pub fn last_quarters(now: &DateTime<Utc>, quarters: u32) -> Result<Self> {
        if quarters == 0 {
            return Err(Error::Config("At least one quarter is required".into()));
        }
        let first = Quarter::of(now).back(quarters - 1);
        let since = first
            .start()
            .ok_or_else(|| Error::Config(format!("Quarter {first} has no start date")))?;
        Ok(Self::since(since))
    }
}

impl Window {
    /// Search qualifier restricting results to this window.
    pub fn created_qualifier(&self) -> String {
        match self.until {
            Some(until) => format!(
                "created:{}..{}",
                self.since.format(DATE_FORMAT),
                until.format(DATE_FORMAT)
            ),
            None => format!("created:>={}", self.since.format(DATE_FORMAT)),
        }
    }

    pub fn contains(&self, datetime: &DateTime<Utc>) -> bool {
        *datetime >= self.since && self.until.map_or(true, |until| *datetime <= until)
    }

    /// `since:until` period string, `until` empty for open windows.
    pub fn period(&self) -> String {
        format!(
            "{}:{}",
            self.since.format(DATE_FORMAT),
            self.until
                .map(|u| u.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn open_window_uses_lower_bound_qualifier() {
        let window = Window::since(day(2025, 1, 5));
        assert_eq!(window.created_qualifier(), "created:>=2025-01-05");
        assert_eq!(window.period(), "2025-01-05:");
    }

    #[test]
    fn closed_window_uses_range_qualifier() {
        let window = Window::between(day(2025, 1, 1), day(2025, 3, 31)).unwrap();
        assert_eq!(window.created_qualifier(), "created:2025-01-01..2025-03-31");
        assert!(window.contains(&day(2025, 2, 1)));
        assert!(!window.contains(&day(2025, 4, 1)));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = Window::between(day(2025, 3, 1), day(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidWindow { .. }));
    }

    #[test]
    fn last_quarters_starts_at_quarter_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 9, 30, 0).unwrap();
        let window = Window::last_quarters(&now, 4).unwrap();
        assert_eq!(window.since, day(2024, 7, 1));
        assert_eq!(window.until, None);
        assert_eq!(Window::last_quarters(&now, 1).unwrap().since, day(2025, 4, 1));
        assert!(Window::last_quarters(&now, 0).is_err());
    }
}
