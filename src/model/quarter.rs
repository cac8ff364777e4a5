use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt;

/// Calendar quarter, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    pub number: u32,
}

impl Quarter {
    pub fn of(datetime: &DateTime<Utc>) -> Self {
        Self {
            year: datetime.year(),
            number: datetime.month0() / 3 + 1,
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn previous(self) -> Self {
        if self.number == 1 {
            Self {
                year: self.year - 1,
                number: 4,
            }
        } else {
            Self {
                year: self.year,
                number: self.number - 1,
            }
        }
    }

    pub fn back(self, quarters: u32) -> Self {
        (0..quarters).fold(self, |q, _| q.previous())
    }

    /// Midnight UTC of the quarter's first day.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(self.year, (self.number - 1) * 3 + 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|datetime| datetime.and_utc())
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.number)
    }
}
