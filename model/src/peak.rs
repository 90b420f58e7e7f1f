use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Weekday hours when rail fares use the peak tariff. Weekends are always off-peak.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakWindow {
    /// Inclusive
    pub start: NaiveTime,
    /// Exclusive
    pub end: NaiveTime,
}

impl Default for PeakWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
        }
    }
}

impl PeakWindow {
    pub fn is_peak(&self, time: NaiveDateTime) -> bool {
        let weekday = !matches!(time.weekday(), Weekday::Sat | Weekday::Sun);
        let clock = time.time();
        weekday && clock >= self.start && clock < self.end
    }
}

/// Uses the default weekday 5am to 9:30pm window
pub fn is_peak(time: NaiveDateTime) -> bool {
    PeakWindow::default().is_peak(time)
}
