use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use reference::{Money, StationCode};

use crate::PeakWindow;

/// Metrobus boardings all cost the same, regardless of route or time
pub const BUS_FARE: Money = Money::cents(225);

// A day
const MAX_WINDOW_MINUTES: i64 = 24 * 60;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Which way the usage export is sorted. This decides which neighbor of an exit tap is its
    /// entry.
    pub log_order: LogOrder,
    pub bus_fare: Money,
    pub peak: PeakWindow,
    pub interchange: Interchange,
    /// Fuzzy station matches must score above this (on a 0 to 1 scale)
    pub min_similarity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOrder {
    /// Oldest tap first; the entry for an exit is the row before it
    Ascending,
    /// Newest tap first, like the card usage export; the entry for an exit is the row after it
    Descending,
}

/// Two stations joined by an out-of-system walk. Exiting one and entering the other shortly after
/// is priced as one continuous trip.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Interchange {
    pub stations: (StationCode, StationCode),
    pub window_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_order: LogOrder::Descending,
            bus_fare: BUS_FARE,
            peak: PeakWindow::default(),
            interchange: Interchange::default(),
            min_similarity: 0.8,
        }
    }
}

impl EngineConfig {
    pub fn from_json<R: std::io::Read>(reader: R) -> Result<Self> {
        let config: EngineConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &str) -> Result<Self> {
        let file = fs_err::File::open(path)?;
        Self::from_json(std::io::BufReader::new(file)).map_err(|err| anyhow!("{path}: {err}"))
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_similarity) {
            bail!(
                "min_similarity must be between 0 and 1, not {}",
                self.min_similarity
            );
        }
        if !(0..=MAX_WINDOW_MINUTES).contains(&self.interchange.window_minutes) {
            bail!(
                "interchange window_minutes must be between 0 and {MAX_WINDOW_MINUTES}, not {}",
                self.interchange.window_minutes
            );
        }
        if self.bus_fare < Money::ZERO {
            bail!("bus_fare can't be negative: {}", self.bus_fare);
        }
        if self.peak.start >= self.peak.end {
            bail!(
                "peak window starts at {} but ends at {}",
                self.peak.start,
                self.peak.end
            );
        }
        Ok(())
    }
}

impl Default for LogOrder {
    fn default() -> Self {
        LogOrder::Descending
    }
}

impl Default for Interchange {
    // Farragut North (Red line) and Farragut West (Blue/Orange/Silver lines)
    fn default() -> Self {
        Self {
            stations: (StationCode::new("A02"), StationCode::new("C03")),
            window_minutes: 30,
        }
    }
}

impl Interchange {
    pub fn window(&self) -> Duration {
        Duration::minutes(self.window_minutes)
    }

    /// If this is one side of the interchange, the other side
    pub fn opposite(&self, code: &StationCode) -> Option<&StationCode> {
        if code.is_unresolved() {
            return None;
        }
        if code == &self.stations.0 {
            Some(&self.stations.1)
        } else if code == &self.stations.1 {
            Some(&self.stations.0)
        } else {
            None
        }
    }
}
