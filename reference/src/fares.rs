use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{Money, StationCode};

/// Rail fares between every pair of stations, keyed like "A01-C05"
pub struct FareTable {
    last_updated: Option<NaiveDateTime>,
    fares: BTreeMap<String, FareEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FareEntry {
    #[serde(rename = "PeakTime")]
    pub peak: Money,
    #[serde(rename = "OffPeakTime")]
    pub off_peak: Money,
    // The files also carry a SeniorDisabled fare; reduced tariffs aren't modelled.
}

impl FareEntry {
    pub fn new(peak: Money, off_peak: Money) -> Self {
        Self { peak, off_peak }
    }

    pub fn for_period(&self, peak: bool) -> Money {
        if peak {
            self.peak
        } else {
            self.off_peak
        }
    }
}

/// The price of one ride. Rides that couldn't be priced stay distinguishable from free ones, so
/// totals built from them can say how much they undercount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fare {
    Priced(Money),
    Unpriced(UnpricedReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnpricedReason {
    /// The entry or exit name didn't match any station
    UnresolvedStation,
    /// Both stations are known, but the fare table has nothing for the pair
    UnsupportedPair,
}

impl Fare {
    /// Unpriced rides count as free
    pub fn amount(&self) -> Money {
        match self {
            Fare::Priced(x) => *x,
            Fare::Unpriced(_) => Money::ZERO,
        }
    }

    pub fn is_priced(&self) -> bool {
        matches!(self, Fare::Priced(_))
    }
}

impl FareTable {
    pub fn new() -> Self {
        Self {
            last_updated: None,
            fares: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entry: &StationCode, exit: &StationCode, fare: FareEntry) {
        self.fares.insert(key(entry, exit), fare);
    }

    pub fn from_json<R: std::io::Read>(reader: R) -> Result<Self> {
        Self::from_record(serde_json::from_reader(reader)?)
    }

    pub fn load(path: &str) -> Result<Self> {
        Self::from_record(crate::read_json(path)?).map_err(|err| anyhow!("{path}: {err}"))
    }

    fn from_record(rec: Record) -> Result<Self> {
        for pair in rec.fares.keys() {
            match pair.split_once('-') {
                Some((entry, exit)) if !entry.is_empty() && !exit.is_empty() => {}
                _ => bail!("Fare key {pair:?} isn't of the form ENTRY-EXIT"),
            }
        }
        Ok(Self {
            last_updated: rec.last_updated,
            fares: rec.fares,
        })
    }

    pub fn get(&self, entry: &StationCode, exit: &StationCode) -> Option<&FareEntry> {
        self.fares.get(&key(entry, exit))
    }

    pub fn fare(&self, entry: &StationCode, exit: &StationCode, peak: bool) -> Fare {
        if entry.is_unresolved() || exit.is_unresolved() {
            return Fare::Unpriced(UnpricedReason::UnresolvedStation);
        }
        match self.get(entry, exit) {
            Some(fare) => Fare::Priced(fare.for_period(peak)),
            None => {
                debug!("No fare from {entry} to {exit}");
                Fare::Unpriced(UnpricedReason::UnsupportedPair)
            }
        }
    }

    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.fares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fares.is_empty()
    }
}

impl Default for FareTable {
    fn default() -> Self {
        Self::new()
    }
}

fn key(entry: &StationCode, exit: &StationCode) -> String {
    format!("{}-{}", entry.as_str(), exit.as_str())
}

#[derive(Deserialize)]
struct Record {
    last_updated: Option<NaiveDateTime>,
    fares: BTreeMap<String, FareEntry>,
}
