#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod aliases;
mod fares;
mod ids;
mod money;
mod stations;

use anyhow::Result;
use serde::de::DeserializeOwned;

pub use aliases::AliasTable;
pub use fares::{Fare, FareEntry, FareTable, UnpricedReason};
pub use ids::StationCode;
pub use money::Money;
pub use stations::StationTable;

/// The static datasets the engine prices rides against. These are produced offline from the
/// transit authority's API, loaded once and never modified afterwards, so they can be shared
/// read-only between any number of analyses.
pub struct ReferenceData {
    pub stations: StationTable,
    pub aliases: AliasTable,
    pub fares: FareTable,
}

impl ReferenceData {
    pub fn new(stations: StationTable, aliases: AliasTable, fares: FareTable) -> Self {
        for (label, canonical) in aliases.iter() {
            if stations.code(canonical).is_none() {
                warn!("Gate alias {label:?} points at unknown station {canonical:?}");
            }
        }
        Self {
            stations,
            aliases,
            fares,
        }
    }

    pub fn load(stations_path: &str, aliases_path: Option<&str>, fares_path: &str) -> Result<Self> {
        let stations = StationTable::load(stations_path)?;
        let aliases = match aliases_path {
            Some(path) => AliasTable::load(path)?,
            None => AliasTable::empty(),
        };
        let fares = FareTable::load(fares_path)?;
        info!(
            "Loaded {} stations (updated {}), {} gate aliases, {} fares (updated {})",
            stations.len(),
            describe_update(stations.last_updated()),
            aliases.len(),
            fares.len(),
            describe_update(fares.last_updated()),
        );
        Ok(Self::new(stations, aliases, fares))
    }
}

fn describe_update(time: Option<chrono::NaiveDateTime>) -> String {
    match time {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => "at an unknown time".to_string(),
    }
}

// Adds the path in the error message
fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let file = fs_err::File::open(path)?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|err| anyhow!("{path}: {err}"))
}
