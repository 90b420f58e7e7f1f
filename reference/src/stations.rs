use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::StationCode;

/// Canonical rail station names and their codes.
pub struct StationTable {
    last_updated: Option<NaiveDateTime>,
    codes: BTreeMap<String, StationCode>,
    // Same order as codes. Fuzzy matching wants a plain list to search.
    names: Vec<String>,
}

impl StationTable {
    pub fn new(codes: BTreeMap<String, StationCode>, last_updated: Option<NaiveDateTime>) -> Self {
        let names = codes.keys().cloned().collect();
        Self {
            last_updated,
            codes,
            names,
        }
    }

    pub fn from_json<R: std::io::Read>(reader: R) -> Result<Self> {
        Self::from_record(serde_json::from_reader(reader)?)
    }

    pub fn load(path: &str) -> Result<Self> {
        Self::from_record(crate::read_json(path)?).map_err(|err| anyhow!("{path}: {err}"))
    }

    fn from_record(rec: Record) -> Result<Self> {
        for (name, code) in &rec.stations {
            if name.trim().is_empty() {
                bail!("Station with code {code} has no name");
            }
            if code.is_unresolved() {
                bail!("Station {name:?} has an empty code");
            }
        }
        Ok(Self::new(rec.stations, rec.last_updated))
    }

    pub fn code(&self, name: &str) -> Option<&StationCode> {
        self.codes.get(name)
    }

    /// All canonical names, sorted
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[derive(Deserialize)]
struct Record {
    last_updated: Option<NaiveDateTime>,
    stations: BTreeMap<String, StationCode>,
}
