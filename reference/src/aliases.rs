use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

/// Free-text fare gate labels that the usage export prints instead of a canonical station name.
/// Only used as a fast path before fuzzy matching.
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    pub fn from_json<R: std::io::Read>(reader: R) -> Result<Self> {
        let rec: Record = serde_json::from_reader(reader)?;
        Ok(Self::new(rec.aliases))
    }

    pub fn load(path: &str) -> Result<Self> {
        let rec: Record = crate::read_json(path)?;
        Ok(Self::new(rec.aliases))
    }

    /// The canonical station name for a gate label
    pub fn canonical(&self, label: &str) -> Option<&str> {
        self.aliases.get(label).map(|x| x.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.aliases.iter()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[derive(Deserialize)]
struct Record {
    aliases: BTreeMap<String, String>,
}
