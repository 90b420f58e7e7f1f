use std::fmt;

use serde::{Deserialize, Serialize};

/// The transit authority's code for a rail station, like "A01". Codes join the station table to
/// the fare table.
///
/// The empty code means a free-text name couldn't be resolved to any station.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationCode(String);

impl StationCode {
    pub fn new<S: Into<String>>(code: S) -> Self {
        Self(code.into())
    }

    pub fn unresolved() -> Self {
        Self(String::new())
    }

    pub fn is_unresolved(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_unresolved() {
            write!(f, "???")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
