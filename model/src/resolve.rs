use reference::{AliasTable, StationCode, StationTable};

/// Finds the candidate most similar to a query.
pub trait NameMatcher {
    /// The index of the best candidate and its similarity, from 0 (nothing in common) to 1
    /// (identical). Ties go to the earliest candidate. None only if there are no candidates.
    fn best_match(&self, query: &str, candidates: &[String]) -> Option<(usize, f64)>;
}

impl<F: Fn(&str, &[String]) -> Option<(usize, f64)>> NameMatcher for F {
    fn best_match(&self, query: &str, candidates: &[String]) -> Option<(usize, f64)> {
        self(query, candidates)
    }
}

/// Case-insensitive normalized Levenshtein similarity
pub struct LevenshteinMatcher;

impl NameMatcher for LevenshteinMatcher {
    fn best_match(&self, query: &str, candidates: &[String]) -> Option<(usize, f64)> {
        let query = query.trim().to_lowercase();
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let score = strsim::normalized_levenshtein(&query, &candidate.trim().to_lowercase());
            if best.map(|(_, x)| score > x).unwrap_or(true) {
                best = Some((idx, score));
            }
        }
        best
    }
}

/// Turns the free-text locations printed in a usage export into station codes.
pub struct StationResolver<'a> {
    stations: &'a StationTable,
    aliases: &'a AliasTable,
    matcher: &'a dyn NameMatcher,
    min_similarity: f64,
}

impl<'a> StationResolver<'a> {
    pub fn new(
        stations: &'a StationTable,
        aliases: &'a AliasTable,
        matcher: &'a dyn NameMatcher,
        min_similarity: f64,
    ) -> Self {
        Self {
            stations,
            aliases,
            matcher,
            min_similarity,
        }
    }

    /// Returns the unresolved (empty) code when nothing is close enough. That's not an error; the
    /// ride just won't be priced.
    pub fn resolve(&self, raw: &str) -> StationCode {
        let name = raw.trim();
        if name.is_empty() {
            return StationCode::unresolved();
        }

        if let Some(canonical) = self.aliases.canonical(name) {
            if let Some(code) = self.stations.code(canonical) {
                return code.clone();
            }
        }
        if let Some(code) = self.stations.code(name) {
            return code.clone();
        }

        let names = self.stations.names();
        match self.matcher.best_match(name, names) {
            Some((idx, score)) if score > self.min_similarity => match names.get(idx) {
                Some(matched) => {
                    debug!("Matched {name:?} to {matched:?} ({score:.2})");
                    self.stations.code(matched).cloned().unwrap_or_default()
                }
                None => {
                    warn!("Station matcher returned out-of-range candidate {idx} for {name:?}");
                    StationCode::unresolved()
                }
            },
            Some((idx, score)) => {
                debug!(
                    "Nothing close to {name:?}; best was {:?} ({score:.2})",
                    names.get(idx)
                );
                StationCode::unresolved()
            }
            None => StationCode::unresolved(),
        }
    }
}
