#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod peak;
mod resolve;
mod rides;
mod savings;
mod taps;
mod transfers;

use reference::ReferenceData;

pub use self::config::{EngineConfig, Interchange, LogOrder, BUS_FARE};
pub use self::peak::{is_peak, PeakWindow};
pub use self::resolve::{LevenshteinMatcher, NameMatcher, StationResolver};
pub use self::rides::{Mode, Ride};
pub use self::savings::{Analysis, PassTerms};
pub use self::taps::{parse_time, Description, Operator, Tap};

/// Works out whether a pass paid off, given a card usage export. Never fails: anything that can't
/// be understood is logged and skipped or priced at zero (see `Analysis::unpriced_rides`).
pub fn analyze(
    usage_csv: &str,
    pass: &PassTerms,
    reference: &ReferenceData,
    config: &EngineConfig,
) -> Analysis {
    analyze_with_matcher(usage_csv, pass, reference, config, &LevenshteinMatcher)
}

/// Like `analyze`, with a different way to fuzzy match station names.
pub fn analyze_with_matcher(
    usage_csv: &str,
    pass: &PassTerms,
    reference: &ReferenceData,
    config: &EngineConfig,
    matcher: &dyn NameMatcher,
) -> Analysis {
    let taps = taps::parse(usage_csv);
    let resolver = StationResolver::new(
        &reference.stations,
        &reference.aliases,
        matcher,
        config.min_similarity,
    );
    let rides = rides::reconstruct(&taps, &resolver, &reference.fares, config);
    let rides = transfers::collapse(rides, &reference.fares, &config.interchange);
    savings::summarize(rides, pass)
}
