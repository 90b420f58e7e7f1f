use chrono::NaiveDateTime;
use serde::Serialize;

use reference::{Fare, FareTable, Money, StationCode};

use crate::{Description, EngineConfig, LogOrder, Operator, StationResolver, Tap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Mode {
    Metrorail,
    Metrobus,
}

/// A reconstructed journey: one bus boarding, or a rail entry paired with its exit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ride {
    pub mode: Mode,
    pub peak: bool,
    /// For buses, whatever the route resolved to (usually nothing)
    pub entry: StationCode,
    /// Only missing when the entry tap couldn't be found
    pub entry_time: Option<NaiveDateTime>,
    /// Always unresolved for buses
    pub exit: StationCode,
    pub exit_time: Option<NaiveDateTime>,
    pub fare: Fare,
    /// What the card was actually debited for this ride, according to the export
    pub charged: Money,
    /// Two rail legs joined by the interchange walk
    pub transferred: bool,
}

/// Pairs up taps into rides. The result is always sorted oldest-first, whatever order the log was
/// in; collapsing transfers depends on that.
pub fn reconstruct(
    taps: &[Tap],
    resolver: &StationResolver,
    fares: &FareTable,
    config: &EngineConfig,
) -> Vec<Ride> {
    let mut rides = Vec::new();
    let mut degraded = 0;
    for (idx, tap) in taps.iter().enumerate() {
        match (tap.operator, tap.description) {
            (Operator::Metrobus, Description::Entry | Description::Exit) => {
                rides.push(bus_ride(tap, resolver, config));
            }
            (Operator::Metrorail, Description::Exit) => {
                let entry = entry_for_exit(taps, idx, config.log_order);
                if entry.is_none() {
                    degraded += 1;
                }
                rides.push(rail_ride(entry, tap, resolver, fares, config));
            }
            _ => {}
        }
    }

    if config.log_order == LogOrder::Descending {
        rides.reverse();
    }
    info!(
        "Reconstructed {} rides from {} taps ({} rail exits without a matching entry)",
        rides.len(),
        taps.len(),
        degraded
    );
    rides
}

fn bus_ride(tap: &Tap, resolver: &StationResolver, config: &EngineConfig) -> Ride {
    Ride {
        mode: Mode::Metrobus,
        peak: tap.time.map(|t| config.peak.is_peak(t)).unwrap_or(false),
        entry: resolver.resolve(&tap.entry_location),
        entry_time: tap.time,
        exit: StationCode::unresolved(),
        exit_time: None,
        fare: Fare::Priced(config.bus_fare),
        charged: tap.change.max(Money::ZERO),
        transferred: false,
    }
}

/// If `entry` is None, the exit tap stands in for its own entry.
fn rail_ride(
    entry: Option<&Tap>,
    exit: &Tap,
    resolver: &StationResolver,
    fares: &FareTable,
    config: &EngineConfig,
) -> Ride {
    let reference = entry.unwrap_or(exit);
    // Exit rows repeat where the ride started, so fall back to that
    let entry_location = if reference.entry_location.is_empty() {
        &exit.entry_location
    } else {
        &reference.entry_location
    };
    let peak = reference
        .time
        .map(|t| config.peak.is_peak(t))
        .unwrap_or(false);
    let entry_code = resolver.resolve(entry_location);
    let exit_code = resolver.resolve(&exit.exit_location);
    let fare = fares.fare(&entry_code, &exit_code, peak);

    Ride {
        mode: Mode::Metrorail,
        peak,
        entry: entry_code,
        entry_time: entry.and_then(|tap| tap.time),
        exit: exit_code,
        exit_time: exit.time,
        fare,
        charged: exit.change.max(Money::ZERO),
        transferred: false,
    }
}

/// The entry tap is the neighbor that comes before the exit in time. Anything else next to the
/// exit means the log isn't in the order we think, or the entry is missing.
fn entry_for_exit(taps: &[Tap], exit_idx: usize, order: LogOrder) -> Option<&Tap> {
    let exit = &taps[exit_idx];
    let neighbor = match order {
        LogOrder::Ascending => exit_idx.checked_sub(1).and_then(|idx| taps.get(idx)),
        LogOrder::Descending => taps.get(exit_idx + 1),
    };
    let Some(entry) = neighbor else {
        debug!("Exit at {} is the last tap; no entry for it", exit.raw_time);
        return None;
    };
    if entry.operator != Operator::Metrorail || entry.description != Description::Entry {
        debug!(
            "Exit at {} isn't next to a rail entry; pricing it from the exit alone",
            exit.raw_time
        );
        return None;
    }
    if let (Some(entered), Some(exited)) = (entry.time, exit.time) {
        if entered > exited {
            warn!(
                "Entry at {} comes after exit at {}. Is the log really sorted {:?}?",
                entry.raw_time, exit.raw_time, order
            );
            return None;
        }
    }
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{test_reference, HEADER};
    use crate::{taps, LevenshteinMatcher};
    use chrono::NaiveDate;
    use reference::{ReferenceData, UnpricedReason};

    fn run(data: &ReferenceData, text: &str, config: &EngineConfig) -> Vec<Ride> {
        let resolver = StationResolver::new(
            &data.stations,
            &data.aliases,
            &LevenshteinMatcher,
            config.min_similarity,
        );
        reconstruct(&taps::parse(text), &resolver, &data.fares, config)
    }

    fn at(day: u32, hour: u32, minute: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
    }

    fn code(x: &str) -> StationCode {
        StationCode::new(x)
    }

    #[test]
    fn test_descending_pair() {
        let data = test_reference();
        let text = format!(
            "{HEADER}\n\
             03/04/25 08:25 AM,Exit,Metrorail,Dupont Circle,Metro Center,($2.50)\n\
             03/04/25 08:10 AM,Entry,Metrorail,Dupont Circle,,$0.00\n"
        );
        let rides = run(&data, &text, &EngineConfig::default());
        assert_eq!(
            rides,
            vec![Ride {
                mode: Mode::Metrorail,
                peak: true,
                entry: code("A03"),
                entry_time: at(4, 8, 10),
                exit: code("A01"),
                exit_time: at(4, 8, 25),
                fare: Fare::Priced(Money::cents(250)),
                charged: Money::cents(250),
                transferred: false,
            }]
        );
    }

    #[test]
    fn test_ascending_pair() {
        let data = test_reference();
        let text = format!(
            "{HEADER}\n\
             03/04/25 08:10 AM,Entry,Metrorail,Dupont Circle,\n\
             03/04/25 08:25 AM,Exit,Metrorail,Dupont Circle,Metro Center\n"
        );
        let config = EngineConfig {
            log_order: LogOrder::Ascending,
            ..Default::default()
        };
        let rides = run(&data, &text, &config);
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].entry_time, at(4, 8, 10));
        assert_eq!(rides[0].fare, Fare::Priced(Money::cents(250)));
    }

    #[test]
    fn test_peak_comes_from_the_entry() {
        let data = test_reference();
        // Tuesday: enters during peak, exits after it ends
        let text = format!(
            "{HEADER}\n\
             03/04/25 09:40 PM,Exit,Metrorail,Dupont Circle,Metro Center\n\
             03/04/25 09:20 PM,Entry,Metrorail,Dupont Circle,\n"
        );
        let rides = run(&data, &text, &EngineConfig::default());
        assert!(rides[0].peak);
        assert_eq!(rides[0].fare, Fare::Priced(Money::cents(250)));
    }

    #[test]
    fn test_exit_without_entry() {
        let data = test_reference();
        let text = format!(
            "{HEADER}\n\
             03/08/25 02:00 PM,Exit,Metrorail,Metro Center,Dupont Circle\n\
             03/08/25 01:00 PM,Add Value,Sales Device,,,$20.00\n"
        );
        let rides = run(&data, &text, &EngineConfig::default());
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].entry, code("A01"));
        assert_eq!(rides[0].entry_time, None);
        assert_eq!(rides[0].exit_time, at(8, 14, 0));
        // Saturday
        assert!(!rides[0].peak);
        assert_eq!(rides[0].fare, Fare::Priced(Money::cents(200)));
        assert_eq!(rides[0].charged, Money::ZERO);
    }

    #[test]
    fn test_exit_as_the_last_row() {
        let data = test_reference();
        let text = format!("{HEADER}\n03/04/25 08:25 AM,Exit,Metrorail,Dupont Circle,Metro Center\n");
        let rides = run(&data, &text, &EngineConfig::default());
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].entry_time, None);
        assert!(rides[0].peak);
    }

    #[test]
    fn test_wrong_order_degrades() {
        let data = test_reference();
        // Really ascending, but treated as descending: the "entry" after the exit happens later
        let text = format!(
            "{HEADER}\n\
             03/04/25 08:25 AM,Exit,Metrorail,Dupont Circle,Metro Center\n\
             03/04/25 08:40 AM,Entry,Metrorail,Metro Center,\n"
        );
        let rides = run(&data, &text, &EngineConfig::default());
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].entry_time, None);
        assert_eq!(rides[0].entry, code("A03"));
    }

    #[test]
    fn test_bus() {
        let data = test_reference();
        let text = format!("{HEADER}\n03/04/25 12:10 PM,Entry,Metrobus,D6,,($2.25)\n");
        let rides = run(&data, &text, &EngineConfig::default());
        assert_eq!(
            rides,
            vec![Ride {
                mode: Mode::Metrobus,
                peak: true,
                entry: StationCode::unresolved(),
                entry_time: at(4, 12, 10),
                exit: StationCode::unresolved(),
                exit_time: None,
                fare: Fare::Priced(Money::cents(225)),
                charged: Money::cents(225),
                transferred: false,
            }]
        );
    }

    #[test]
    fn test_bus_top_up_isnt_a_ride() {
        let data = test_reference();
        let text = format!("{HEADER}\n03/04/25 12:10 PM,Add Value,Metrobus,D6,,$20.00\n");
        assert!(run(&data, &text, &EngineConfig::default()).is_empty());
    }

    #[test]
    fn test_taps_without_rides() {
        let data = test_reference();
        let text = format!(
            "{HEADER}\n\
             03/04/25 08:10 AM,Entry,Metrorail,Dupont Circle,\n\
             03/04/25 07:00 AM,Add Value,Sales Device,,,$20.00\n\
             03/04/25 06:00 AM,Entry,DASH,AT2,,($2.00)\n"
        );
        assert!(run(&data, &text, &EngineConfig::default()).is_empty());
    }

    #[test]
    fn test_unresolved_station_is_unpriced() {
        let data = test_reference();
        let text = format!(
            "{HEADER}\n\
             03/04/25 08:25 AM,Exit,Metrorail,Dupont Circle,Zzyzx Road\n\
             03/04/25 08:10 AM,Entry,Metrorail,Dupont Circle,\n"
        );
        let rides = run(&data, &text, &EngineConfig::default());
        assert_eq!(rides[0].exit, StationCode::unresolved());
        assert_eq!(
            rides[0].fare,
            Fare::Unpriced(UnpricedReason::UnresolvedStation)
        );
    }

    #[test]
    fn test_output_is_oldest_first() {
        let data = test_reference();
        let text = format!(
            "{HEADER}\n\
             03/04/25 06:05 PM,Exit,Metrorail,Metro Center,Dupont Circle\n\
             03/04/25 05:50 PM,Entry,Metrorail,Metro Center,\n\
             03/04/25 12:10 PM,Entry,Metrobus,D6,\n\
             03/04/25 08:25 AM,Exit,Metrorail,Dupont Circle,Metro Center\n\
             03/04/25 08:10 AM,Entry,Metrorail,Dupont Circle,\n"
        );
        let rides = run(&data, &text, &EngineConfig::default());
        let modes: Vec<Mode> = rides.iter().map(|r| r.mode).collect();
        assert_eq!(modes, vec![Mode::Metrorail, Mode::Metrobus, Mode::Metrorail]);
        assert_eq!(rides[0].entry, code("A03"));
        assert_eq!(rides[2].entry, code("A01"));
        assert_eq!(rides[2].exit, code("A03"));
    }
}
