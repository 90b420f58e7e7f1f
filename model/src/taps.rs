use chrono::NaiveDateTime;
use csv::ByteRecord;

use reference::Money;

/// One row of a card usage export: a single reader event.
#[derive(Clone, Debug, PartialEq)]
pub struct Tap {
    /// As printed, for logging
    pub raw_time: String,
    /// None if the timestamp couldn't be parsed
    pub time: Option<NaiveDateTime>,
    pub description: Description,
    pub operator: Operator,
    /// For bus boardings, this is the route
    pub entry_location: String,
    pub exit_location: String,
    /// What the card was debited. Negative when value was added.
    pub change: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Description {
    Entry,
    Exit,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Metrorail,
    Metrobus,
    Other,
}

// Tried in order. The export itself uses the first.
const TIME_FORMATS: [&str; 5] = [
    "%m/%d/%y %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%y %H:%M",
];

/// Parses a usage export. The first line must be a header. Every other row becomes a tap, in the
/// same order; missing fields are just empty. Nothing here fails, so a mangled export still
/// produces a best-effort analysis.
pub fn parse(text: &str) -> Vec<Tap> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let columns = match reader.byte_headers() {
        Ok(headers) => Columns::from_headers(headers),
        Err(err) => {
            warn!("Couldn't read the header row, assuming the usual column order: {err}");
            Columns::default()
        }
    };

    let mut taps = Vec::new();
    for rec in reader.byte_records() {
        match rec {
            Ok(rec) => taps.push(columns.tap(&rec)),
            Err(err) => warn!("Unreadable row in usage export: {err}"),
        }
    }
    debug!("Parsed {} taps", taps.len());
    taps
}

struct Columns {
    time: usize,
    description: usize,
    operator: usize,
    entry_location: usize,
    exit_location: usize,
    change: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            time: 0,
            description: 1,
            operator: 2,
            entry_location: 3,
            exit_location: 4,
            change: 5,
        }
    }
}

impl Columns {
    fn from_headers(headers: &ByteRecord) -> Self {
        let headers: Vec<String> = headers
            .iter()
            .map(|h| String::from_utf8_lossy(h).to_lowercase())
            .collect();
        let find = |names: &[&str], fallback: usize| {
            headers
                .iter()
                .position(|h| names.iter().any(|name| h == name))
                .unwrap_or_else(|| {
                    debug!("No {:?} column, using column {fallback}", names[0]);
                    fallback
                })
        };

        let default = Columns::default();
        Self {
            time: find(&["time", "timestamp"], default.time),
            description: find(&["description"], default.description),
            operator: find(&["operator"], default.operator),
            entry_location: find(
                &[
                    "entry location/ bus route",
                    "entry location/bus route",
                    "entry location",
                ],
                default.entry_location,
            ),
            exit_location: find(&["exit location"], default.exit_location),
            change: find(&["change (+/-)", "change"], default.change),
        }
    }

    fn tap(&self, rec: &ByteRecord) -> Tap {
        let field = |idx: usize| {
            rec.get(idx)
                .map(|x| String::from_utf8_lossy(x).into_owned())
                .unwrap_or_default()
        };

        let raw_time = field(self.time);
        let time = parse_time(&raw_time);
        if time.is_none() && !raw_time.is_empty() {
            debug!("Couldn't parse tap time {raw_time:?}");
        }
        Tap {
            time,
            raw_time,
            description: match field(self.description).to_lowercase().as_str() {
                "entry" => Description::Entry,
                "exit" => Description::Exit,
                _ => Description::Other,
            },
            operator: match field(self.operator).to_lowercase().as_str() {
                "metrorail" => Operator::Metrorail,
                "metrobus" => Operator::Metrobus,
                _ => Operator::Other,
            },
            entry_location: field(self.entry_location),
            exit_location: field(self.exit_location),
            change: parse_change(&field(self.change)),
        }
    }
}

pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// "($2.25)" is a debit, "$10.00" is value added. Anything else counts as no change.
fn parse_change(raw: &str) -> Money {
    let raw = raw.trim();
    if let Some(debit) = raw.strip_prefix('(').and_then(|x| x.strip_suffix(')')) {
        return debit.parse().unwrap_or(Money::ZERO);
    }
    match raw.parse::<Money>() {
        Ok(credit) => Money::ZERO - credit,
        Err(_) => Money::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str =
        "Time,Description,Operator,Entry Location/ Bus Route,Exit Location,Change (+/-),Balance";

    #[test]
    fn test_rows_in_order() {
        let text = format!(
            "{HEADER}\n\
             03/04/25 06:05 PM,Exit,Metrorail,Metro Center,Dupont Circle,($2.25),$10.00\n\
             03/04/25 05:50 PM,Entry,Metrorail,Metro Center,,$0.00,$12.25\n\
             03/04/25 12:10 PM,Entry,Metrobus,D6,,($2.25),$12.25\n"
        );
        let taps = parse(&text);
        assert_eq!(taps.len(), 3);

        assert_eq!(taps[0].description, Description::Exit);
        assert_eq!(taps[0].operator, Operator::Metrorail);
        assert_eq!(taps[0].entry_location, "Metro Center");
        assert_eq!(taps[0].exit_location, "Dupont Circle");
        assert_eq!(taps[0].change, Money::cents(225));
        assert_eq!(
            taps[0].time,
            Some(
                NaiveDate::from_ymd_opt(2025, 3, 4)
                    .unwrap()
                    .and_hms_opt(18, 5, 0)
                    .unwrap()
            )
        );

        assert_eq!(taps[1].description, Description::Entry);
        assert_eq!(taps[1].exit_location, "");
        assert_eq!(taps[1].change, Money::ZERO);

        assert_eq!(taps[2].operator, Operator::Metrobus);
        assert_eq!(taps[2].entry_location, "D6");
    }

    #[test]
    fn test_short_rows_are_kept() {
        let text = format!(
            "{HEADER}\n\
             03/04/25 06:05 PM,Exit,Metrorail\n\
             garbage\n"
        );
        let taps = parse(&text);
        assert_eq!(taps.len(), 2);
        assert_eq!(taps[0].entry_location, "");
        assert_eq!(taps[0].exit_location, "");
        assert_eq!(taps[0].change, Money::ZERO);

        assert_eq!(taps[1].raw_time, "garbage");
        assert_eq!(taps[1].time, None);
        assert_eq!(taps[1].description, Description::Other);
        assert_eq!(taps[1].operator, Operator::Other);
    }

    #[test]
    fn test_columns_found_by_name() {
        let text = "Operator,Exit Location,Time,Description,Entry Location\n\
                    Metrorail,Rosslyn,2025-03-04 08:30:00,Exit,Farragut West\n";
        let taps = parse(text);
        assert_eq!(taps.len(), 1);
        assert_eq!(taps[0].operator, Operator::Metrorail);
        assert_eq!(taps[0].description, Description::Exit);
        assert_eq!(taps[0].entry_location, "Farragut West");
        assert_eq!(taps[0].exit_location, "Rosslyn");
        assert!(taps[0].time.is_some());
    }

    #[test]
    fn test_unknown_headers_use_positions() {
        let text = "a,b,c,d,e\n03/04/25 8:30 AM,Exit,Metrorail,Farragut West,Rosslyn\n";
        let taps = parse(text);
        assert_eq!(taps[0].description, Description::Exit);
        assert_eq!(taps[0].entry_location, "Farragut West");
        assert_eq!(taps[0].exit_location, "Rosslyn");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse(HEADER).is_empty());
    }

    #[test]
    fn test_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap();
        for raw in [
            "03/04/25 09:30 PM",
            "03/04/25 9:30 pm",
            "03/04/2025 09:30 PM",
            "2025-03-04 21:30:00",
            "2025-03-04 21:30",
            "03/04/25 21:30",
        ] {
            assert_eq!(parse_time(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_time("yesterday"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_change() {
        assert_eq!(parse_change("($2.25)"), Money::cents(225));
        assert_eq!(parse_change("$20.00"), Money::cents(-2000));
        assert_eq!(parse_change("$0.00"), Money::ZERO);
        assert_eq!(parse_change(""), Money::ZERO);
        assert_eq!(parse_change("n/a"), Money::ZERO);
    }
}
