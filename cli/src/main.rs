#[macro_use]
extern crate log;

use anyhow::Result;
use structopt::StructOpt;

use model::{Analysis, EngineConfig, Mode, PassTerms, Ride};
use reference::{Fare, Money, ReferenceData};

#[derive(StructOpt)]
#[structopt(
    name = "pass_check",
    about = "Checks whether a travel pass paid for itself, given a card usage export"
)]
struct Args {
    /// The path to a card usage CSV export
    #[structopt(long)]
    usage: String,
    /// The path to the station name to code JSON file
    #[structopt(long)]
    stations: String,
    /// The path to a JSON file mapping fare gate labels to station names
    #[structopt(long)]
    aliases: Option<String>,
    /// The path to the station-to-station fares JSON file
    #[structopt(long)]
    fares: String,
    /// What the pass costs
    #[structopt(long)]
    pass_price: Money,
    /// The most the pass pays towards one ride. Without this, the pass covers every fare.
    #[structopt(long)]
    fare_limit: Option<Money>,
    /// A JSON file overriding the engine's defaults
    #[structopt(long)]
    config: Option<String>,
    /// Print the full analysis, including every ride, as JSON
    #[structopt(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::from_args();
    let reference = ReferenceData::load(&args.stations, args.aliases.as_deref(), &args.fares)?;
    let config = match args.config {
        Some(ref path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let pass = PassTerms {
        price: args.pass_price,
        fare_limit: args.fare_limit,
    };

    let usage = fs_err::read_to_string(&args.usage)?;
    let analysis = model::analyze(&usage, &pass, &reference, &config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        for ride in &analysis.rides {
            println!("{}", describe_ride(ride));
        }
        println!();
        println!("{}", describe_analysis(&analysis, &pass));
        if analysis.unpriced_rides > 0 {
            warn!("Some stations didn't match; try adding gate aliases");
        }
    }
    Ok(())
}

fn describe_ride(ride: &Ride) -> String {
    let when = ride
        .entry_time
        .or(ride.exit_time)
        .map(|t| t.format("%a %Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    let period = if ride.peak { "peak" } else { "off-peak" };
    let fare = match ride.fare {
        Fare::Priced(x) => x.to_string(),
        Fare::Unpriced(reason) => format!("unpriced ({reason:?})"),
    };
    match ride.mode {
        Mode::Metrobus => format!("{when}  bus                {period:8}  {fare}"),
        Mode::Metrorail => {
            let transfer = if ride.transferred { " (transfer)" } else { "" };
            format!(
                "{when}  rail {} -> {}{transfer}  {period:8}  {fare}",
                ride.entry, ride.exit
            )
        }
    }
}

fn describe_analysis(analysis: &Analysis, pass: &PassTerms) -> String {
    let mut lines = vec![
        format!(
            "{} rides would have cost {} paying per ride",
            analysis.rides.len(),
            analysis.total_cost
        ),
        format!(
            "With the {} pass{}, you spent {}",
            pass.price,
            match pass.fare_limit {
                Some(limit) => format!(" (covering up to {limit} per ride)"),
                None => String::new(),
            },
            analysis.total_spent
        ),
    ];
    if analysis.recorded_charges > Money::ZERO {
        lines.push(format!(
            "The card was actually debited {} for these rides",
            analysis.recorded_charges
        ));
    }
    if analysis.unpriced_rides > 0 {
        lines.push(format!(
            "{} rides couldn't be priced and were counted as free, so the pay-per-ride cost is too \
             low",
            analysis.unpriced_rides
        ));
    }
    if analysis.broke_even {
        lines.push(format!("The pass saved you {}", analysis.savings));
    } else {
        lines.push(format!(
            "The pass hasn't broken even. You'd need {} more in fares to get there",
            analysis.savings
        ));
    }
    lines.join("\n")
}
