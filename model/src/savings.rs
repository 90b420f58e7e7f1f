use serde::{Deserialize, Serialize};

use reference::Money;

use crate::Ride;

/// What a travel pass costs and how much of each ride it covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassTerms {
    pub price: Money,
    /// The most the pass pays towards any one ride; the rider covers the rest. None means the
    /// pass covers every fare in full.
    pub fare_limit: Option<Money>,
}

impl PassTerms {
    pub fn uncapped(price: Money) -> Self {
        Self {
            price,
            fare_limit: None,
        }
    }

    pub fn capped(price: Money, fare_limit: Money) -> Self {
        Self {
            price,
            fare_limit: Some(fare_limit),
        }
    }

    /// What the rider still pays for a ride with this fare
    pub fn overage(&self, fare: Money) -> Money {
        match self.fare_limit {
            Some(limit) => fare.excess_over(limit),
            None => Money::ZERO,
        }
    }
}

/// Pay-per-ride versus the pass
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    /// Every fare added up, as if paying per ride
    pub total_cost: Money,
    /// The pass price plus any fare above the pass's limit
    pub total_spent: Money,
    /// Never negative. If the pass broke even, that's how much it saved; otherwise, how much more
    /// riding it'd take to break even.
    pub savings: Money,
    pub broke_even: bool,
    /// Rides counted as free because they couldn't be priced. If this isn't zero, total_cost is
    /// understated.
    pub unpriced_rides: usize,
    /// What the export says the card was actually debited for these rides
    pub recorded_charges: Money,
    pub rides: Vec<Ride>,
}

pub fn summarize(rides: Vec<Ride>, pass: &PassTerms) -> Analysis {
    let total_cost: Money = rides.iter().map(|r| r.fare.amount()).sum();
    let overage: Money = rides.iter().map(|r| pass.overage(r.fare.amount())).sum();
    let total_spent = pass.price + overage;
    let unpriced_rides = rides.iter().filter(|r| !r.fare.is_priced()).count();
    if unpriced_rides > 0 {
        warn!(
            "{unpriced_rides} of {} rides couldn't be priced and count as free",
            rides.len()
        );
    }

    Analysis {
        total_cost,
        total_spent,
        savings: total_cost.abs_diff(total_spent),
        broke_even: total_cost >= total_spent,
        unpriced_rides,
        recorded_charges: rides.iter().map(|r| r.charged).sum(),
        rides,
    }
}
