use reference::FareTable;

use crate::{Interchange, Mode, Ride};

/// Merges pairs of rail rides joined by a walk between the two sides of the interchange into one
/// ride, priced from where the first started to where the second ended.
///
/// The input must be sorted oldest-first. Each ride absorbs at most one earlier ride, and absorbed
/// rides don't appear in the output. Everything else passes through unchanged, in order.
pub fn collapse(rides: Vec<Ride>, fares: &FareTable, interchange: &Interchange) -> Vec<Ride> {
    let mut absorbed = vec![false; rides.len()];
    let mut replacements: Vec<Option<Ride>> = vec![None; rides.len()];

    // Newest first, so partners are always among the rides not visited yet
    for idx in (0..rides.len()).rev() {
        if absorbed[idx] {
            continue;
        }
        if let Some(partner) = find_partner(&rides, &absorbed, idx, interchange) {
            absorbed[partner] = true;
            replacements[idx] = Some(join(&rides[partner], &rides[idx], fares));
        }
    }

    let collapsed = absorbed.iter().filter(|x| **x).count();
    if collapsed > 0 {
        info!("Collapsed {collapsed} interchange transfers");
    }

    let mut output = Vec::with_capacity(rides.len() - collapsed);
    for ((ride, absorbed), replacement) in rides.into_iter().zip(absorbed).zip(replacements) {
        if !absorbed {
            output.push(replacement.unwrap_or(ride));
        }
    }
    output
}

/// An earlier rail ride that exited at the other side of the interchange shortly before `idx`
/// entered.
fn find_partner(
    rides: &[Ride],
    absorbed: &[bool],
    idx: usize,
    interchange: &Interchange,
) -> Option<usize> {
    let current = &rides[idx];
    if current.mode != Mode::Metrorail {
        return None;
    }
    let entered = current.entry_time?;
    let opposite = interchange.opposite(&current.entry)?;
    let window = interchange.window();

    for candidate_idx in (0..idx).rev() {
        if absorbed[candidate_idx] {
            continue;
        }
        let candidate = &rides[candidate_idx];
        let Some(exited) = candidate.exit_time else {
            continue;
        };
        let gap = entered - exited;
        // Everything further back exited even earlier
        if gap > window {
            break;
        }
        if gap < chrono::Duration::zero() {
            continue;
        }
        if candidate.mode == Mode::Metrorail && &candidate.exit == opposite {
            return Some(candidate_idx);
        }
    }
    None
}

fn join(first: &Ride, second: &Ride, fares: &FareTable) -> Ride {
    Ride {
        mode: Mode::Metrorail,
        peak: first.peak,
        entry: first.entry.clone(),
        entry_time: first.entry_time,
        exit: second.exit.clone(),
        exit_time: second.exit_time,
        fare: fares.fare(&first.entry, &second.exit, first.peak),
        charged: first.charged + second.charged,
        transferred: true,
    }
}
