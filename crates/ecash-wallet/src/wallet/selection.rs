//! Coin selection

use std::collections::BTreeMap;

use ecash::nuts::{Proof, Proofs, ProofsMethods};
use ecash::Amount;

use crate::Error;

/// Select proofs covering `target` with the smallest possible total
///
/// An exact sum wins over any overshoot; otherwise the smallest sufficient overshoot is taken.
/// Among subsets with the same total, fewer and larger proofs are preferred. The selection is
/// returned smallest amount first.
pub fn select_to_cover(available: Proofs, target: Amount) -> Result<Proofs, Error> {
    if available.total_amount()? < target {
        return Err(Error::InsufficientBalance);
    }

    if target == Amount::ZERO {
        return Ok(Vec::new());
    }

    let mut by_amount: BTreeMap<u64, Vec<Proof>> = BTreeMap::new();
    for proof in available.into_iter().filter(|p| p.amount > Amount::ZERO) {
        by_amount.entry(proof.amount.to_u64()).or_default().push(proof);
    }

    let goal = covering_total(&by_amount, target.to_u64()).ok_or(Error::InsufficientBalance)?;

    // Greedy from the largest denomination realizes the goal exactly
    let mut remaining = goal;
    let mut selected: Proofs = Vec::new();
    for (denomination, proofs) in by_amount.into_iter().rev() {
        let take = (proofs.len() as u64).min(remaining / denomination);
        remaining -= take * denomination;
        selected.extend(proofs.into_iter().take(take as usize));

        if remaining == 0 {
            break;
        }
    }

    if remaining != 0 {
        tracing::error!("Selection left {} of {} uncovered", remaining, goal);
        return Err(Error::InsufficientBalance);
    }

    selected.sort_by_key(|p| p.amount);

    tracing::debug!(
        "Selected {} proofs totaling {} for {}",
        selected.len(),
        goal,
        target
    );

    Ok(selected)
}

/// Smallest total of a subset that is at least `target`
///
/// Walks denominations from the largest, taking as many as fit. Every level that still has a
/// proof left gives a candidate overshoot: what was taken so far plus one more proof of it.
fn covering_total(by_amount: &BTreeMap<u64, Vec<Proof>>, target: u64) -> Option<u64> {
    let mut remaining = target;
    let mut taken = 0u64;
    let mut best_overshoot: Option<u64> = None;

    for (denomination, proofs) in by_amount.iter().rev() {
        let count = proofs.len() as u64;
        let take = count.min(remaining / denomination);

        if take < count {
            let candidate = taken + (take + 1) * denomination;
            best_overshoot = Some(best_overshoot.map_or(candidate, |best| best.min(candidate)));
        }

        taken += take * denomination;
        remaining -= take * denomination;

        if remaining == 0 {
            return Some(target);
        }
    }

    best_overshoot
}
