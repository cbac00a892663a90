//! Pure peer-to-peer stake matcher.
//!
//! ```text
//! run_matching_pass(&mut BetBook, side_a) -> Vec<Match>
//! ```
//!
//! No ledger I/O, no clock beyond match timestamps. Given the same book, the
//! same pass produces the same fills with the same deterministic ids.
//!
//! ## Ordering
//!
//! Unmatched remainders on each side are sorted ascending by remaining
//! amount, ties broken by ascending account id. Each side-A entry then
//! walks side-B entries in that order, so small stakes clear first and
//! large stakes absorb whatever is left.
//!
//! ## Self-Match Prevention
//!
//! An account holding stakes on both sides is never paired with itself.
//! The side-A entry skips that candidate and continues down the list.

use spinmatch_types::{Match, Side};
use tracing::debug;

use crate::BetBook;

/// Match every unmatched remainder on `side_a` against the opposite side.
///
/// ## Algorithm
///
/// 1. Collect `(index, remaining)` for both sides
/// 2. Sort each ascending by remaining, then by account id
/// 3. For each A entry, scan B entries skipping self-pairs and exhausted ones
/// 4. Fill `min(remaining_a, remaining_b)`, record a [`Match`]
/// 5. Stop scanning once A is exhausted or B has no more candidates
///
/// Returns only the matches created by this pass. A second pass with no new
/// stakes returns an empty vector and leaves the book untouched.
pub fn run_matching_pass(book: &mut BetBook, side_a: Side) -> Vec<Match> {
    let mut a_entries = book.unmatched(side_a);
    let mut b_entries = book.unmatched(side_a.opposite());
    if a_entries.is_empty() || b_entries.is_empty() {
        return Vec::new();
    }

    sort_remainders(book, &mut a_entries);
    sort_remainders(book, &mut b_entries);

    let first_new = book.matches().len();

    for (a_idx, a_remaining) in &mut a_entries {
        for (b_idx, b_remaining) in &mut b_entries {
            if *a_remaining == 0 {
                break;
            }
            if *b_remaining == 0 {
                continue;
            }
            if book.bet_at(*a_idx).account == book.bet_at(*b_idx).account {
                continue;
            }

            let fill = (*a_remaining).min(*b_remaining);
            let m = book.apply_fill(*a_idx, *b_idx, fill);
            debug!(round = %m.round_id, %m, "stake matched");

            *a_remaining -= fill;
            *b_remaining -= fill;
        }
    }

    let created = book.matches()[first_new..].to_vec();
    if !created.is_empty() {
        debug!(
            round = %book.round_id(),
            side = %side_a,
            matches = created.len(),
            "matching pass complete"
        );
    }
    created
}

fn sort_remainders(book: &BetBook, entries: &mut [(usize, u64)]) {
    entries.sort_by(|(ia, ra), (ib, rb)| {
        ra.cmp(rb)
            .then_with(|| book.bet_at(*ia).account.cmp(&book.bet_at(*ib).account))
    });
}
