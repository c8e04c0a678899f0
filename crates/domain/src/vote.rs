//! Vote tally rules.
//!
//! Two deliberate choices, both matching the server's resolution:
//! - the most-voted candidate is selected with a strict `>` comparison, so a
//!   tie keeps the first-seen maximum (no runoff);
//! - majority execution requires strictly more than half of the voters,
//!   exactly half is NOT a majority.

use crate::PlayerNo;

/// Insertion-ordered vote counts for one ballot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    // (target, count), in order of first appearance.
    counts: Vec<(PlayerNo, u32)>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tally from (voter, target) pairs, in submission order.
    pub fn from_votes<I>(votes: I) -> Self
    where
        I: IntoIterator<Item = (PlayerNo, PlayerNo)>,
    {
        let mut tally = Self::new();
        for (_voter, target) in votes {
            tally.record(target);
        }
        tally
    }

    /// Count one vote for `target`.
    pub fn record(&mut self, target: PlayerNo) {
        if let Some(entry) = self.counts.iter_mut().find(|(t, _)| *t == target) {
            entry.1 += 1;
        } else {
            self.counts.push((target, 1));
        }
    }

    pub fn total_votes(&self) -> u32 {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn count_for(&self, target: PlayerNo) -> u32 {
        self.counts
            .iter()
            .find(|(t, _)| *t == target)
            .map_or(0, |(_, n)| *n)
    }

    /// The candidate with the strict maximum count, with its count.
    ///
    /// Ties retain the first-seen maximum (strict `>` scan).
    pub fn most_voted(&self) -> Option<(PlayerNo, u32)> {
        let mut best: Option<(PlayerNo, u32)> = None;
        for (target, count) in &self.counts {
            match best {
                Some((_, max)) if *count > max => best = Some((*target, *count)),
                None => best = Some((*target, *count)),
                _ => {}
            }
        }
        best
    }

    /// Strict majority: `max_count > total_voters / 2`, evaluated without
    /// integer truncation. Exactly half is not a majority.
    pub fn is_majority(&self, total_voters: usize) -> bool {
        match self.most_voted() {
            Some((_, max)) => (max as usize) * 2 > total_voters,
            None => false,
        }
    }

    /// The player to execute, if the most-voted candidate holds a strict
    /// majority among `total_voters`.
    pub fn execution_target(&self, total_voters: usize) -> Option<PlayerNo> {
        if self.is_majority(total_voters) {
            self.most_voted().map(|(target, _)| target)
        } else {
            None
        }
    }
}
