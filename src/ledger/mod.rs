//! Stage ledger
//!
//! One bit per pair per stage. Summarises where the pairs of a barcode sit
//! in the state machine without holding on to the trackers.

use crate::engine::PairedSearchEngine;
use crate::tracker::{PairStage, ProgressTracker};
use bitvec::prelude::*;

/// Number of pairs in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    /// Pairs waiting for the paired search.
    pub searching: usize,
    /// Pairs waiting for paired scoring.
    pub scoring: usize,
    /// Pairs waiting for single-end fallback.
    pub fallback: usize,
    /// Resolved pairs.
    pub resolved: usize,
}

impl StageCounts {
    /// Pairs not yet resolved.
    pub fn pending(&self) -> usize {
        self.searching + self.scoring + self.fallback
    }

    /// Total pairs.
    pub fn total(&self) -> usize {
        self.pending() + self.resolved
    }
}

/// Per-stage membership bitsets for one barcode.
#[derive(Debug, Clone)]
pub struct StageLedger {
    members: [BitVec; 4],
    num_pairs: usize,
}

impl StageLedger {
    /// Ledger for `num_pairs` pairs, all in `PairSearching`.
    pub fn new(num_pairs: usize) -> Self {
        let mut ledger = Self {
            members: [
                bitvec![0; num_pairs],
                bitvec![0; num_pairs],
                bitvec![0; num_pairs],
                bitvec![0; num_pairs],
            ],
            num_pairs,
        };
        for idx in 0..num_pairs {
            ledger.mark(idx, PairStage::PairSearching);
        }
        ledger
    }

    /// Snapshot the stages of a barcode's trackers.
    pub fn from_trackers<E: PairedSearchEngine>(trackers: &[ProgressTracker<E>]) -> Self {
        Self::from_stages(trackers.iter().map(ProgressTracker::stage))
    }

    /// Build from an ordered sequence of stages.
    pub fn from_stages<I>(stages: I) -> Self
    where
        I: IntoIterator<Item = PairStage>,
    {
        let stages: Vec<PairStage> = stages.into_iter().collect();
        let mut ledger = Self::new(stages.len());
        for (idx, stage) in stages.into_iter().enumerate() {
            ledger.mark(idx, stage);
        }
        ledger
    }

    /// Record that pair `idx` is now in `stage`.
    pub fn mark(&mut self, idx: usize, stage: PairStage) {
        for bits in &mut self.members {
            bits.set(idx, false);
        }
        self.members[stage.ordinal()].set(idx, true);
    }

    /// Stage of pair `idx`.
    pub fn stage_of(&self, idx: usize) -> Option<PairStage> {
        PairStage::ALL
            .into_iter()
            .find(|stage| self.members[stage.ordinal()].get(idx).map_or(false, |bit| *bit))
    }

    /// Number of pairs in `stage`.
    pub fn count(&self, stage: PairStage) -> usize {
        self.members[stage.ordinal()].count_ones()
    }

    /// Indices of the pairs in `stage`, ascending.
    pub fn indices(&self, stage: PairStage) -> Vec<usize> {
        self.members[stage.ordinal()].iter_ones().collect()
    }

    /// Whether every pair is resolved.
    pub fn all_resolved(&self) -> bool {
        self.count(PairStage::Resolved) == self.num_pairs
    }

    /// Pairs per stage.
    pub fn completion_stats(&self) -> StageCounts {
        StageCounts {
            searching: self.count(PairStage::PairSearching),
            scoring: self.count(PairStage::PairScoring),
            fallback: self.count(PairStage::SingleFallback),
            resolved: self.count(PairStage::Resolved),
        }
    }

    /// Number of pairs tracked.
    pub fn len(&self) -> usize {
        self.num_pairs
    }

    /// Whether the ledger tracks no pairs.
    pub fn is_empty(&self) -> bool {
        self.num_pairs == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ledger_starts_searching() {
        let ledger = StageLedger::new(3);
        assert_eq!(ledger.count(PairStage::PairSearching), 3);
        assert!(!ledger.all_resolved());
    }

    #[test]
    fn mark_moves_pair_between_stages() {
        let mut ledger = StageLedger::new(2);
        ledger.mark(1, PairStage::SingleFallback);
        assert_eq!(ledger.stage_of(1), Some(PairStage::SingleFallback));
        assert_eq!(ledger.indices(PairStage::SingleFallback), vec![1]);
        ledger.mark(1, PairStage::Resolved);
        let stats = ledger.completion_stats();
        assert_eq!(stats.searching, 1);
        assert_eq!(stats.fallback, 0);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.total(), 2);
    }

    #[test]
    fn empty_barcode_is_resolved() {
        let ledger = StageLedger::from_stages(std::iter::empty());
        assert!(ledger.is_empty());
        assert!(ledger.all_resolved());
    }
}
