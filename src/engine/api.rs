use std::fmt::Debug;

use crate::genomics::{
    BufferOutcome, Direction, GenomeLocation, PairedAlignmentResult, Read, ReadPair,
    SingleAlignmentResult, NUM_READS_PER_PAIR,
};

/// Limits applied when enumerating secondary alignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryParams {
    /// Maximum edit distance above the best hit for a secondary to be kept.
    pub max_edit_distance: u32,
    /// Maximum number of secondaries to return, `None` for no limit.
    pub max_to_return: Option<usize>,
}

impl SecondaryParams {
    /// Effective cap on returned secondaries.
    pub fn limit(&self) -> usize {
        self.max_to_return.unwrap_or(usize::MAX)
    }
}

/// Statistics produced by paired scoring and consumed by finalization.
///
/// The cluster aligner threads this through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScoringState {
    /// Combined score of the best pair.
    pub best_pair_score: u32,
    /// Per-mate location of the best pair.
    pub best_location: [GenomeLocation; NUM_READS_PER_PAIR],
    /// Per-mate strand of the best pair.
    pub best_direction: [Direction; NUM_READS_PER_PAIR],
    /// Summed probability of every candidate pair.
    pub probability_of_all_pairs: f64,
    /// Per-mate score of the best pair.
    pub best_score: [u32; NUM_READS_PER_PAIR],
    /// Probability of the best pair.
    pub probability_of_best_pair: f64,
}

impl Default for PairScoringState {
    fn default() -> Self {
        Self {
            // No pair scored yet.
            best_pair_score: 65536,
            best_location: [GenomeLocation::default(); NUM_READS_PER_PAIR],
            best_direction: [Direction::Forward; NUM_READS_PER_PAIR],
            probability_of_all_pairs: 0.0,
            best_score: [0; NUM_READS_PER_PAIR],
            probability_of_best_pair: 0.0,
        }
    }
}

/// Exposes the genome location a resumable cursor points at.
///
/// The cluster aligner reads this only to aggregate barcode-level anchors.
pub trait ClusterAnchor {
    /// Location of the next candidate, if any.
    fn anchor(&self) -> Option<GenomeLocation>;
}

/// Phased, resumable paired-end search bound to a single read pair.
pub trait PairedSearchEngine {
    /// Edit-distance cache shared by every pair of a barcode.
    type Cache;
    /// Resumable search position.
    type Cursor: ClusterAnchor + Clone + Debug;

    /// Start or resume the seed search. Returns `true` when candidates remain
    /// to be scored.
    fn search(&mut self, pair: &ReadPair, cache: &mut Self::Cache, seeds_skipped: &mut u32)
        -> bool;

    /// Prepare the second search phase. Returns `true` when it has work.
    fn init_second_phase(&mut self) -> bool;

    /// Current resumable cursor.
    fn cursor(&self) -> Self::Cursor;

    /// Steer the remaining search toward `target`.
    fn advance_to_target(&mut self, cursor: &Self::Cursor, target: GenomeLocation);

    /// Score candidate pairs and enumerate secondaries into `secondary`,
    /// reporting [`BufferOutcome::Overflow`] when more than `capacity` exist.
    fn score(
        &mut self,
        cache: &mut Self::Cache,
        params: &SecondaryParams,
        secondary: &mut Vec<PairedAlignmentResult>,
        capacity: usize,
        seeds_skipped: u32,
    ) -> BufferOutcome<PairScoringState>;

    /// Write the best pair into `primary` using the scoring statistics.
    #[allow(clippy::too_many_arguments)]
    fn finalize(
        &mut self,
        pair: &ReadPair,
        cache: &mut Self::Cache,
        primary: &mut PairedAlignmentResult,
        params: &SecondaryParams,
        secondary: &mut Vec<PairedAlignmentResult>,
        seeds_skipped: u32,
        state: &PairScoringState,
    );
}

/// Aligns one read independently of its mate.
pub trait SingleEndAligner {
    /// Cache type, shared with the paired engines of the barcode.
    type Cache;

    /// Align `read`, writing secondaries into `secondary` up to `capacity`.
    fn align_read(
        &mut self,
        read: &Read,
        cache: &mut Self::Cache,
        params: &SecondaryParams,
        secondary: &mut Vec<SingleAlignmentResult>,
        capacity: usize,
    ) -> BufferOutcome<SingleAlignmentResult>;
}
