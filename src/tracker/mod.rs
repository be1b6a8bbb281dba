//! Per-pair progress tracking
//!
//! One tracker per read pair in a barcode. It records which stage the pair
//! has reached, the engine's resumable cursor, and the result buffers, so
//! that the cluster aligner can stop at any buffer overflow and pick up
//! exactly where it left off on the next call.

use crate::engine::PairedSearchEngine;
use crate::genomics::{
    PairedAlignmentResult, ReadPair, SecondaryBuffer, SecondaryCount, SingleAlignmentResult,
    NUM_READS_PER_PAIR,
};

/// Stage of a read pair within the cluster state machine.
///
/// Stages only move forward: `PairSearching → PairScoring →
/// {Resolved | SingleFallback} → Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairStage {
    /// Waiting for the paired seed search.
    PairSearching,
    /// Search done, waiting for paired scoring.
    PairScoring,
    /// Candidate chimera, waiting for single-end alignment of its mates.
    SingleFallback,
    /// Terminal.
    Resolved,
}

impl PairStage {
    /// All stages in state-machine order.
    pub const ALL: [PairStage; 4] = [
        PairStage::PairSearching,
        PairStage::PairScoring,
        PairStage::SingleFallback,
        PairStage::Resolved,
    ];

    /// Position in [`PairStage::ALL`].
    pub fn ordinal(self) -> usize {
        match self {
            PairStage::PairSearching => 0,
            PairStage::PairScoring => 1,
            PairStage::SingleFallback => 2,
            PairStage::Resolved => 3,
        }
    }

    /// Whether the pair is finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, PairStage::Resolved)
    }
}

/// Which buffer of a tracker overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowedBuffer {
    /// The paired secondary buffer.
    Paired,
    /// The single-end buffer of one mate.
    Single(usize),
}

/// Mutable progress state of one read pair.
#[derive(Debug)]
pub struct ProgressTracker<E: PairedSearchEngine> {
    pub(crate) pair: ReadPair,
    pub(crate) engine: E,
    stage: PairStage,
    pub(crate) cursor: Option<E::Cursor>,
    pub(crate) seeds_skipped: u32,
    pub(crate) result: PairedAlignmentResult,
    pub(crate) paired_secondary: SecondaryBuffer<PairedAlignmentResult>,
    pub(crate) single_secondary: [SecondaryBuffer<SingleAlignmentResult>; NUM_READS_PER_PAIR],
    pub(crate) mate_done: [bool; NUM_READS_PER_PAIR],
    pub(crate) searches: u32,
    pub(crate) overflows: u32,
}

impl<E: PairedSearchEngine> ProgressTracker<E> {
    /// Tracker for `pair`, bound to its own `engine`, with initial buffer
    /// capacities for paired and per-mate single-end secondaries.
    pub fn new(pair: ReadPair, engine: E, paired_capacity: usize, single_capacity: usize) -> Self {
        Self {
            pair,
            engine,
            stage: PairStage::PairSearching,
            cursor: None,
            seeds_skipped: 0,
            result: PairedAlignmentResult::not_found(),
            paired_secondary: SecondaryBuffer::with_capacity(paired_capacity),
            single_secondary: [
                SecondaryBuffer::with_capacity(single_capacity),
                SecondaryBuffer::with_capacity(single_capacity),
            ],
            mate_done: [false; NUM_READS_PER_PAIR],
            searches: 0,
            overflows: 0,
        }
    }

    /// Reuse the tracker (engine and buffer capacities included) for a new pair.
    pub fn reset(&mut self, pair: ReadPair) {
        self.pair = pair;
        self.stage = PairStage::PairSearching;
        self.cursor = None;
        self.seeds_skipped = 0;
        self.result = PairedAlignmentResult::not_found();
        self.paired_secondary.clear();
        for buffer in &mut self.single_secondary {
            buffer.clear();
        }
        self.mate_done = [false; NUM_READS_PER_PAIR];
        self.searches = 0;
        self.overflows = 0;
    }

    /// The read pair being aligned.
    pub fn pair(&self) -> &ReadPair {
        &self.pair
    }

    /// Current stage.
    pub fn stage(&self) -> PairStage {
        self.stage
    }

    /// Whether the pair reached its terminal stage.
    pub fn is_resolved(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Primary result.
    pub fn result(&self) -> &PairedAlignmentResult {
        &self.result
    }

    /// Paired secondary alignments.
    pub fn paired_secondary(&self) -> &SecondaryBuffer<PairedAlignmentResult> {
        &self.paired_secondary
    }

    /// Single-end secondary alignments of one mate.
    pub fn single_secondary(&self, mate: usize) -> &SecondaryBuffer<SingleAlignmentResult> {
        &self.single_secondary[mate]
    }

    /// Resumable cursor recorded after the paired search.
    pub fn cursor(&self) -> Option<&E::Cursor> {
        self.cursor.as_ref()
    }

    /// Popular seeds the engine skipped.
    pub fn seeds_skipped(&self) -> u32 {
        self.seeds_skipped
    }

    /// Number of paired searches performed for the current pair.
    pub fn searches(&self) -> u32 {
        self.searches
    }

    /// Number of buffer overflows observed for the current pair.
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    /// The bound engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The bound engine, mutably.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Grow the paired secondary buffer.
    pub fn grow_paired_secondary(&mut self, capacity: usize) {
        self.paired_secondary.grow(capacity);
    }

    /// Grow one mate's single-end secondary buffer.
    pub fn grow_single_secondary(&mut self, mate: usize, capacity: usize) {
        self.single_secondary[mate].grow(capacity);
    }

    /// Buffers currently tagged as overflowed.
    pub fn overflowed_buffers(&self) -> Vec<OverflowedBuffer> {
        let mut overflowed = Vec::new();
        if self.paired_secondary.count().is_overflow() {
            overflowed.push(OverflowedBuffer::Paired);
        }
        for (mate, buffer) in self.single_secondary.iter().enumerate() {
            if buffer.count().is_overflow() {
                overflowed.push(OverflowedBuffer::Single(mate));
            }
        }
        overflowed
    }

    /// Tagged paired secondary count.
    pub fn paired_secondary_count(&self) -> SecondaryCount {
        self.paired_secondary.count()
    }

    pub(crate) fn advance(&mut self, next: PairStage) {
        debug_assert!(
            next.ordinal() >= self.stage.ordinal(),
            "stage moved backwards: {:?} -> {:?}",
            self.stage,
            next
        );
        self.stage = next;
    }
}
