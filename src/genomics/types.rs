use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of mates in a read pair.
pub const NUM_READS_PER_PAIR: usize = 2;

/// Opaque, ordered genome coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenomeLocation(u64);

impl GenomeLocation {
    /// Wrap a raw coordinate.
    pub const fn new(location: u64) -> Self {
        Self(location)
    }

    /// Raw coordinate value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Absolute distance between two coordinates.
    pub fn distance(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for GenomeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strand a read aligned to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Read matches the forward strand.
    #[default]
    Forward,
    /// Read matches the reverse complement.
    ReverseComplement,
}

impl Direction {
    /// The other strand.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::ReverseComplement,
            Direction::ReverseComplement => Direction::Forward,
        }
    }

    /// SAM-style strand character.
    pub fn symbol(self) -> char {
        match self {
            Direction::Forward => '+',
            Direction::ReverseComplement => '-',
        }
    }
}

/// Whether an alignment was found for a mate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AlignmentStatus {
    /// A terminal alignment exists.
    Found,
    /// Nothing usable was found (or the read was too short to search).
    #[default]
    NotFound,
}

impl AlignmentStatus {
    /// Convenience predicate.
    pub fn is_found(self) -> bool {
        matches!(self, AlignmentStatus::Found)
    }
}

/// One sequenced read, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    /// Read identifier.
    pub id: Arc<str>,
    /// Bases stored as uppercase ASCII.
    pub sequence: Arc<[u8]>,
}

impl Read {
    /// Construct a read from an id and its bases.
    pub fn new(id: impl Into<Arc<str>>, sequence: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }

    /// Read length in bases.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the read carries no bases.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Bases as a slice.
    pub fn bases(&self) -> &[u8] {
        &self.sequence
    }
}

/// Two mates sequenced from one molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    /// Identity shared by both mates.
    pub id: Arc<str>,
    /// Mate 0 and mate 1.
    pub mates: [Read; NUM_READS_PER_PAIR],
}

impl ReadPair {
    /// Build a pair from its identity and two mate sequences.
    pub fn new(
        id: impl Into<Arc<str>>,
        mate0: impl Into<Arc<[u8]>>,
        mate1: impl Into<Arc<[u8]>>,
    ) -> Self {
        let id: Arc<str> = id.into();
        let mates = [
            Read::new(format!("{id}/1"), mate0),
            Read::new(format!("{id}/2"), mate1),
        ];
        Self { id, mates }
    }

    /// Access one mate.
    pub fn mate(&self, which: usize) -> &Read {
        &self.mates[which]
    }
}

/// Counters reported alongside a paired result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignmentDiagnostics {
    /// Wall time spent aligning the mates together (not measured by the cluster path).
    pub nanos_in_align_together: u64,
    /// Edit-distance computations performed.
    pub lv_calls: u32,
    /// Candidate loci below the small-hit threshold.
    pub small_hits: u32,
}

/// Alignment of both mates of a pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairedAlignmentResult {
    /// Per-mate genome location.
    pub location: [GenomeLocation; NUM_READS_PER_PAIR],
    /// Per-mate strand.
    pub direction: [Direction; NUM_READS_PER_PAIR],
    /// Per-mate alignment score (edit distance).
    pub score: [u32; NUM_READS_PER_PAIR],
    /// Per-mate score before soft clipping was applied.
    pub score_prior_to_clipping: [u32; NUM_READS_PER_PAIR],
    /// Per-mate mapping quality.
    pub mapq: [u8; NUM_READS_PER_PAIR],
    /// Per-mate status.
    pub status: [AlignmentStatus; NUM_READS_PER_PAIR],
    /// The mates were reported as a consistent pair.
    pub aligned_as_pair: bool,
    /// The result came from the paired search rather than the single-end fallback.
    pub from_align_together: bool,
    /// Diagnostic counters.
    pub diagnostics: AlignmentDiagnostics,
}

impl PairedAlignmentResult {
    /// Result with both mates NotFound at location 0.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Whether both mates were found.
    pub fn both_found(&self) -> bool {
        self.status.iter().all(|status| status.is_found())
    }

    /// Whether either mate is NotFound.
    pub fn any_not_found(&self) -> bool {
        !self.both_found()
    }

    /// Overwrite one mate with a single-end result.
    pub(crate) fn set_mate(&mut self, which: usize, single: &SingleAlignmentResult) {
        self.status[which] = single.status;
        self.mapq[which] = single.mapq;
        self.direction[which] = single.direction;
        self.location[which] = single.location;
        self.score[which] = single.score;
        self.score_prior_to_clipping[which] = single.score_prior_to_clipping;
    }

    /// Mark one mate NotFound with zeroed fields.
    pub(crate) fn clear_mate(&mut self, which: usize) {
        self.set_mate(which, &SingleAlignmentResult::not_found());
    }
}

/// Alignment of one read on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SingleAlignmentResult {
    /// Genome location.
    pub location: GenomeLocation,
    /// Strand.
    pub direction: Direction,
    /// Alignment score (edit distance).
    pub score: u32,
    /// Score before soft clipping.
    pub score_prior_to_clipping: u32,
    /// Mapping quality.
    pub mapq: u8,
    /// Status.
    pub status: AlignmentStatus,
}

impl SingleAlignmentResult {
    /// NotFound at location 0, forward strand.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// A found alignment.
    pub fn found(location: GenomeLocation, direction: Direction, score: u32, mapq: u8) -> Self {
        Self {
            location,
            direction,
            score,
            score_prior_to_clipping: score,
            mapq,
            status: AlignmentStatus::Found,
        }
    }
}
