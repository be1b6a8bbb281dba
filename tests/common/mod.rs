#![allow(dead_code)]

use std::sync::Arc;

use linkalign::genomics::{
    AlignmentStatus, BufferOutcome, Direction, GenomeLocation, PairedAlignmentResult, Read,
    ReadPair, SingleAlignmentResult,
};
use linkalign::{
    ClusterAligner, ClusterAnchor, ClusterConfig, NoBias, PairScoringState, PairedSearchEngine,
    ProgressTracker, SecondaryParams, SingleEndAligner, TargetPolicy,
};

/// Cache shared by the scripted engines; counts how often it was touched.
#[derive(Debug, Default)]
pub struct CountingCache {
    pub touches: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedCursor {
    pub at: Option<GenomeLocation>,
}

impl ClusterAnchor for ScriptedCursor {
    fn anchor(&self) -> Option<GenomeLocation> {
        self.at
    }
}

/// Paired engine that replays a fixed outcome and records what it was asked.
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    pub has_candidates: bool,
    pub found: [bool; 2],
    pub location: u64,
    pub mapq: u8,
    pub secondaries: usize,
    /// Write every secondary and report `Fits` even past capacity.
    pub ignores_capacity: bool,
    /// Whether the cursor exposes a location.
    pub reports_anchor: bool,
    pub searches: u32,
    pub scores: u32,
    pub finalizes: u32,
    pub targets: Vec<GenomeLocation>,
}

impl ScriptedEngine {
    /// Both mates found near `location`.
    pub fn concordant(location: u64) -> Self {
        Self {
            has_candidates: true,
            found: [true, true],
            location,
            mapq: 60,
            secondaries: 0,
            ignores_capacity: false,
            reports_anchor: true,
            searches: 0,
            scores: 0,
            finalizes: 0,
            targets: Vec::new(),
        }
    }

    /// Mate 0 found at `location`, mate 1 not found.
    pub fn chimeric(location: u64) -> Self {
        Self {
            found: [true, false],
            ..Self::concordant(location)
        }
    }

    /// Search yields nothing to score.
    pub fn empty() -> Self {
        Self {
            has_candidates: false,
            found: [false, false],
            ..Self::concordant(0)
        }
    }

    pub fn with_secondaries(mut self, secondaries: usize) -> Self {
        self.secondaries = secondaries;
        self
    }

    fn mate_location(&self, mate: usize) -> GenomeLocation {
        GenomeLocation::new(self.location + 300 * mate as u64)
    }
}

impl PairedSearchEngine for ScriptedEngine {
    type Cache = CountingCache;
    type Cursor = ScriptedCursor;

    fn search(
        &mut self,
        _pair: &ReadPair,
        cache: &mut CountingCache,
        seeds_skipped: &mut u32,
    ) -> bool {
        self.searches += 1;
        cache.touches += 1;
        *seeds_skipped += 1;
        self.has_candidates
    }

    fn init_second_phase(&mut self) -> bool {
        self.has_candidates
    }

    fn cursor(&self) -> ScriptedCursor {
        ScriptedCursor {
            at: self
                .reports_anchor
                .then(|| GenomeLocation::new(self.location)),
        }
    }

    fn advance_to_target(&mut self, _cursor: &ScriptedCursor, target: GenomeLocation) {
        self.targets.push(target);
    }

    fn score(
        &mut self,
        cache: &mut CountingCache,
        _params: &SecondaryParams,
        secondary: &mut Vec<PairedAlignmentResult>,
        capacity: usize,
        _seeds_skipped: u32,
    ) -> BufferOutcome<PairScoringState> {
        self.scores += 1;
        cache.touches += 1;
        let written = if self.ignores_capacity {
            self.secondaries
        } else {
            self.secondaries.min(capacity)
        };
        for idx in 0..written {
            let mut alt = PairedAlignmentResult::not_found();
            alt.location = [
                GenomeLocation::new(self.location + 1_000 * (idx as u64 + 1)),
                GenomeLocation::new(self.location + 1_000 * (idx as u64 + 1) + 300),
            ];
            alt.status = [AlignmentStatus::Found; 2];
            secondary.push(alt);
        }
        if self.secondaries > capacity && !self.ignores_capacity {
            return BufferOutcome::Overflow;
        }

        BufferOutcome::Fits(PairScoringState {
            best_pair_score: 1,
            best_location: [self.mate_location(0), self.mate_location(1)],
            best_direction: [Direction::Forward, Direction::ReverseComplement],
            probability_of_all_pairs: 1.0,
            best_score: [1, 0],
            probability_of_best_pair: 1.0,
        })
    }

    fn finalize(
        &mut self,
        _pair: &ReadPair,
        _cache: &mut CountingCache,
        primary: &mut PairedAlignmentResult,
        _params: &SecondaryParams,
        _secondary: &mut Vec<PairedAlignmentResult>,
        _seeds_skipped: u32,
        state: &PairScoringState,
    ) {
        self.finalizes += 1;
        *primary = PairedAlignmentResult::not_found();
        for mate in 0..2 {
            if self.found[mate] {
                primary.location[mate] = state.best_location[mate];
                primary.direction[mate] = state.best_direction[mate];
                primary.score[mate] = state.best_score[mate];
                primary.mapq[mate] = self.mapq;
                primary.status[mate] = AlignmentStatus::Found;
            }
        }
    }
}

/// Single-end aligner with a fixed outcome per mate.
#[derive(Debug, Clone)]
pub struct ScriptedSingle {
    pub mapq: u8,
    pub location: u64,
    /// Secondaries reported for mate `/1` and mate `/2` reads.
    pub secondaries: [usize; 2],
    /// Write every secondary and report `Fits` even past capacity.
    pub ignores_capacity: bool,
    pub aligned: Vec<Arc<str>>,
}

impl ScriptedSingle {
    pub fn new(mapq: u8) -> Self {
        Self {
            mapq,
            location: 5_000,
            secondaries: [0, 0],
            ignores_capacity: false,
            aligned: Vec::new(),
        }
    }

    pub fn with_secondaries(mut self, secondaries: [usize; 2]) -> Self {
        self.secondaries = secondaries;
        self
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.aligned.iter().filter(|aligned| &***aligned == id).count()
    }
}

impl SingleEndAligner for ScriptedSingle {
    type Cache = CountingCache;

    fn align_read(
        &mut self,
        read: &Read,
        cache: &mut CountingCache,
        _params: &SecondaryParams,
        secondary: &mut Vec<SingleAlignmentResult>,
        capacity: usize,
    ) -> BufferOutcome<SingleAlignmentResult> {
        self.aligned.push(Arc::clone(&read.id));
        cache.touches += 1;
        let mate = usize::from(read.id.ends_with("/2"));
        let wanted = self.secondaries[mate];
        if wanted > capacity && !self.ignores_capacity {
            return BufferOutcome::Overflow;
        }
        for idx in 0..wanted {
            secondary.push(SingleAlignmentResult::found(
                GenomeLocation::new(self.location + 10_000 * (idx as u64 + 1)),
                Direction::Forward,
                2,
                0,
            ));
        }
        BufferOutcome::Fits(SingleAlignmentResult::found(
            GenomeLocation::new(self.location + mate as u64),
            Direction::Forward,
            0,
            self.mapq,
        ))
    }
}

pub type ScriptedAligner<P = NoBias> = ClusterAligner<ScriptedEngine, ScriptedSingle, P>;

/// Pair whose mates are `len0` and `len1` bases of a repeat.
pub fn pair_of_len(id: &str, len0: usize, len1: usize) -> ReadPair {
    let mate0 = b"ACGT".repeat(len0 / 4 + 1)[..len0].to_vec();
    let mate1 = b"TTGA".repeat(len1 / 4 + 1)[..len1].to_vec();
    ReadPair::new(id, mate0, mate1)
}

/// Tracker with paired and single-end capacities of 4.
pub fn tracker(id: &str, engine: ScriptedEngine) -> ProgressTracker<ScriptedEngine> {
    ProgressTracker::new(pair_of_len(id, 100, 100), engine, 4, 4)
}

/// Config with a small minimum read length.
pub fn config() -> ClusterConfig {
    ClusterConfig::default().with_min_read_length(30)
}

pub fn aligner(config: ClusterConfig, single: ScriptedSingle) -> ScriptedAligner {
    aligner_with_policy(config, single, NoBias)
}

pub fn aligner_with_policy<P: TargetPolicy>(
    config: ClusterConfig,
    single: ScriptedSingle,
    policy: P,
) -> ScriptedAligner<P> {
    ClusterAligner::with_policy(config, single, CountingCache::default(), policy)
        .expect("valid config")
}

/// Deterministic pseudo-random reference.
pub fn synthetic_reference(len: usize, mut state: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b"ACGT"[(state >> 33) as usize % 4]
        })
        .collect()
}

/// Pair sequenced from `reference` with mate 0 forward at `first` and mate 1
/// reverse-complemented at `second`.
pub fn sampled_pair(
    id: &str,
    reference: &[u8],
    first: usize,
    second: usize,
    len: usize,
) -> ReadPair {
    ReadPair::new(
        id,
        reference[first..first + len].to_vec(),
        linkalign::genomics::reverse_complement(&reference[second..second + len]),
    )
}
