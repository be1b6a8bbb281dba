use std::sync::Arc;

use crate::engine::{
    ClusterAnchor, PairScoringState, PairedSearchEngine, SecondaryParams, SingleEndAligner,
};
use crate::genomics::{
    reverse_complement, AlignmentStatus, BufferOutcome, Candidate, Direction, GenomeLocation,
    MismatchCache, PairedAlignmentResult, Read, ReadPair, ReferenceIndex, SingleAlignmentResult,
    NUM_READS_PER_PAIR,
};

/// Highest mapping quality reported.
pub const MAX_MAPQ: u8 = 70;

const MISMATCH_PROBABILITY: f64 = 0.001;

fn hit_probability(mismatches: u32) -> f64 {
    MISMATCH_PROBABILITY.powi(mismatches as i32)
}

/// Phred-scaled confidence that the best hit is the true one.
pub fn mapq_from_probabilities(best: f64, all: f64) -> u8 {
    if best <= 0.0 || all <= 0.0 {
        return 0;
    }
    let ambiguity = 1.0 - (best / all).min(1.0);
    if ambiguity <= 1e-7 {
        return MAX_MAPQ;
    }
    (-10.0 * ambiguity.log10()).round().clamp(0.0, MAX_MAPQ as f64) as u8
}

/// A read in both orientations plus its cache digest.
#[derive(Debug, Clone)]
struct OrientedRead {
    digest: blake3::Hash,
    forward: Vec<u8>,
    reverse: Vec<u8>,
}

impl OrientedRead {
    fn new(read: &Read) -> Self {
        Self {
            digest: blake3::hash(read.bases()),
            forward: read.bases().to_ascii_uppercase(),
            reverse: reverse_complement(read.bases()),
        }
    }

    fn bases(&self, direction: Direction) -> &[u8] {
        match direction {
            Direction::Forward => &self.forward,
            Direction::ReverseComplement => &self.reverse,
        }
    }

    fn mismatches(
        &self,
        index: &ReferenceIndex,
        cache: &mut MismatchCache,
        candidate: Candidate,
    ) -> Option<u32> {
        cache.get_or_compute(&self.digest, candidate, || {
            index.mismatches(self.bases(candidate.direction), candidate.location)
        })
    }
}

/// Next candidate pair of a [`SeedPairEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedCursor {
    /// Mate-0 location of the next candidate pair.
    pub next: Option<GenomeLocation>,
    /// Candidate pairs left to score.
    pub remaining: usize,
}

impl ClusterAnchor for SeedCursor {
    fn anchor(&self) -> Option<GenomeLocation> {
        self.next
    }
}

#[derive(Debug, Clone, Copy)]
struct ScoredPair {
    hits: [Candidate; NUM_READS_PER_PAIR],
    score: [u32; NUM_READS_PER_PAIR],
}

impl ScoredPair {
    fn total(&self) -> u32 {
        self.score.iter().sum()
    }
}

/// Paired search over a [`ReferenceIndex`], one instance per read pair.
///
/// Mates must land on opposite strands no more than `max_spacing` apart and
/// with at most `max_k` mismatches each.
#[derive(Debug, Clone)]
pub struct SeedPairEngine {
    index: Arc<ReferenceIndex>,
    max_spacing: u64,
    max_k: u32,
    reads: Option<[OrientedRead; NUM_READS_PER_PAIR]>,
    candidates: [Vec<Candidate>; NUM_READS_PER_PAIR],
    pairs: Vec<[Candidate; NUM_READS_PER_PAIR]>,
    scored: Vec<ScoredPair>,
    lv_calls: u32,
}

impl SeedPairEngine {
    /// Engine over a shared index.
    pub fn new(index: Arc<ReferenceIndex>, max_spacing: u64, max_k: u32) -> Self {
        Self {
            index,
            max_spacing,
            max_k,
            reads: None,
            candidates: [Vec::new(), Vec::new()],
            pairs: Vec::new(),
            scored: Vec::new(),
            lv_calls: 0,
        }
    }

    /// Candidate pairs in current search order.
    pub fn candidate_pairs(&self) -> &[[Candidate; NUM_READS_PER_PAIR]] {
        &self.pairs
    }
}

impl PairedSearchEngine for SeedPairEngine {
    type Cache = MismatchCache;
    type Cursor = SeedCursor;

    fn search(
        &mut self,
        pair: &ReadPair,
        _cache: &mut MismatchCache,
        seeds_skipped: &mut u32,
    ) -> bool {
        self.reads = Some([
            OrientedRead::new(pair.mate(0)),
            OrientedRead::new(pair.mate(1)),
        ]);
        for (mate, candidates) in self.candidates.iter_mut().enumerate() {
            *candidates = self.index.candidates(pair.mate(mate).bases(), seeds_skipped);
        }
        self.pairs.clear();
        self.scored.clear();
        self.candidates.iter().all(|candidates| !candidates.is_empty())
    }

    fn init_second_phase(&mut self) -> bool {
        self.pairs.clear();
        for &first in &self.candidates[0] {
            for &second in &self.candidates[1] {
                if first.direction.opposite() == second.direction
                    && first.location.distance(second.location) <= self.max_spacing
                {
                    self.pairs.push([first, second]);
                }
            }
        }
        !self.pairs.is_empty()
    }

    fn cursor(&self) -> SeedCursor {
        SeedCursor {
            next: self.pairs.first().map(|hits| hits[0].location),
            remaining: self.pairs.len(),
        }
    }

    fn advance_to_target(&mut self, _cursor: &SeedCursor, target: GenomeLocation) {
        // Stable, so equally distant pairs keep their seed order.
        self.pairs.sort_by_key(|hits| {
            hits[0]
                .location
                .distance(target)
                .min(hits[1].location.distance(target))
        });
    }

    fn score(
        &mut self,
        cache: &mut MismatchCache,
        params: &SecondaryParams,
        secondary: &mut Vec<PairedAlignmentResult>,
        capacity: usize,
        _seeds_skipped: u32,
    ) -> BufferOutcome<PairScoringState> {
        let Some(reads) = self.reads.as_ref() else {
            return BufferOutcome::Fits(PairScoringState::default());
        };

        self.scored.clear();
        self.lv_calls = 0;
        for hits in &self.pairs {
            let mut score = [0u32; NUM_READS_PER_PAIR];
            let mut usable = true;
            for mate in 0..NUM_READS_PER_PAIR {
                self.lv_calls += 1;
                match reads[mate].mismatches(&self.index, cache, hits[mate]) {
                    Some(mismatches) if mismatches <= self.max_k => score[mate] = mismatches,
                    _ => {
                        usable = false;
                        break;
                    }
                }
            }
            if usable {
                self.scored.push(ScoredPair { hits: *hits, score });
            }
        }

        let Some((best_idx, best)) = self
            .scored
            .iter()
            .enumerate()
            .min_by_key(|(_, scored)| scored.total())
        else {
            return BufferOutcome::Fits(PairScoringState::default());
        };

        let probability_of_all_pairs: f64 = self
            .scored
            .iter()
            .map(|scored| hit_probability(scored.total()))
            .sum();
        let ceiling = best.total().saturating_add(params.max_edit_distance);
        let secondaries: Vec<&ScoredPair> = self
            .scored
            .iter()
            .enumerate()
            .filter(|(idx, scored)| *idx != best_idx && scored.total() <= ceiling)
            .map(|(_, scored)| scored)
            .take(params.limit())
            .collect();
        if secondaries.len() > capacity {
            return BufferOutcome::Overflow;
        }

        secondary.extend(secondaries.into_iter().map(|scored| PairedAlignmentResult {
            location: [scored.hits[0].location, scored.hits[1].location],
            direction: [scored.hits[0].direction, scored.hits[1].direction],
            score: scored.score,
            score_prior_to_clipping: scored.score,
            mapq: [0; NUM_READS_PER_PAIR],
            status: [AlignmentStatus::Found; NUM_READS_PER_PAIR],
            aligned_as_pair: true,
            from_align_together: true,
            diagnostics: Default::default(),
        }));

        BufferOutcome::Fits(PairScoringState {
            best_pair_score: best.total(),
            best_location: [best.hits[0].location, best.hits[1].location],
            best_direction: [best.hits[0].direction, best.hits[1].direction],
            probability_of_all_pairs,
            best_score: best.score,
            probability_of_best_pair: hit_probability(best.total()),
        })
    }

    fn finalize(
        &mut self,
        _pair: &ReadPair,
        _cache: &mut MismatchCache,
        primary: &mut PairedAlignmentResult,
        _params: &SecondaryParams,
        secondary: &mut Vec<PairedAlignmentResult>,
        _seeds_skipped: u32,
        state: &PairScoringState,
    ) {
        *primary = PairedAlignmentResult::not_found();
        primary.diagnostics.lv_calls = self.lv_calls;
        if state.probability_of_best_pair <= 0.0 {
            return;
        }

        let mapq = mapq_from_probabilities(
            state.probability_of_best_pair,
            state.probability_of_all_pairs,
        );
        for mate in 0..NUM_READS_PER_PAIR {
            primary.location[mate] = state.best_location[mate];
            primary.direction[mate] = state.best_direction[mate];
            primary.score[mate] = state.best_score[mate];
            primary.score_prior_to_clipping[mate] = state.best_score[mate];
            primary.mapq[mate] = mapq;
            primary.status[mate] = AlignmentStatus::Found;
        }
        primary.diagnostics.small_hits = secondary.len() as u32;
    }
}

/// Single-end aligner over a [`ReferenceIndex`].
#[derive(Debug, Clone)]
pub struct SeedSingleAligner {
    index: Arc<ReferenceIndex>,
    max_k: u32,
}

impl SeedSingleAligner {
    /// Aligner over a shared index.
    pub fn new(index: Arc<ReferenceIndex>, max_k: u32) -> Self {
        Self { index, max_k }
    }
}

impl SingleEndAligner for SeedSingleAligner {
    type Cache = MismatchCache;

    fn align_read(
        &mut self,
        read: &Read,
        cache: &mut MismatchCache,
        params: &SecondaryParams,
        secondary: &mut Vec<SingleAlignmentResult>,
        capacity: usize,
    ) -> BufferOutcome<SingleAlignmentResult> {
        let oriented = OrientedRead::new(read);
        let mut seeds_skipped = 0;
        let scored: Vec<(Candidate, u32)> = self
            .index
            .candidates(read.bases(), &mut seeds_skipped)
            .into_iter()
            .filter_map(|candidate| {
                oriented
                    .mismatches(&self.index, cache, candidate)
                    .filter(|mismatches| *mismatches <= self.max_k)
                    .map(|mismatches| (candidate, mismatches))
            })
            .collect();

        let Some((best_idx, &(best, best_score))) = scored
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, mismatches))| *mismatches)
        else {
            return BufferOutcome::Fits(SingleAlignmentResult::not_found());
        };

        let probability_of_all: f64 = scored.iter().map(|(_, m)| hit_probability(*m)).sum();
        let ceiling = best_score.saturating_add(params.max_edit_distance);
        let secondaries: Vec<SingleAlignmentResult> = scored
            .iter()
            .enumerate()
            .filter(|(idx, (_, mismatches))| *idx != best_idx && *mismatches <= ceiling)
            .map(|(_, (candidate, mismatches))| {
                SingleAlignmentResult::found(
                    candidate.location,
                    candidate.direction,
                    *mismatches,
                    0,
                )
            })
            .take(params.limit())
            .collect();
        if secondaries.len() > capacity {
            return BufferOutcome::Overflow;
        }
        secondary.extend(secondaries);

        let mapq = mapq_from_probabilities(hit_probability(best_score), probability_of_all);
        BufferOutcome::Fits(SingleAlignmentResult::found(
            best.location,
            best.direction,
            best_score,
            mapq,
        ))
    }
}
