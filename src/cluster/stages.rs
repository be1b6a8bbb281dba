use tracing::{debug, trace};

use super::{ClusterAligner, TargetPolicy, FALLBACK_MAPQ_DIVISOR};
use crate::engine::{ClusterAnchor, PairedSearchEngine, SingleEndAligner};
use crate::genomics::{BufferOutcome, GenomeLocation, PairedAlignmentResult, NUM_READS_PER_PAIR};
use crate::tracker::{PairStage, ProgressTracker};

impl<E, S, P> ClusterAligner<E, S, P>
where
    E: PairedSearchEngine,
    S: SingleEndAligner<Cache = E::Cache>,
    P: TargetPolicy,
{
    /// Stage 1: paired seed search.
    ///
    /// Returns `true` when every pair of the barcode is resolved afterwards.
    pub(crate) fn search_stage(&mut self, trackers: &mut [ProgressTracker<E>]) -> bool {
        let min_len = self.config.min_read_length;
        let mut entered_scoring = Vec::new();

        for (idx, tracker) in trackers.iter_mut().enumerate() {
            if tracker.stage() != PairStage::PairSearching {
                continue;
            }
            tracker.result.status = Default::default();

            let short = [
                tracker.pair.mate(0).len() < min_len,
                tracker.pair.mate(1).len() < min_len,
            ];
            if short[0] && short[1] {
                trace!(pair = idx, "both mates below minimum length");
                tracker.result = PairedAlignmentResult::not_found();
                tracker.advance(PairStage::Resolved);
                continue;
            }
            if short[0] || short[1] {
                // One usable mate cannot be paired; align it alone.
                self.abandon_paired_search(tracker);
                continue;
            }

            tracker.searches += 1;
            let mut more_work = tracker.engine.search(
                &tracker.pair,
                &mut self.cache,
                &mut tracker.seeds_skipped,
            );
            if more_work {
                more_work = tracker.engine.init_second_phase();
            }
            if more_work {
                tracker.cursor = Some(tracker.engine.cursor());
                tracker.advance(PairStage::PairScoring);
                entered_scoring.push(idx);
            } else {
                trace!(pair = idx, "paired search found nothing to score");
                self.abandon_paired_search(tracker);
            }
        }

        if !entered_scoring.is_empty() {
            let anchors = Self::collect_anchors(trackers, &entered_scoring);
            if let Some(target) = self.policy.target(&anchors) {
                debug!(
                    %target,
                    anchors = anchors.len(),
                    pairs = entered_scoring.len(),
                    "biasing barcode search toward target"
                );
                for &idx in &entered_scoring {
                    let tracker = &mut trackers[idx];
                    if let Some(cursor) = tracker.cursor.as_ref() {
                        tracker.engine.advance_to_target(cursor, target);
                    }
                }
            }
        }

        trackers.iter().all(ProgressTracker::is_resolved)
    }

    /// Stage 2: paired scoring and secondary enumeration.
    ///
    /// Returns `true` when no pair overflowed its paired buffer and no pair
    /// was deferred to the single-end fallback in this sweep.
    pub(crate) fn scoring_stage(&mut self, trackers: &mut [ProgressTracker<E>]) -> bool {
        let mut finished = true;

        for (idx, tracker) in trackers.iter_mut().enumerate() {
            if tracker.stage() != PairStage::PairScoring {
                continue;
            }
            for buffer in &mut tracker.single_secondary {
                buffer.clear();
            }

            let capacity = tracker.paired_secondary.capacity();
            let outcome = tracker.engine.score(
                &mut self.cache,
                &self.params,
                tracker.paired_secondary.storage(),
                capacity,
                tracker.seeds_skipped,
            );
            // An engine that wrote past capacity overflowed, whatever it reported.
            let state = match outcome {
                BufferOutcome::Fits(state) if tracker.paired_secondary.fits() => state,
                _ => {
                    debug!(pair = idx, capacity, "paired secondary buffer overflowed");
                    tracker.paired_secondary.mark_overflow();
                    tracker.overflows += 1;
                    finished = false;
                    continue;
                }
            };

            tracker.engine.finalize(
                &tracker.pair,
                &mut self.cache,
                &mut tracker.result,
                &self.params,
                tracker.paired_secondary.results_mut(),
                tracker.seeds_skipped,
                &state,
            );
            tracker.paired_secondary.mark_fits();
            tracker.result.diagnostics.nanos_in_align_together = 0;
            tracker.result.from_align_together = true;
            tracker.result.aligned_as_pair = true;

            if self.config.force_spacing {
                if !tracker.result.status[0].is_found() {
                    tracker.result.from_align_together = false;
                    tracker.result.aligned_as_pair = false;
                }
                tracker.advance(PairStage::Resolved);
                continue;
            }

            if tracker.result.both_found() {
                tracker.advance(PairStage::Resolved);
            } else {
                trace!(pair = idx, "candidate chimera, deferring to single-end fallback");
                tracker.advance(PairStage::SingleFallback);
                finished = false;
            }
        }

        finished
    }

    /// Stage 3: single-end fallback for candidate chimeras.
    ///
    /// Returns `true` when no pair remains in the fallback.
    pub(crate) fn fallback_stage(&mut self, trackers: &mut [ProgressTracker<E>]) -> bool {
        let min_len = self.config.min_read_length;
        let mut finished = true;

        for (idx, tracker) in trackers.iter_mut().enumerate() {
            if tracker.stage() != PairStage::SingleFallback {
                continue;
            }

            for mate in 0..NUM_READS_PER_PAIR {
                if tracker.mate_done[mate] {
                    continue;
                }
                let read = tracker.pair.mate(mate);
                if read.len() < min_len {
                    tracker.result.clear_mate(mate);
                    tracker.single_secondary[mate].clear();
                    tracker.mate_done[mate] = true;
                    continue;
                }

                let capacity = tracker.single_secondary[mate].capacity();
                let outcome = self.single_aligner.align_read(
                    read,
                    &mut self.cache,
                    &self.params,
                    tracker.single_secondary[mate].storage(),
                    capacity,
                );
                match outcome {
                    BufferOutcome::Fits(mut single) if tracker.single_secondary[mate].fits() => {
                        single.mapq /= FALLBACK_MAPQ_DIVISOR;
                        tracker.result.set_mate(mate, &single);
                        tracker.single_secondary[mate].mark_fits();
                        tracker.mate_done[mate] = true;
                    }
                    _ => {
                        debug!(
                            pair = idx,
                            mate,
                            capacity,
                            "single-end secondary buffer overflowed"
                        );
                        tracker.single_secondary[mate].mark_overflow();
                        tracker.overflows += 1;
                    }
                }
            }

            if tracker.mate_done.iter().all(|done| *done) {
                tracker.result.from_align_together = false;
                tracker.result.aligned_as_pair = false;
                tracker.advance(PairStage::Resolved);
            } else {
                finished = false;
            }
        }

        finished
    }

    /// Leave the paired path from stage 1 without a scored pair.
    fn abandon_paired_search(&self, tracker: &mut ProgressTracker<E>) {
        if self.config.force_spacing {
            tracker.result = PairedAlignmentResult::not_found();
            tracker.advance(PairStage::Resolved);
        } else {
            tracker.advance(PairStage::SingleFallback);
        }
    }

    /// Found mates of resolved pairs plus the cursors of the pairs that just
    /// entered scoring.
    fn collect_anchors(trackers: &[ProgressTracker<E>], fresh: &[usize]) -> Vec<GenomeLocation> {
        let mut anchors = Vec::new();
        for tracker in trackers.iter().filter(|t| t.is_resolved()) {
            let result = tracker.result();
            for mate in 0..NUM_READS_PER_PAIR {
                if result.status[mate].is_found() {
                    anchors.push(result.location[mate]);
                }
            }
        }
        anchors.extend(
            fresh
                .iter()
                .filter_map(|&idx| trackers[idx].cursor.as_ref())
                .filter_map(ClusterAnchor::anchor),
        );
        anchors
    }
}
