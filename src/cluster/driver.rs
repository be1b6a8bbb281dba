use tracing::{debug, warn};

use super::{BarcodeStatus, ClusterAligner, ClusterError, TargetPolicy};
use crate::engine::{PairedSearchEngine, SingleEndAligner};
use crate::ledger::{StageCounts, StageLedger};
use crate::tracker::{OverflowedBuffer, ProgressTracker};

/// How the driver grows overflowed buffers between invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Multiplier applied to an overflowed capacity.
    pub growth_factor: usize,
    /// Largest capacity any buffer may reach.
    pub max_capacity: usize,
    /// Invocations allowed before giving up.
    pub max_rounds: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            growth_factor: 2,
            max_capacity: 1 << 20,
            max_rounds: 64,
        }
    }
}

impl GrowthPolicy {
    /// Capacity to use after an overflow at `capacity`.
    pub fn next_capacity(&self, capacity: usize) -> Result<usize, ClusterError> {
        let grown = capacity
            .saturating_mul(self.growth_factor.max(1))
            .max(capacity.saturating_add(1));
        if grown > self.max_capacity {
            return Err(ClusterError::BufferLimitExceeded {
                requested: grown,
                limit: self.max_capacity,
            });
        }
        Ok(grown)
    }
}

/// What it took to resolve a barcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveSummary {
    /// Calls made to [`ClusterAligner::align`].
    pub invocations: usize,
    /// Buffers grown between calls.
    pub buffer_growths: usize,
    /// Final stage counts.
    pub stages: StageCounts,
}

/// Call `align` until the barcode is finished, growing exactly the buffers
/// that overflowed after each pending call.
pub fn resolve_barcode<E, S, P>(
    aligner: &mut ClusterAligner<E, S, P>,
    trackers: &mut [ProgressTracker<E>],
    policy: &GrowthPolicy,
) -> Result<DriveSummary, ClusterError>
where
    E: PairedSearchEngine,
    S: SingleEndAligner<Cache = E::Cache>,
    P: TargetPolicy,
{
    let mut buffer_growths = 0;

    for round in 1..=policy.max_rounds {
        if aligner.align(trackers)? == BarcodeStatus::Finished {
            let stages = StageLedger::from_trackers(trackers).completion_stats();
            debug!(
                invocations = round,
                buffer_growths,
                pairs = stages.total(),
                "barcode finished"
            );
            return Ok(DriveSummary {
                invocations: round,
                buffer_growths,
                stages,
            });
        }

        for tracker in trackers.iter_mut() {
            for overflowed in tracker.overflowed_buffers() {
                match overflowed {
                    OverflowedBuffer::Paired => {
                        let capacity = policy.next_capacity(tracker.paired_secondary().capacity())?;
                        tracker.grow_paired_secondary(capacity);
                    }
                    OverflowedBuffer::Single(mate) => {
                        let capacity =
                            policy.next_capacity(tracker.single_secondary(mate).capacity())?;
                        tracker.grow_single_secondary(mate, capacity);
                    }
                }
                buffer_growths += 1;
            }
        }
    }

    warn!(rounds = policy.max_rounds, "barcode did not finish");
    Err(ClusterError::RetryLimitExceeded {
        rounds: policy.max_rounds,
    })
}
