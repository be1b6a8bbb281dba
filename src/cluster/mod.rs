//! Cluster-level orchestration
//!
//! Drives every read pair of a barcode through three stages:
//!
//! 1. **Paired search**: seed search for each pair, sharing one edit-distance
//!    cache across the barcode, then biasing the pairs that still have work
//!    toward the barcode's target coordinate.
//! 2. **Paired scoring**: score candidate pairs and enumerate secondaries;
//!    pairs with a NotFound mate become candidate chimeras.
//! 3. **Single-end fallback**: align each mate of a candidate chimera on its
//!    own with a mapping-quality penalty.
//!
//! Every stage may stop on a secondary-buffer overflow. All per-pair state is
//! kept in the [`ProgressTracker`]s, so the caller grows the buffer that
//! overflowed and calls [`ClusterAligner::align`] again.

mod config;
mod driver;
mod stages;
mod target;

pub use config::{ClusterConfig, ClusterError};
pub use driver::{resolve_barcode, DriveSummary, GrowthPolicy};
pub use target::{DensestWindow, FixedTarget, NoBias, TargetPolicy};

use tracing::debug;

use crate::engine::{PairedSearchEngine, SecondaryParams, SingleEndAligner};
use crate::ledger::StageLedger;
use crate::tracker::ProgressTracker;

/// Mapping-quality divisor applied to single-end fallback results.
pub const FALLBACK_MAPQ_DIVISOR: u8 = 3;

/// Barcode-wide completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeStatus {
    /// Every pair is resolved.
    Finished,
    /// Work remains; call again (after growing any overflowed buffer).
    Pending,
}

impl BarcodeStatus {
    /// Whether the barcode is finished.
    pub fn is_finished(self) -> bool {
        matches!(self, BarcodeStatus::Finished)
    }

    fn from_finished(finished: bool) -> Self {
        if finished {
            BarcodeStatus::Finished
        } else {
            BarcodeStatus::Pending
        }
    }
}

/// Resolves the read pairs of one barcode.
///
/// Owns the single-end fallback aligner, the cache shared by every pair of
/// the barcode, and the target policy. One instance per worker thread.
#[derive(Debug)]
pub struct ClusterAligner<E, S, P = DensestWindow>
where
    E: PairedSearchEngine,
    S: SingleEndAligner<Cache = E::Cache>,
    P: TargetPolicy,
{
    config: ClusterConfig,
    params: SecondaryParams,
    single_aligner: S,
    cache: E::Cache,
    policy: P,
}

impl<E, S> ClusterAligner<E, S, DensestWindow>
where
    E: PairedSearchEngine,
    E::Cache: Default,
    S: SingleEndAligner<Cache = E::Cache>,
{
    /// Aligner using a densest-window target built from the configured
    /// cluster span and support.
    pub fn new(config: ClusterConfig, single_aligner: S) -> Result<Self, ClusterError> {
        let policy = DensestWindow::new(config.max_cluster_span, config.min_pairs_per_cluster);
        Self::with_policy(config, single_aligner, E::Cache::default(), policy)
    }
}

impl<E, S, P> ClusterAligner<E, S, P>
where
    E: PairedSearchEngine,
    S: SingleEndAligner<Cache = E::Cache>,
    P: TargetPolicy,
{
    /// Aligner with an explicit cache and target policy.
    pub fn with_policy(
        config: ClusterConfig,
        single_aligner: S,
        cache: E::Cache,
        policy: P,
    ) -> Result<Self, ClusterError> {
        config.validate()?;
        let params = config.secondary_params();
        debug!(
            min_read_length = config.min_read_length,
            force_spacing = config.force_spacing,
            max_barcode_size = config.max_barcode_size,
            "cluster aligner configured"
        );
        Ok(Self {
            config,
            params,
            single_aligner,
            cache,
            policy,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Shared cache.
    pub fn cache(&self) -> &E::Cache {
        &self.cache
    }

    /// Shared cache, mutably (e.g. to clear it between barcodes).
    pub fn cache_mut(&mut self) -> &mut E::Cache {
        &mut self.cache
    }

    /// Single-end fallback aligner.
    pub fn single_aligner(&self) -> &S {
        &self.single_aligner
    }

    /// Run as much of the barcode as possible.
    ///
    /// Returns [`BarcodeStatus::Pending`] when a buffer overflowed or pairs
    /// were deferred to the fallback; the trackers keep all partial work.
    pub fn align(
        &mut self,
        trackers: &mut [ProgressTracker<E>],
    ) -> Result<BarcodeStatus, ClusterError> {
        if trackers.len() > self.config.max_barcode_size {
            return Err(ClusterError::BarcodeTooLarge {
                size: trackers.len(),
                max: self.config.max_barcode_size,
            });
        }

        if self.search_stage(trackers) {
            debug!(pairs = trackers.len(), "barcode resolved after paired search");
            return Ok(BarcodeStatus::Finished);
        }
        if !self.scoring_stage(trackers) {
            self.log_progress(trackers, "paired scoring");
            return Ok(BarcodeStatus::Pending);
        }
        let finished = self.fallback_stage(trackers);
        self.log_progress(trackers, "single-end fallback");
        Ok(BarcodeStatus::from_finished(finished))
    }

    fn log_progress(&self, trackers: &[ProgressTracker<E>], stage: &str) {
        let stats = StageLedger::from_trackers(trackers).completion_stats();
        debug!(
            stage,
            searching = stats.searching,
            scoring = stats.scoring,
            fallback = stats.fallback,
            resolved = stats.resolved,
            "barcode progress"
        );
    }
}
