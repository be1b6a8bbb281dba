//! # Barcode-aware cluster alignment for linked reads
//!
//! Read pairs that share a linked-read barcode come from one long molecule,
//! so they land in a narrow genomic neighbourhood. This crate resolves every
//! pair of such a barcode as one unit.
//!
//! ## Core Algorithm
//!
//! 1. **Paired search**: seed search per pair, one edit-distance cache shared
//!    by the whole barcode, then a barcode-wide bias toward the coordinate the
//!    other pairs corroborate
//! 2. **Paired scoring**: best pair plus secondary alignments; pairs with a
//!    NotFound mate become candidate chimeras
//! 3. **Single-end fallback**: each mate of a candidate chimera aligned on its
//!    own, mapping quality divided by three
//!
//! Secondary buffers are sized by the caller. An overflow stops the call,
//! keeps all partial work in the [`ProgressTracker`]s, and is retried after
//! the caller grows that buffer.
//!
//! ## Usage Example
//!
//! ```ignore
//! use linkalign::{ClusterAligner, ClusterConfig, ProgressTracker, resolve_barcode, GrowthPolicy};
//!
//! let mut aligner = ClusterAligner::new(ClusterConfig::default(), single_aligner)?;
//! let mut trackers: Vec<_> = pairs
//!     .into_iter()
//!     .map(|pair| ProgressTracker::new(pair, engine_for(&pair), 4, 4))
//!     .collect();
//! let summary = resolve_barcode(&mut aligner, &mut trackers, &GrowthPolicy::default())?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod cluster; // Three-stage barcode orchestration
pub mod engine; // Paired search and single-end engine traits
pub mod genomics; // Reads, results, buffers, seed-index engine
pub mod ledger; // Per-stage membership summary
pub mod tracker; // Per-pair progress state

// Re-exports for convenience
pub use cluster::{
    resolve_barcode, BarcodeStatus, ClusterAligner, ClusterConfig, ClusterError, DensestWindow,
    DriveSummary, FixedTarget, GrowthPolicy, NoBias, TargetPolicy,
};
pub use engine::{
    ClusterAnchor, PairScoringState, PairedSearchEngine, SecondaryParams, SingleEndAligner,
};
pub use ledger::{StageCounts, StageLedger};
pub use tracker::{OverflowedBuffer, PairStage, ProgressTracker};
