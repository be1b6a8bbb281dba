//! Barcode-level target coordinate.
//!
//! Pairs sharing a barcode come from one molecule neighbourhood, so the
//! locations already corroborated by other pairs are a good place to steer
//! the remaining searches.

use crate::genomics::GenomeLocation;

/// Chooses the coordinate pairs of a barcode are biased toward.
pub trait TargetPolicy {
    /// Target for the given anchors, or `None` to leave the search unbiased.
    fn target(&self, anchors: &[GenomeLocation]) -> Option<GenomeLocation>;
}

/// Median of the densest window of anchors no wider than `max_span`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensestWindow {
    /// Widest span a window may cover.
    pub max_span: u64,
    /// Anchors the window needs before it yields a target.
    pub min_support: usize,
}

impl DensestWindow {
    /// Construct the policy.
    pub fn new(max_span: u64, min_support: usize) -> Self {
        Self {
            max_span,
            min_support: min_support.max(1),
        }
    }
}

impl TargetPolicy for DensestWindow {
    fn target(&self, anchors: &[GenomeLocation]) -> Option<GenomeLocation> {
        if anchors.is_empty() || anchors.len() < self.min_support {
            return None;
        }
        let mut sorted = anchors.to_vec();
        sorted.sort_unstable();

        // Two-pointer sweep; the leftmost window wins ties.
        let mut best = (0usize, 0usize);
        let mut start = 0;
        for end in 0..sorted.len() {
            while sorted[end].distance(sorted[start]) > self.max_span {
                start += 1;
            }
            if end - start > best.1 - best.0 {
                best = (start, end);
            }
        }

        let support = best.1 - best.0 + 1;
        if support < self.min_support {
            return None;
        }
        Some(sorted[best.0 + (support - 1) / 2])
    }
}

/// Always targets one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTarget(pub GenomeLocation);

impl TargetPolicy for FixedTarget {
    fn target(&self, _anchors: &[GenomeLocation]) -> Option<GenomeLocation> {
        Some(self.0)
    }
}

/// Never biases the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoBias;

impl TargetPolicy for NoBias {
    fn target(&self, _anchors: &[GenomeLocation]) -> Option<GenomeLocation> {
        None
    }
}
