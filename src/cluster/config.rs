use thiserror::Error;

use crate::engine::SecondaryParams;

/// Errors surfaced by the cluster aligner and its driver.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Configuration invalid (e.g., zero barcode size).
    #[error("invalid cluster configuration: {0}")]
    InvalidConfig(String),

    /// Caller supplied more trackers than the configured barcode size.
    #[error("barcode holds {size} pairs, more than the configured maximum {max}")]
    BarcodeTooLarge {
        /// Number of trackers supplied.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The driver gave up before the barcode finished.
    #[error("barcode still pending after {rounds} invocations")]
    RetryLimitExceeded {
        /// Invocations performed.
        rounds: usize,
    },

    /// A buffer would have to grow past the driver's limit.
    #[error("secondary buffer needs {requested} slots, limit is {limit}")]
    BufferLimitExceeded {
        /// Capacity the retry would need.
        requested: usize,
        /// Configured ceiling.
        limit: usize,
    },
}

/// Parameters for the cluster aligner.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Mates shorter than this are classified NotFound without searching.
    pub min_read_length: usize,
    /// Report pairs strictly as the paired search found them; never fall back.
    pub force_spacing: bool,
    /// Maximum number of pairs in one barcode.
    pub max_barcode_size: usize,
    /// Anchors needed before the barcode target biases the search.
    pub min_pairs_per_cluster: usize,
    /// Widest genomic span considered one neighbourhood.
    pub max_cluster_span: u64,
    /// Edit distance above the best hit for secondary alignments.
    pub max_edit_distance_for_secondary: u32,
    /// Cap on secondary alignments per read or pair, `None` for no cap.
    pub max_secondary_alignments: Option<usize>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_read_length: 50,
            force_spacing: false,
            max_barcode_size: 1024,
            min_pairs_per_cluster: 2,
            max_cluster_span: 100_000,
            max_edit_distance_for_secondary: 2,
            max_secondary_alignments: None,
        }
    }
}

impl ClusterConfig {
    /// Set the minimum usable read length.
    pub fn with_min_read_length(mut self, min_read_length: usize) -> Self {
        self.min_read_length = min_read_length;
        self
    }

    /// Enable or disable forced mate spacing.
    pub fn with_force_spacing(mut self, enabled: bool) -> Self {
        self.force_spacing = enabled;
        self
    }

    /// Set the maximum barcode size.
    pub fn with_max_barcode_size(mut self, max_barcode_size: usize) -> Self {
        self.max_barcode_size = max_barcode_size;
        self
    }

    /// Set the anchor support and span used for the barcode target.
    pub fn with_cluster_shape(
        mut self,
        min_pairs_per_cluster: usize,
        max_cluster_span: u64,
    ) -> Self {
        self.min_pairs_per_cluster = min_pairs_per_cluster;
        self.max_cluster_span = max_cluster_span;
        self
    }

    /// Set the secondary-alignment limits.
    pub fn with_secondary_limits(
        mut self,
        max_edit_distance: u32,
        max_alignments: Option<usize>,
    ) -> Self {
        self.max_edit_distance_for_secondary = max_edit_distance;
        self.max_secondary_alignments = max_alignments;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.max_barcode_size == 0 {
            return Err(ClusterError::InvalidConfig(
                "max barcode size must be > 0".to_string(),
            ));
        }
        if self.min_pairs_per_cluster == 0 {
            return Err(ClusterError::InvalidConfig(
                "min pairs per cluster must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Secondary-alignment limits handed to the engines.
    pub fn secondary_params(&self) -> SecondaryParams {
        SecondaryParams {
            max_edit_distance: self.max_edit_distance_for_secondary,
            max_to_return: self.max_secondary_alignments,
        }
    }
}
