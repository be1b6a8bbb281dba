//! Engine interfaces the cluster aligner drives.
//!
//! The paired search engine and the single-end fallback aligner are external
//! collaborators; the crate's own seed-index implementation lives in
//! [`crate::genomics`].

mod api;

pub use api::{
    ClusterAnchor, PairScoringState, PairedSearchEngine, SecondaryParams, SingleEndAligner,
};
