//! Read, result and buffer types shared by the cluster aligner, plus a small
//! seed-index engine implementing the engine traits over an in-memory
//! reference.

mod buffer;
mod reference;
mod seed_engine;
mod types;

pub use buffer::{BufferOutcome, SecondaryBuffer, SecondaryCount};
pub use reference::{
    reverse_complement, Candidate, MismatchCache, ReferenceError, ReferenceIndex, MAX_SEED_LEN,
};
pub use seed_engine::{
    mapq_from_probabilities, SeedCursor, SeedPairEngine, SeedSingleAligner, MAX_MAPQ,
};
pub use types::{
    AlignmentDiagnostics, AlignmentStatus, Direction, GenomeLocation, PairedAlignmentResult, Read,
    ReadPair, SingleAlignmentResult, NUM_READS_PER_PAIR,
};
