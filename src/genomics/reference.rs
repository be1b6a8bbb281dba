use std::collections::HashMap;

use thiserror::Error;

use crate::genomics::{Direction, GenomeLocation};

/// Longest seed that still packs into a `u64` key.
pub const MAX_SEED_LEN: usize = 32;

/// Error type returned by reference index construction.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// Reference sequence was empty.
    #[error("reference sequence must be non-empty")]
    EmptyReference,

    /// Seed length outside `1..=MAX_SEED_LEN`.
    #[error("seed length {0} must be between 1 and 32")]
    InvalidSeedLength(usize),
}

/// A candidate alignment start for one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Candidate {
    /// Reference start of the read.
    pub location: GenomeLocation,
    /// Strand the read matched.
    pub direction: Direction,
}

fn base_code(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

fn encode_seed(bases: &[u8]) -> Option<u64> {
    bases
        .iter()
        .try_fold(0u64, |key, &base| base_code(base).map(|code| (key << 2) | code))
}

/// Reverse complement of a read; non-ACGT bases become `N`.
pub fn reverse_complement(bases: &[u8]) -> Vec<u8> {
    bases
        .iter()
        .rev()
        .map(|base| match base.to_ascii_uppercase() {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            _ => b'N',
        })
        .collect()
}

/// Exact-seed index over an in-memory reference.
///
/// Read-only once built; share it between threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    sequence: Vec<u8>,
    seed_len: usize,
    max_hits: usize,
    seeds: HashMap<u64, Vec<u64>>,
}

impl ReferenceIndex {
    /// Index every seed of `reference`. Seeds containing non-ACGT bases are
    /// not indexed.
    pub fn build(reference: &[u8], seed_len: usize) -> Result<Self, ReferenceError> {
        if reference.is_empty() {
            return Err(ReferenceError::EmptyReference);
        }
        if seed_len == 0 || seed_len > MAX_SEED_LEN {
            return Err(ReferenceError::InvalidSeedLength(seed_len));
        }

        let sequence = reference.to_ascii_uppercase();
        let mut seeds: HashMap<u64, Vec<u64>> = HashMap::new();
        if sequence.len() >= seed_len {
            for (pos, window) in sequence.windows(seed_len).enumerate() {
                if let Some(key) = encode_seed(window) {
                    seeds.entry(key).or_default().push(pos as u64);
                }
            }
        }

        Ok(Self {
            sequence,
            seed_len,
            max_hits: 300,
            seeds,
        })
    }

    /// Seeds with more occurrences than `max_hits` are skipped as popular.
    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = max_hits.max(1);
        self
    }

    /// Reference length.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the reference is empty (never true for a built index).
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Seed length.
    pub fn seed_len(&self) -> usize {
        self.seed_len
    }

    /// Reference bases starting at `location`.
    pub fn window(&self, location: GenomeLocation, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(location.get()).ok()?;
        self.sequence.get(start..start.checked_add(len)?)
    }

    /// Candidate starts for `read` on both strands, sorted and deduplicated.
    ///
    /// Seeds are sampled every `seed_len` bases.
    pub fn candidates(&self, read: &[u8], seeds_skipped: &mut u32) -> Vec<Candidate> {
        let mut out = Vec::new();
        if read.len() < self.seed_len {
            return out;
        }

        let reverse = reverse_complement(read);
        for (direction, oriented) in [
            (Direction::Forward, read),
            (Direction::ReverseComplement, reverse.as_slice()),
        ] {
            for offset in (0..=oriented.len() - self.seed_len).step_by(self.seed_len) {
                let Some(key) = encode_seed(&oriented[offset..offset + self.seed_len]) else {
                    continue;
                };
                let Some(hits) = self.seeds.get(&key) else {
                    continue;
                };
                if hits.len() > self.max_hits {
                    *seeds_skipped += 1;
                    continue;
                }
                for &pos in hits {
                    let Some(start) = pos.checked_sub(offset as u64) else {
                        continue;
                    };
                    if start as usize + oriented.len() <= self.sequence.len() {
                        out.push(Candidate {
                            location: GenomeLocation::new(start),
                            direction,
                        });
                    }
                }
            }
        }

        out.sort_unstable();
        out.dedup();
        out
    }

    /// Mismatches between `oriented` and the reference at `location`, or
    /// `None` when the read runs off the reference.
    pub fn mismatches(&self, oriented: &[u8], location: GenomeLocation) -> Option<u32> {
        let window = self.window(location, oriented.len())?;
        Some(
            window
                .iter()
                .zip(oriented)
                .filter(|(reference, read)| !reference.eq_ignore_ascii_case(read))
                .count() as u32,
        )
    }
}

/// Mismatch counts shared by every engine of one barcode.
///
/// Reads of a barcode come from one neighbourhood and are often duplicated,
/// so the same (read, location, strand) triple recurs across pairs.
#[derive(Debug, Default)]
pub struct MismatchCache {
    entries: HashMap<([u8; 32], u64, Direction), Option<u32>>,
    lookups: u64,
    hits: u64,
}

impl MismatchCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached mismatch count for a read digest at a candidate, computing it
    /// on a miss.
    pub fn get_or_compute<F>(
        &mut self,
        digest: &blake3::Hash,
        candidate: Candidate,
        compute: F,
    ) -> Option<u32>
    where
        F: FnOnce() -> Option<u32>,
    {
        self.lookups += 1;
        let key = (
            *digest.as_bytes(),
            candidate.location.get(),
            candidate.direction,
        );
        if let Some(&cached) = self.entries.get(&key) {
            self.hits += 1;
            return cached;
        }
        let value = compute();
        self.entries.insert(key, value);
        value
    }

    /// Lookups served.
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything, e.g. between barcodes.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lookups = 0;
        self.hits = 0;
    }
}
