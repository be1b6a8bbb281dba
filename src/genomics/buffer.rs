//! Caller-sized secondary-result buffers.
//!
//! The caller decides how many secondary alignments a buffer may hold. When
//! an engine finds more than fit, the buffer is tagged as overflowed instead
//! of being silently truncated, and the caller grows it before retrying.

/// Outcome of an engine call that writes into a bounded buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferOutcome<T> {
    /// Everything fit; carries the call's payload.
    Fits(T),
    /// More results exist than the buffer capacity allows.
    Overflow,
}

impl<T> BufferOutcome<T> {
    /// Whether the call overflowed.
    pub fn is_overflow(&self) -> bool {
        matches!(self, BufferOutcome::Overflow)
    }
}

/// Tagged count of results held by a [`SecondaryBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryCount {
    /// Number of results that fit.
    Fits(usize),
    /// The buffer overflowed at the given capacity.
    Overflow {
        /// Capacity in effect when the overflow happened.
        capacity: usize,
    },
}

impl Default for SecondaryCount {
    fn default() -> Self {
        SecondaryCount::Fits(0)
    }
}

impl SecondaryCount {
    /// Count in the legacy encoding, where overflow reads as `capacity + 1`.
    pub fn reported(&self) -> usize {
        match *self {
            SecondaryCount::Fits(count) => count,
            SecondaryCount::Overflow { capacity } => capacity + 1,
        }
    }

    /// Whether this count records an overflow.
    pub fn is_overflow(&self) -> bool {
        matches!(self, SecondaryCount::Overflow { .. })
    }
}

/// Bounded buffer of secondary alignments.
#[derive(Debug, Clone)]
pub struct SecondaryBuffer<T> {
    results: Vec<T>,
    capacity: usize,
    count: SecondaryCount,
}

impl<T> SecondaryBuffer<T> {
    /// Empty buffer able to hold `capacity` results.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
            capacity,
            count: SecondaryCount::default(),
        }
    }

    /// Caller-chosen capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tagged count.
    pub fn count(&self) -> SecondaryCount {
        self.count
    }

    /// Results that fit.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    /// Grow to `capacity`; never shrinks. Kept results are preserved.
    pub fn grow(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.results.reserve(capacity - self.results.len());
            self.capacity = capacity;
        }
    }

    /// Drop results and reset the count.
    pub fn clear(&mut self) {
        self.results.clear();
        self.count = SecondaryCount::default();
    }

    /// Storage handed to an engine, emptied first.
    pub(crate) fn storage(&mut self) -> &mut Vec<T> {
        self.results.clear();
        &mut self.results
    }

    /// Storage handed to an engine without clearing it.
    pub(crate) fn results_mut(&mut self) -> &mut Vec<T> {
        &mut self.results
    }

    /// Whether the held results are within capacity.
    pub(crate) fn fits(&self) -> bool {
        self.results.len() <= self.capacity
    }

    /// Record that the engine's results fit.
    pub(crate) fn mark_fits(&mut self) {
        self.count = SecondaryCount::Fits(self.results.len());
    }

    /// Record an overflow, discarding the partial set.
    pub(crate) fn mark_overflow(&mut self) {
        self.results.clear();
        self.count = SecondaryCount::Overflow {
            capacity: self.capacity,
        };
    }
}
