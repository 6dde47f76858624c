//! Per-subflow counter snapshots
//!
//! The kernel extension exposes each subflow as a positional array of raw
//! counters. That array is converted into the named [`SubflowCounters`]
//! record exactly once, here at the provider boundary, so no other code ever
//! re-interprets positional indices.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of positional fields the provider contract promises per subflow.
pub const RAW_COUNTER_FIELDS: usize = 5;

/// One snapshot of one subflow's raw kernel counters.
///
/// Immutable once read; carries no identity beyond the sampling tick it
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubflowCounters {
    /// Segments sent on this subflow
    pub segments_out: u64,
    /// Smoothed round-trip time in microseconds
    pub rtt_us: u64,
    /// Congestion window in segments
    pub cwnd: u64,
    /// Segments sent but not yet acknowledged
    pub unacked: u64,
    /// Retransmitted segments
    pub retransmits: u64,
}

impl SubflowCounters {
    /// Build a counters record from the provider's positional array.
    ///
    /// Field order is `[segments_out, rtt_us, cwnd, unacked, retransmits]`.
    /// Negative raw values can appear across kernel counter resets and are
    /// clamped to 0 so no negative throughput or loss can propagate inward.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCounters`] if the array is shorter than
    /// [`RAW_COUNTER_FIELDS`].
    pub fn from_raw(raw: &[i64]) -> Result<Self> {
        if raw.len() < RAW_COUNTER_FIELDS {
            return Err(Error::MalformedCounters {
                expected: RAW_COUNTER_FIELDS,
                actual: raw.len(),
            });
        }
        let clamp = |v: i64| -> u64 { v.max(0) as u64 };
        Ok(Self {
            segments_out: clamp(raw[0]),
            rtt_us: clamp(raw[1]),
            cwnd: clamp(raw[2]),
            unacked: clamp(raw[3]),
            retransmits: clamp(raw[4]),
        })
    }

    /// Per-subflow loss fraction, `retransmits / segments_out`, clamped into
    /// `[0, 1]`. Defined as 0 when no segments went out.
    #[must_use]
    pub fn loss_fraction(&self) -> f64 {
        if self.segments_out == 0 {
            return 0.0;
        }
        let loss = self.retransmits as f64 / self.segments_out as f64;
        loss.min(1.0)
    }
}

/// Ordered per-subflow counters at one sampling instant.
///
/// Transient: produced by a [`SubflowStatsProvider`], consumed by the
/// sampler within the same tick, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubflowSnapshot {
    subflows: Vec<SubflowCounters>,
}

impl SubflowSnapshot {
    /// Create a snapshot from already-validated counters.
    #[must_use]
    pub fn new(subflows: Vec<SubflowCounters>) -> Self {
        Self { subflows }
    }

    /// Create a snapshot from the provider's positional arrays, validating
    /// each subflow entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCounters`] on the first short entry.
    pub fn from_raw<R: AsRef<[i64]>>(raw: &[R]) -> Result<Self> {
        let subflows = raw
            .iter()
            .map(|r| SubflowCounters::from_raw(r.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { subflows })
    }

    /// Number of active subflows in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subflows.len()
    }

    /// Whether the snapshot contains no subflows (connection quiescent or
    /// still establishing).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subflows.is_empty()
    }

    /// Iterate the per-subflow counters in kernel order.
    pub fn iter(&self) -> std::slice::Iter<'_, SubflowCounters> {
        self.subflows.iter()
    }
}

impl<'a> IntoIterator for &'a SubflowSnapshot {
    type Item = &'a SubflowCounters;
    type IntoIter = std::slice::Iter<'a, SubflowCounters>;

    fn into_iter(self) -> Self::IntoIter {
        self.subflows.iter()
    }
}

/// Source of per-subflow counter snapshots for a live connection handle.
///
/// This is the narrow interface over the kernel-level extension. A real
/// implementation requires a patched kernel; tests substitute scripted
/// doubles.
pub trait SubflowStatsProvider<H> {
    /// Read the current per-subflow counters for `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderUnavailable`] when the kernel extension is
    /// absent, [`Error::MalformedCounters`] when it answers with short
    /// positional arrays.
    fn snapshot(&self, handle: &H) -> Result<SubflowSnapshot>;
}
