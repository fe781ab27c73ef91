//! The reconciled alert feed.
//!
//! [`AlertFeed`] owns the snapshot of displayed fingerprints and the
//! single apply routine that both update channels (poll and push) go
//! through. Every apply is guarded by a monotonic sequence number so a
//! slow poll response can never overwrite a newer push, and vice versa.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::fragment::AlertFragment;

/// Outcome of applying a fragment to the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The fragment replaced the displayed state.
    Applied {
        /// Fingerprints present now but not in the previous snapshot
        newly_arrived: usize,
        /// Total alert count reported by the server
        count: u64,
    },
    /// The fragment was older than what is already displayed.
    Stale { seq: u64, last_applied: u64 },
}

impl ApplyOutcome {
    /// True when this apply should raise the arrival signal.
    pub fn has_arrivals(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { newly_arrived, .. } if *newly_arrived > 0)
    }
}

/// Reconciled view of the current alert list.
///
/// The snapshot always reflects exactly the fingerprints of the most
/// recently applied fragment; nothing survives a successful apply.
#[derive(Debug, Default)]
pub struct AlertFeed {
    snapshot: HashSet<String>,
    latest: Option<AlertFragment>,
    last_success: Option<DateTime<Utc>>,
    next_seq: u64,
    last_applied_seq: u64,
    primed: bool,
}

impl AlertFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the sequence number for a new request or push.
    ///
    /// Sequence numbers are shared by both channels; whichever payload
    /// carries the highest applied number wins.
    pub fn allocate_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Apply a fragment received under the given sequence number.
    ///
    /// Replaces the snapshot wholesale and reports how many
    /// fingerprints are new relative to the previous snapshot. The
    /// very first apply is the initial population: it seeds the
    /// snapshot and reports zero arrivals, so alerts already showing
    /// at startup never ring the bell.
    /// Fragments at or below the last applied sequence are discarded.
    pub fn apply(&mut self, seq: u64, fragment: AlertFragment) -> ApplyOutcome {
        if seq <= self.last_applied_seq {
            debug!(seq, last_applied = self.last_applied_seq, "discarding stale fragment");
            return ApplyOutcome::Stale {
                seq,
                last_applied: self.last_applied_seq,
            };
        }

        let extracted = fragment.fingerprints();
        let newly_arrived = if self.primed {
            extracted.difference(&self.snapshot).count()
        } else {
            0
        };
        let count = fragment.count;

        self.snapshot = extracted;
        self.latest = Some(fragment);
        self.last_applied_seq = seq;
        self.last_success = Some(Utc::now());
        self.primed = true;

        debug!(seq, newly_arrived, count, "fragment applied");
        ApplyOutcome::Applied {
            newly_arrived,
            count,
        }
    }

    /// The currently displayed fingerprints.
    pub fn snapshot(&self) -> &HashSet<String> {
        &self.snapshot
    }

    /// True if the given fingerprint is currently displayed.
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.snapshot.contains(fingerprint)
    }

    /// The most recently applied fragment, if any.
    pub fn latest(&self) -> Option<&AlertFragment> {
        self.latest.as_ref()
    }

    /// Time of the last successful apply, if any.
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// Sequence number of the most recently applied fragment.
    pub fn last_applied_seq(&self) -> u64 {
        self.last_applied_seq
    }
}
