//! The alert feed poll cycle.
//!
//! [`Poller`] is the state machine behind the periodic refresh: a
//! countdown ticks down once a second, expires into a fetch, and the
//! fetch result is reconciled into the [`AlertFeed`]. The machine is
//! synchronous and single-owner; the caller drives it from one UI loop
//! and dispatches the actual HTTP request when told to, so at most one
//! fetch is ever in flight and responses apply in issue order.
//!
//! Three rules the cycle guarantees:
//! - a countdown expiry while a fetch is in flight re-arms instead of
//!   starting a second fetch;
//! - an expiry while the terminal is unfocused defers the fetch to the
//!   next visible expiry, without accumulating missed cycles;
//! - an arrival signal fires at most once per applied fragment, no
//!   matter how many alerts arrived in it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::error::FeedError;
use crate::feed::{AlertFeed, ApplyOutcome};
use crate::fragment::AlertFragment;

/// Poll cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Counting down to the next fetch
    #[default]
    Idle,
    /// A fetch is in flight
    Fetching,
    /// The last fetch failed; counting down to the retry
    Error,
}

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Seconds between refreshes
    pub interval_secs: u64,
    /// Backoff applied to the countdown after consecutive failures
    pub backoff: BackoffPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        let interval = Duration::from_secs(15);
        Self {
            interval_secs: interval.as_secs(),
            backoff: BackoffPolicy::for_poll(interval, Duration::from_secs(300), 2.0),
        }
    }
}

/// Permission to issue exactly one fetch, tagged with its sequence
/// number. Hand the number back to [`Poller::complete`] with the
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
}

/// What a 1 Hz tick asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing due; seconds remaining on the countdown.
    Waiting { remaining: u64 },
    /// The countdown expired; issue this fetch.
    StartFetch(FetchTicket),
    /// Expired while unfocused; re-armed without fetching.
    Deferred,
    /// Expired while a fetch was already in flight; re-armed.
    Suppressed,
}

/// Events surfaced to the UI after a completion or push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A fragment replaced the displayed state.
    Applied { newly_arrived: usize, count: u64 },
    /// New alerts arrived; raise sound/desktop signals once.
    ArrivalSignal { newly_arrived: usize },
    /// A fetch failed; the cycle keeps retrying.
    FetchFailed {
        message: String,
        last_success: Option<DateTime<Utc>>,
        retry_in_secs: u64,
    },
    /// A previously shown failure has recovered.
    ErrorCleared,
    /// A response arrived too late and was discarded.
    StaleDiscarded { seq: u64 },
}

/// The poll cycle state machine.
#[derive(Debug)]
pub struct Poller {
    feed: AlertFeed,
    config: PollerConfig,
    phase: Phase,
    countdown: u64,
    visible: bool,
    in_flight: Option<u64>,
    consecutive_failures: u32,
    last_error: Option<String>,
}

impl Poller {
    /// Create a poller with a full countdown and an empty feed.
    pub fn new(config: PollerConfig) -> Self {
        let countdown = config.interval_secs;
        Self {
            feed: AlertFeed::new(),
            config,
            phase: Phase::Idle,
            countdown,
            visible: true,
            in_flight: None,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.countdown > 1 {
            self.countdown -= 1;
            return TickOutcome::Waiting {
                remaining: self.countdown,
            };
        }
        self.countdown = 0;

        if self.in_flight.is_some() {
            // Never two fetches at once; wait a full interval and look again.
            self.rearm(self.config.interval_secs);
            return TickOutcome::Suppressed;
        }

        if !self.visible {
            debug!("terminal unfocused, deferring refresh");
            self.rearm(self.config.interval_secs);
            return TickOutcome::Deferred;
        }

        TickOutcome::StartFetch(self.begin_fetch())
    }

    /// Start one immediate out-of-cycle fetch (manual refresh, or the
    /// follow-up after a successful acknowledge). A no-op while a
    /// fetch is already in flight.
    pub fn force_refresh(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() {
            debug!("refresh requested while fetch in flight, ignoring");
            return None;
        }
        Some(self.begin_fetch())
    }

    /// Record the outcome of the fetch issued under `seq`.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<AlertFragment, FeedError>,
    ) -> Vec<FeedEvent> {
        if self.in_flight != Some(seq) {
            debug!(seq, "completion for a fetch that is no longer current");
            return vec![FeedEvent::StaleDiscarded { seq }];
        }
        self.in_flight = None;

        match result {
            Ok(fragment) => self.complete_success(seq, fragment),
            Err(err) => self.complete_failure(err),
        }
    }

    /// Apply a pushed fragment from the live socket.
    ///
    /// The push goes through the same sequence-guarded apply routine as
    /// poll responses; a poll response still in flight becomes stale
    /// the moment the push applies.
    pub fn apply_push(&mut self, fragment: AlertFragment) -> Vec<FeedEvent> {
        let seq = self.feed.allocate_seq();
        let outcome = self.feed.apply(seq, fragment);
        debug!(seq, "socket push applied");
        self.events_for(outcome)
    }

    fn begin_fetch(&mut self) -> FetchTicket {
        let seq = self.feed.allocate_seq();
        self.phase = Phase::Fetching;
        self.in_flight = Some(seq);
        self.countdown = self.config.interval_secs;
        debug!(seq, "starting fetch");
        FetchTicket { seq }
    }

    fn complete_success(&mut self, seq: u64, fragment: AlertFragment) -> Vec<FeedEvent> {
        let was_error = self.phase == Phase::Error || self.last_error.is_some();
        self.phase = Phase::Idle;
        self.consecutive_failures = 0;
        self.last_error = None;
        self.rearm(self.config.interval_secs);

        let outcome = self.feed.apply(seq, fragment);
        let mut events = self.events_for(outcome);
        if was_error {
            info!("refresh recovered");
            events.push(FeedEvent::ErrorCleared);
        }
        events
    }

    fn complete_failure(&mut self, err: FeedError) -> Vec<FeedEvent> {
        self.phase = Phase::Error;
        self.consecutive_failures += 1;
        let retry_in_secs = self
            .config
            .backoff
            .delay_secs_after(self.consecutive_failures);
        self.rearm(retry_in_secs);

        let message = err.banner_message();
        warn!(
            failures = self.consecutive_failures,
            retry_in_secs,
            error = %message,
            "fetch failed, retrying"
        );
        self.last_error = Some(message.clone());

        vec![FeedEvent::FetchFailed {
            message,
            last_success: self.feed.last_success(),
            retry_in_secs,
        }]
    }

    fn events_for(&self, outcome: ApplyOutcome) -> Vec<FeedEvent> {
        match outcome {
            ApplyOutcome::Applied {
                newly_arrived,
                count,
            } => {
                let mut events = vec![FeedEvent::Applied {
                    newly_arrived,
                    count,
                }];
                if newly_arrived > 0 {
                    events.push(FeedEvent::ArrivalSignal { newly_arrived });
                }
                events
            }
            ApplyOutcome::Stale { seq, .. } => vec![FeedEvent::StaleDiscarded { seq }],
        }
    }

    fn rearm(&mut self, secs: u64) {
        self.countdown = secs.max(1);
    }

    /// Mark the terminal focused or unfocused (the visibility gate).
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            debug!(visible, "visibility changed");
        }
        self.visible = visible;
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the terminal is currently considered visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Seconds until the next scheduled fetch check.
    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    /// The reconciled feed.
    pub fn feed(&self) -> &AlertFeed {
        &self.feed
    }

    /// Last failure shown in the banner, if the cycle is degraded.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True while a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }
}
