//! Refresh coordination — an explicit state machine, not ad hoc timers.
//!
//! Phases: `Idle → Refreshing → Idle` (an error returns to Idle with
//! `last_error` set). A parallel fresh/stale flag is derived from the
//! configured interval and the last completion instant. Everything is
//! driven by explicit instants passed in by the caller — there are no real
//! timers, so the machine is deterministic and trivially testable.
//!
//! Concurrency rules the machine enforces:
//! - Coalescing: `begin` during an in-flight refresh returns the existing
//!   ticket instead of starting a second cycle.
//! - Stale discard: `invalidate` (called on any FilterState change) bumps
//!   the generation; a completion carrying an old-generation ticket is
//!   discarded rather than applied.

use chrono::{DateTime, Duration, Utc};
use pulseboard_core::domain::RefreshInterval;
use serde::{Deserialize, Serialize};

/// Where the refresh cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

/// Whether displayed data is within the configured interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// Handle for one refresh cycle. Carries the generation it was issued
/// under; a FilterState change invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

/// What `complete` did with the ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The result belongs to the current generation and was applied.
    Applied,
    /// The ticket predates a FilterState change; the result was discarded.
    DiscardedStale,
    /// The refresh failed; previous data stays on display.
    Failed,
}

/// Observable refresh state for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshStatus {
    pub phase: RefreshPhase,
    pub freshness: Freshness,
    pub last_completed: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// The refresh state machine.
#[derive(Debug)]
pub struct RefreshController {
    interval: RefreshInterval,
    phase: RefreshPhase,
    generation: u64,
    in_flight: Option<RefreshTicket>,
    last_completed: Option<DateTime<Utc>>,
    /// Next auto-refresh instant; restarted by every completion and by
    /// manual refreshes.
    deadline: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl RefreshController {
    pub fn new(interval: RefreshInterval) -> Self {
        Self {
            interval,
            phase: RefreshPhase::Idle,
            generation: 0,
            in_flight: None,
            last_completed: None,
            deadline: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    pub fn interval(&self) -> RefreshInterval {
        self.interval
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_completed(&self) -> Option<DateTime<Utc>> {
        self.last_completed
    }

    /// Replace the interval and restart the deadline from the last
    /// completion.
    pub fn set_interval(&mut self, interval: RefreshInterval) {
        self.interval = interval;
        self.deadline = match (interval.as_secs(), self.last_completed) {
            (Some(secs), Some(at)) => Some(at + Duration::seconds(secs as i64)),
            _ => None,
        };
    }

    /// With auto-refresh off, data never goes stale; otherwise it is stale
    /// until the first completion and again once the interval elapses.
    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        let Some(secs) = self.interval.as_secs() else {
            return Freshness::Fresh;
        };
        match self.last_completed {
            None => Freshness::Stale,
            Some(at) if now - at >= Duration::seconds(secs as i64) => Freshness::Stale,
            Some(_) => Freshness::Fresh,
        }
    }

    /// True when the interval timer says an auto-refresh should start.
    pub fn due(&self, now: DateTime<Utc>) -> bool {
        if self.phase == RefreshPhase::Refreshing || self.interval.as_secs().is_none() {
            return false;
        }
        match self.deadline {
            None => true, // never completed: first refresh is due immediately
            Some(deadline) => now >= deadline,
        }
    }

    /// Start (or join) a refresh cycle.
    ///
    /// A refresh already in flight is awaited, not duplicated: the caller
    /// gets the same ticket back.
    pub fn begin(&mut self) -> RefreshTicket {
        if let Some(ticket) = self.in_flight {
            return ticket;
        }
        let ticket = RefreshTicket {
            generation: self.generation,
        };
        self.in_flight = Some(ticket);
        self.phase = RefreshPhase::Refreshing;
        ticket
    }

    /// Finish a refresh cycle.
    pub fn complete(
        &mut self,
        ticket: RefreshTicket,
        now: DateTime<Utc>,
        result: Result<(), String>,
    ) -> CompletionOutcome {
        if ticket.generation != self.generation {
            return CompletionOutcome::DiscardedStale;
        }
        self.in_flight = None;
        self.phase = RefreshPhase::Idle;
        match result {
            Ok(()) => {
                self.last_completed = Some(now);
                self.last_error = None;
                self.deadline = self
                    .interval
                    .as_secs()
                    .map(|secs| now + Duration::seconds(secs as i64));
                CompletionOutcome::Applied
            }
            Err(message) => {
                self.last_error = Some(message);
                CompletionOutcome::Failed
            }
        }
    }

    /// The FilterState changed: any in-flight refresh belongs to the old
    /// state and must not apply.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.phase = RefreshPhase::Idle;
    }

    pub fn status(&self, now: DateTime<Utc>) -> RefreshStatus {
        RefreshStatus {
            phase: self.phase,
            freshness: self.freshness(now),
            last_completed: self.last_completed,
            last_error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn begin_then_complete_round_trip() {
        let mut ctl = RefreshController::new(RefreshInterval::ONE_MINUTE);
        assert_eq!(ctl.phase(), RefreshPhase::Idle);
        let ticket = ctl.begin();
        assert_eq!(ctl.phase(), RefreshPhase::Refreshing);
        assert_eq!(ctl.complete(ticket, t0(), Ok(())), CompletionOutcome::Applied);
        assert_eq!(ctl.phase(), RefreshPhase::Idle);
        assert_eq!(ctl.last_completed(), Some(t0()));
        assert!(ctl.last_error().is_none());
    }

    #[test]
    fn concurrent_begins_coalesce() {
        let mut ctl = RefreshController::new(RefreshInterval::ONE_MINUTE);
        let first = ctl.begin();
        let second = ctl.begin();
        assert_eq!(first, second);
    }

    #[test]
    fn filter_change_discards_in_flight_ticket() {
        let mut ctl = RefreshController::new(RefreshInterval::ONE_MINUTE);
        let ticket = ctl.begin();
        ctl.invalidate();
        assert_eq!(
            ctl.complete(ticket, t0(), Ok(())),
            CompletionOutcome::DiscardedStale
        );
        // Discard must not count as a completion.
        assert_eq!(ctl.last_completed(), None);
    }

    #[test]
    fn failure_records_error_and_returns_to_idle() {
        let mut ctl = RefreshController::new(RefreshInterval::ONE_MINUTE);
        let ticket = ctl.begin();
        assert_eq!(
            ctl.complete(ticket, t0(), Err("upstream down".into())),
            CompletionOutcome::Failed
        );
        assert_eq!(ctl.phase(), RefreshPhase::Idle);
        assert_eq!(ctl.last_error(), Some("upstream down"));
        // A later success clears the error.
        let ticket = ctl.begin();
        ctl.complete(ticket, t0(), Ok(()));
        assert!(ctl.last_error().is_none());
    }

    #[test]
    fn freshness_tracks_the_interval() {
        let mut ctl = RefreshController::new(RefreshInterval::ONE_MINUTE);
        assert_eq!(ctl.freshness(t0()), Freshness::Stale);
        let ticket = ctl.begin();
        ctl.complete(ticket, t0(), Ok(()));
        assert_eq!(ctl.freshness(t0() + Duration::seconds(30)), Freshness::Fresh);
        assert_eq!(ctl.freshness(t0() + Duration::seconds(60)), Freshness::Stale);
    }

    #[test]
    fn off_interval_never_goes_stale_or_comes_due() {
        let ctl = RefreshController::new(RefreshInterval::Off);
        assert_eq!(ctl.freshness(t0()), Freshness::Fresh);
        assert!(!ctl.due(t0()));
    }

    #[test]
    fn completion_restarts_the_deadline() {
        let mut ctl = RefreshController::new(RefreshInterval::ONE_MINUTE);
        assert!(ctl.due(t0()));
        let ticket = ctl.begin();
        assert!(!ctl.due(t0())); // in flight
        ctl.complete(ticket, t0(), Ok(()));
        assert!(!ctl.due(t0() + Duration::seconds(59)));
        assert!(ctl.due(t0() + Duration::seconds(60)));
    }

    #[test]
    fn manual_refresh_restarts_the_interval_timer() {
        let mut ctl = RefreshController::new(RefreshInterval::ONE_MINUTE);
        let ticket = ctl.begin();
        ctl.complete(ticket, t0(), Ok(()));
        // Manual refresh 30s in: deadline moves to t0+90s.
        let manual = ctl.begin();
        ctl.complete(manual, t0() + Duration::seconds(30), Ok(()));
        assert!(!ctl.due(t0() + Duration::seconds(89)));
        assert!(ctl.due(t0() + Duration::seconds(90)));
    }
}
