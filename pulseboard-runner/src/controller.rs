//! DashboardController — single owner of the current FilterState.
//!
//! Panels never hold filter state of their own: the controller installs a
//! new immutable FilterState on every setter call and hands out snapshots
//! built from whatever state was current when the pass started. Any state
//! change invalidates in-flight refresh tickets, so a fetch that raced a
//! filter switch is discarded instead of applied.
//!
//! On fetch failure the previous successful snapshot stays available via
//! `last_good()` — stale-but-valid beats a cleared screen.

use chrono::{DateTime, Utc};
use pulseboard_core::datasource::DataSource;
use pulseboard_core::domain::{
    EntityId, FilterState, MetricKind, Platform, RefreshInterval, SortDirection,
};
use pulseboard_core::timerange::{
    resolve, RangeError, RecentRanges, TimeRangeSelection,
};
use std::collections::BTreeSet;

use crate::cache::SnapshotCache;
use crate::config::DashboardConfig;
use crate::pipeline::{re_aggregate, run_pipeline, DashboardSnapshot, PipelineError};
use crate::refresh::{CompletionOutcome, RefreshController, RefreshStatus, RefreshTicket};

pub struct DashboardController {
    config: DashboardConfig,
    filter: FilterState,
    refresh: RefreshController,
    cache: SnapshotCache,
    recent_ranges: RecentRanges,
    last_good: Option<DashboardSnapshot>,
}

impl DashboardController {
    pub fn new(config: DashboardConfig) -> Self {
        let filter = FilterState::new().with_refresh_interval(config.default_refresh);
        Self::with_filter(config, filter)
    }

    pub fn with_filter(config: DashboardConfig, filter: FilterState) -> Self {
        let refresh = RefreshController::new(filter.refresh_interval);
        let cache = SnapshotCache::new(config.cache_capacity);
        let recent_ranges = RecentRanges::new(config.recent_ranges_cap);
        Self {
            config,
            filter,
            refresh,
            cache,
            recent_ranges,
            last_good: None,
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn recent_ranges(&self) -> &RecentRanges {
        &self.recent_ranges
    }

    pub fn last_good(&self) -> Option<&DashboardSnapshot> {
        self.last_good.as_ref()
    }

    pub fn status(&self, now: DateTime<Utc>) -> RefreshStatus {
        self.refresh.status(now)
    }

    /// Label for the current time range, for UI display.
    pub fn time_range_label(&self, now: DateTime<Utc>) -> Result<String, RangeError> {
        resolve(self.filter.time_range, self.filter.timezone, now).map(|r| r.label)
    }

    // ─── Setters: each installs a new FilterState atomically ────────

    /// Apply a time-range selection.
    ///
    /// Validated by resolving first: an invalid custom range is rejected
    /// here and the current FilterState stays untouched, so no fetch ever
    /// sees it. A successful custom application is recorded in the
    /// recently-used ranges list.
    pub fn set_time_range(
        &mut self,
        selection: TimeRangeSelection,
        now: DateTime<Utc>,
    ) -> Result<(), RangeError> {
        let resolved = resolve(selection, self.filter.timezone, now)?;
        if matches!(selection, TimeRangeSelection::Custom { .. }) {
            self.recent_ranges.record(&resolved);
        }
        self.install(self.filter.with_time_range(selection));
        Ok(())
    }

    pub fn set_timezone(&mut self, timezone: chrono_tz::Tz) {
        self.install(self.filter.with_timezone(timezone));
    }

    pub fn set_platforms(&mut self, platforms: BTreeSet<Platform>) {
        self.install(self.filter.with_platforms(platforms));
    }

    pub fn set_accounts(&mut self, accounts: BTreeSet<EntityId>) {
        self.install(self.filter.with_accounts(accounts));
    }

    /// Change the ranking metric.
    ///
    /// If the current state's snapshot is cached, the new ranking is
    /// derived from its already-filtered entity set — same membership, new
    /// order, no re-fetch.
    pub fn set_primary_metric(&mut self, metric: MetricKind) {
        self.re_rank(metric, self.filter.sort_direction);
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.re_rank(self.filter.primary_metric, direction);
    }

    pub fn set_refresh_interval(&mut self, interval: RefreshInterval) {
        self.install(self.filter.with_refresh_interval(interval));
        self.refresh.set_interval(interval);
    }

    fn re_rank(&mut self, metric: MetricKind, direction: SortDirection) {
        let old_key = self.filter.state_key();
        let re_ranked = self.cache.get(&old_key).map(|s| re_aggregate(s, metric, direction));
        self.install(
            self.filter
                .with_primary_metric(metric)
                .with_sort_direction(direction),
        );
        if let Some(snapshot) = re_ranked {
            self.last_good = Some(snapshot.clone());
            self.cache.put(snapshot);
        }
    }

    fn install(&mut self, filter: FilterState) {
        self.filter = filter;
        self.refresh.invalidate();
    }

    // ─── Snapshots and refresh ──────────────────────────────────────

    /// The current snapshot: cached when available, computed lazily
    /// otherwise.
    pub fn snapshot(
        &mut self,
        now: DateTime<Utc>,
        source: &dyn DataSource,
    ) -> Result<DashboardSnapshot, PipelineError> {
        let key = self.filter.state_key();
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }
        let snapshot = run_pipeline(&self.filter, now, source, &self.config)?;
        self.last_good = Some(snapshot.clone());
        self.cache.put(snapshot.clone());
        Ok(snapshot)
    }

    /// Start (or join) a refresh cycle; the FilterState snapshot the pass
    /// must operate on is captured here, at begin time.
    pub fn begin_refresh(&mut self) -> (RefreshTicket, FilterState) {
        (self.refresh.begin(), self.filter.clone())
    }

    /// Deliver the result of a refresh cycle.
    ///
    /// A ticket invalidated by a FilterState change is discarded: the stale
    /// snapshot is dropped, caches and last-good stay as they were. On an
    /// applied success, all cached aggregation output is invalidated and
    /// the fresh snapshot becomes the new baseline.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        now: DateTime<Utc>,
        result: Result<DashboardSnapshot, PipelineError>,
    ) -> CompletionOutcome {
        match result {
            Ok(snapshot) => {
                let outcome = self.refresh.complete(ticket, now, Ok(()));
                if outcome == CompletionOutcome::Applied {
                    self.cache.invalidate_all();
                    self.last_good = Some(snapshot.clone());
                    self.cache.put(snapshot);
                }
                outcome
            }
            Err(error) => self.refresh.complete(ticket, now, Err(error.to_string())),
        }
    }

    /// Manual refresh: begin, run the pipeline, complete. Coalesced and
    /// cancellable exactly like any other cycle.
    pub fn refresh_now(
        &mut self,
        now: DateTime<Utc>,
        source: &dyn DataSource,
    ) -> Result<DashboardSnapshot, PipelineError> {
        let (ticket, filter) = self.begin_refresh();
        match run_pipeline(&filter, now, source, &self.config) {
            Ok(snapshot) => {
                self.complete_refresh(ticket, now, Ok(snapshot.clone()));
                Ok(snapshot)
            }
            Err(error) => {
                self.refresh
                    .complete(ticket, now, Err(error.to_string()));
                Err(error)
            }
        }
    }

    /// Drive auto-refresh: runs a cycle when the interval timer is due.
    pub fn tick(
        &mut self,
        now: DateTime<Utc>,
        source: &dyn DataSource,
    ) -> Option<Result<DashboardSnapshot, PipelineError>> {
        if self.refresh.due(now) {
            Some(self.refresh_now(now, source))
        } else {
            None
        }
    }
}
