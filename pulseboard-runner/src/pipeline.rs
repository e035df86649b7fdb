//! The dashboard pipeline: FilterState in, DashboardSnapshot out.
//!
//! One pass runs resolve → fetch → filter → compute → aggregate and builds
//! the series and heatmap exactly once from the fetched samples. The
//! snapshot owns a copy of the FilterState it was built from, so an
//! in-progress pass can never observe a half-updated filter. Range
//! validation happens before the fetch: an invalid custom range never
//! reaches the data source.

use chrono::{DateTime, Utc};
use pulseboard_core::aggregate::{AggregationPass, ResultSet};
use pulseboard_core::datasource::{DataSource, FetchError};
use pulseboard_core::domain::{
    ActivitySample, DerivedMetrics, Entity, FilterState, MetricKind, SortDirection, StateKey,
};
use pulseboard_core::filter::filter_entities;
use pulseboard_core::metrics::{compute_all, MetricConfig};
use pulseboard_core::timerange::{resolve, RangeError, ResolvedRange};
use thiserror::Error;

use crate::config::DashboardConfig;
use crate::panels::{BucketedSeries, Heatmap};

/// Errors the pipeline can surface. NoData is deliberately absent: an empty
/// filtered set is a legitimate snapshot state, not a failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Everything one pipeline pass produced, computed once per fetch.
///
/// Panels read this and only this; nothing downstream recomputes metrics,
/// so every panel agrees on the same numbers until the next refresh.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    /// The FilterState captured when the pass started.
    pub filter: FilterState,
    pub state_key: StateKey,
    pub range: ResolvedRange,
    /// Filtered entities, catalog order.
    pub entities: Vec<Entity>,
    /// Derived metrics, parallel to `entities`.
    pub derived: Vec<DerivedMetrics>,
    pub result_set: ResultSet,
    pub series: BucketedSeries,
    pub heatmap: Heatmap,
    pub fetched_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// The "no data" state: filtered set came back empty.
    pub fn is_no_data(&self) -> bool {
        self.result_set.is_empty()
    }
}

/// Run one full pass for a FilterState.
pub fn run_pipeline(
    filter: &FilterState,
    now: DateTime<Utc>,
    source: &dyn DataSource,
    config: &DashboardConfig,
) -> Result<DashboardSnapshot, PipelineError> {
    // Resolve first: an invalid range fails here, before any fetch.
    let range = resolve(filter.time_range, filter.timezone, now)?;
    let batch = source.fetch(filter, &range)?;
    Ok(build_snapshot(
        filter.clone(),
        range,
        batch.entities,
        batch.samples,
        now,
        config,
    ))
}

fn build_snapshot(
    filter: FilterState,
    range: ResolvedRange,
    catalog: Vec<Entity>,
    samples: Vec<ActivitySample>,
    fetched_at: DateTime<Utc>,
    config: &DashboardConfig,
) -> DashboardSnapshot {
    let entities = filter_entities(&catalog, &filter.platforms, &filter.accounts);
    let metric_config = MetricConfig {
        baseline_reach: config.baseline_reach,
    };
    let derived = compute_all(&entities, &metric_config);

    let mut pass = AggregationPass::new(
        &entities,
        &derived,
        filter.primary_metric,
        filter.sort_direction,
        config.chunk_size,
    );
    while !pass.step() {}
    let result_set = pass.finish();

    let series = BucketedSeries::build(&range, &entities, &samples);
    let heatmap = Heatmap::build(&range, &entities, &samples);

    let state_key = filter.state_key();
    DashboardSnapshot {
        filter,
        state_key,
        range,
        entities,
        derived,
        result_set,
        series,
        heatmap,
        fetched_at,
    }
}

/// Re-rank an existing snapshot by a different metric or direction.
///
/// Operates on the snapshot's own filtered set: no re-filter, no re-fetch.
/// The returned snapshot carries the updated FilterState and state key;
/// series and heatmap are untouched because membership did not change.
pub fn re_aggregate(
    snapshot: &DashboardSnapshot,
    metric: MetricKind,
    direction: SortDirection,
) -> DashboardSnapshot {
    let filter = snapshot
        .filter
        .with_primary_metric(metric)
        .with_sort_direction(direction);
    let result_set = pulseboard_core::aggregate::aggregate(
        &snapshot.entities,
        &snapshot.derived,
        metric,
        direction,
    );
    let state_key = filter.state_key();
    DashboardSnapshot {
        filter,
        state_key,
        result_set,
        ..snapshot.clone()
    }
}
