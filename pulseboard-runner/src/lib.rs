//! PulseBoard Runner — dashboard orchestration over `pulseboard-core`.
//!
//! This crate builds on the core engine to provide:
//! - The dashboard pipeline (resolve → fetch → filter → compute → aggregate)
//! - Snapshot caching keyed by FilterState content hash
//! - The refresh state machine (coalescing, stale-discard, staleness tracking)
//! - The controller that owns the current FilterState
//! - Thin per-visualization adapters (ranking table, bucketed series, heatmap)
//! - TOML dashboard configuration

pub mod cache;
pub mod config;
pub mod controller;
pub mod panels;
pub mod pipeline;
pub mod refresh;

pub use cache::SnapshotCache;
pub use config::{ConfigError, DashboardConfig};
pub use controller::DashboardController;
pub use panels::{BucketedSeries, Heatmap, RankingRow, RankingTable, SeriesPoint};
pub use pipeline::{re_aggregate, run_pipeline, DashboardSnapshot, PipelineError};
pub use refresh::{
    CompletionOutcome, Freshness, RefreshController, RefreshPhase, RefreshStatus, RefreshTicket,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn snapshot_is_send_sync() {
        assert_send::<DashboardSnapshot>();
        assert_sync::<DashboardSnapshot>();
    }

    #[test]
    fn controller_is_send() {
        assert_send::<DashboardController>();
        assert_sync::<DashboardController>();
    }

    #[test]
    fn status_types_are_send_sync() {
        assert_send::<RefreshStatus>();
        assert_sync::<RefreshStatus>();
        assert_send::<CompletionOutcome>();
        assert_sync::<CompletionOutcome>();
    }
}
