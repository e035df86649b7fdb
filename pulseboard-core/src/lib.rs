//! PulseBoard Core — the filter-resolution and metric-aggregation engine.
//!
//! This crate contains the heart of the analytics dashboard:
//! - Domain types (entities, raw counters, metric kinds, the immutable FilterState)
//! - Time-range resolution (presets, custom intervals, bucket granularity)
//! - Entity filtering (pure platform/account scope predicate)
//! - Metric computation (engagement, contribution, consistency, virality, growth)
//! - Aggregation (ranked, totalled result sets with pure pagination)
//! - The DataSource trait and the deterministic seeded synthetic adapter
//! - CSV export and display formatting

pub mod aggregate;
pub mod datasource;
pub mod domain;
pub mod export;
pub mod filter;
pub mod metrics;
pub mod timerange;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the controller boundary
    /// is Send + Sync, so a background fetch thread can be introduced
    /// without a retrofit.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Entity>();
        require_sync::<domain::Entity>();
        require_send::<domain::EntityId>();
        require_sync::<domain::EntityId>();
        require_send::<domain::Platform>();
        require_sync::<domain::Platform>();
        require_send::<domain::RawCounters>();
        require_sync::<domain::RawCounters>();
        require_send::<domain::ActivitySample>();
        require_sync::<domain::ActivitySample>();
        require_send::<domain::FilterState>();
        require_sync::<domain::FilterState>();
        require_send::<domain::StateKey>();
        require_sync::<domain::StateKey>();
        require_send::<domain::MetricValue>();
        require_sync::<domain::MetricValue>();
        require_send::<domain::DerivedMetrics>();
        require_sync::<domain::DerivedMetrics>();

        // Range types
        require_send::<timerange::ResolvedRange>();
        require_sync::<timerange::ResolvedRange>();
        require_send::<timerange::RecentRanges>();
        require_sync::<timerange::RecentRanges>();

        // Aggregation output
        require_send::<aggregate::ResultSet>();
        require_sync::<aggregate::ResultSet>();
        require_send::<aggregate::AggregateRow>();
        require_sync::<aggregate::AggregateRow>();

        // Sources
        require_send::<datasource::SyntheticSource>();
        require_sync::<datasource::SyntheticSource>();
        require_send::<datasource::FetchBatch>();
        require_sync::<datasource::FetchBatch>();
    }

    /// Architecture contract: `filter_entities` is a pure function of its
    /// three inputs — catalog, platform set, account set. There is no
    /// hidden filter state anywhere in the signature.
    #[test]
    fn entity_filter_has_no_hidden_state() {
        fn _check_signature_builds(
            catalog: &[domain::Entity],
            platforms: &std::collections::BTreeSet<domain::Platform>,
            accounts: &std::collections::BTreeSet<domain::EntityId>,
        ) -> Vec<domain::Entity> {
            filter::filter_entities(catalog, platforms, accounts)
        }
    }
}
