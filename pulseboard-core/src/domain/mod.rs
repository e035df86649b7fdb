//! Domain types: entities, metric kinds, and the immutable FilterState.

pub mod entity;
pub mod filter_state;
pub mod metric;

pub use entity::{ActivitySample, Entity, EntityId, Platform, RawCounters};
pub use filter_state::{FilterState, RefreshInterval, StateKey};
pub use metric::{DerivedMetrics, MetricKind, MetricValue, SortDirection, TotalMode};
