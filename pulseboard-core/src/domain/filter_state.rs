//! FilterState — the immutable snapshot of every user-chosen scoping dimension.
//!
//! A FilterState is never mutated: each `with_*` setter returns a new value
//! that replaces the old one atomically. An in-progress pipeline pass always
//! operates on the snapshot it captured at start, so a half-updated filter
//! can never be observed.
//!
//! `state_key()` is the cache key: blake3 over canonical JSON. All
//! collections are BTree-ordered so serialization is deterministic.

use crate::domain::entity::{EntityId, Platform};
use crate::domain::metric::{MetricKind, SortDirection};
use crate::timerange::{RangePreset, TimeRangeSelection};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Auto-refresh cadence. `Off` disables staleness tracking entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RefreshInterval {
    Off,
    Every { secs: u64 },
}

impl RefreshInterval {
    pub const THIRTY_SECONDS: RefreshInterval = RefreshInterval::Every { secs: 30 };
    pub const ONE_MINUTE: RefreshInterval = RefreshInterval::Every { secs: 60 };
    pub const FIVE_MINUTES: RefreshInterval = RefreshInterval::Every { secs: 300 };

    pub fn as_secs(&self) -> Option<u64> {
        match self {
            RefreshInterval::Off => None,
            RefreshInterval::Every { secs } => Some(*secs),
        }
    }
}

/// Opaque content hash of a FilterState, used as the aggregation cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The complete set of user-chosen scoping dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub time_range: TimeRangeSelection,
    pub timezone: Tz,
    pub platforms: BTreeSet<Platform>,
    pub accounts: BTreeSet<EntityId>,
    pub primary_metric: MetricKind,
    pub sort_direction: SortDirection,
    pub refresh_interval: RefreshInterval,
}

impl FilterState {
    /// Default scope: last 7 days in UTC, all platforms, no accounts selected,
    /// ranked by views descending, auto-refresh off.
    pub fn new() -> Self {
        Self {
            time_range: TimeRangeSelection::preset(RangePreset::Last7d),
            timezone: chrono_tz::UTC,
            platforms: Platform::ALL.into_iter().collect(),
            accounts: BTreeSet::new(),
            primary_metric: MetricKind::Views,
            sort_direction: SortDirection::Descending,
            refresh_interval: RefreshInterval::Off,
        }
    }

    pub fn with_time_range(&self, time_range: TimeRangeSelection) -> Self {
        Self {
            time_range,
            ..self.clone()
        }
    }

    pub fn with_timezone(&self, timezone: Tz) -> Self {
        Self {
            timezone,
            ..self.clone()
        }
    }

    pub fn with_platforms(&self, platforms: BTreeSet<Platform>) -> Self {
        Self {
            platforms,
            ..self.clone()
        }
    }

    pub fn with_accounts(&self, accounts: BTreeSet<EntityId>) -> Self {
        Self {
            accounts,
            ..self.clone()
        }
    }

    pub fn with_primary_metric(&self, primary_metric: MetricKind) -> Self {
        Self {
            primary_metric,
            ..self.clone()
        }
    }

    pub fn with_sort_direction(&self, sort_direction: SortDirection) -> Self {
        Self {
            sort_direction,
            ..self.clone()
        }
    }

    pub fn with_refresh_interval(&self, refresh_interval: RefreshInterval) -> Self {
        Self {
            refresh_interval,
            ..self.clone()
        }
    }

    /// Content-addressed identity of this FilterState.
    ///
    /// Canonical JSON (BTree-ordered collections, struct fields in
    /// declaration order) hashed with blake3. Two equal states always share
    /// a key; any dimension change produces a new one.
    pub fn state_key(&self) -> StateKey {
        let json = serde_json::to_string(self).expect("FilterState must serialize");
        StateKey(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}
