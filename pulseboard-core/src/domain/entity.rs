//! Entity — a tracked social-media account and its raw counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Social network a tracked account lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Instagram,
    Tiktok,
    X,
    Facebook,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Youtube,
        Platform::Instagram,
        Platform::Tiktok,
        Platform::X,
        Platform::Facebook,
    ];
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::X => "x",
            Platform::Facebook => "facebook",
        };
        f.write_str(s)
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            "x" | "twitter" => Ok(Platform::X),
            "facebook" => Ok(Platform::Facebook),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Unique account identifier.
///
/// `Ord` matters: the id is the deterministic secondary sort key for rank
/// tie-breaking, and account sets live in `BTreeSet` so FilterState
/// serialization is canonical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw counters for one entity over the resolved time interval.
///
/// Supplied fresh by the data source on each fetch and never mutated in
/// place; derived metrics are recomputed from these, not patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCounters {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub posts_count: u64,
    pub followers: u64,
    /// Follower reading at the start of the interval, for growth rate.
    pub followers_start: u64,
    /// Follower reading at the end of the interval, for growth rate.
    pub followers_end: u64,
    /// Posts published per day across the interval, for the consistency score.
    pub daily_post_counts: Vec<u32>,
}

impl RawCounters {
    /// Total interactions: likes + comments + shares.
    pub fn interactions(&self) -> u64 {
        self.likes + self.comments + self.shares
    }
}

/// A tracked account: the user's own or a competitor's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub platform: Platform,
    /// True for the user's own account, false for a tracked competitor.
    pub owned: bool,
    pub counters: RawCounters,
}

/// One timestamped activity observation for an entity.
///
/// The pipeline folds samples into time-bucketed series and the day×hour
/// heatmap; samples outside the resolved interval are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySample {
    pub entity_id: EntityId,
    pub recorded_at: DateTime<Utc>,
    pub views: u64,
    pub interactions: u64,
}
