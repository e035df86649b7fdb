//! Metric computation — raw counters into derived metrics.
//!
//! All computation is pure over an immutable entity slice; one
//! `DerivedMetrics` record comes back per entity, in input order. Values are
//! kept at full precision — display rounding is the caller's move via
//! `MetricValue::rounded`. Every zero denominator produces the
//! `MetricValue::Undefined` sentinel, never NaN or infinity.

use crate::domain::{DerivedMetrics, Entity, MetricKind, MetricValue};
use serde::{Deserialize, Serialize};

/// Tunables for derived-metric computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Fraction of followers expected to see a post. Virality compares
    /// actual views against `followers * baseline_reach`.
    pub baseline_reach: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            baseline_reach: 0.10,
        }
    }
}

/// Compute derived metrics for every entity in the filtered group.
///
/// The group matters: contribution share is each entity's slice of the
/// group's total views, so it must be computed against the already-filtered
/// set, not the full catalog.
pub fn compute_all(entities: &[Entity], config: &MetricConfig) -> Vec<DerivedMetrics> {
    let group_views: u64 = entities.iter().map(|e| e.counters.views).sum();
    entities
        .iter()
        .map(|e| compute_one(e, group_views, config))
        .collect()
}

fn compute_one(entity: &Entity, group_views: u64, config: &MetricConfig) -> DerivedMetrics {
    let c = &entity.counters;
    let views = c.views as f64;

    let engagement_rate = MetricValue::ratio(c.interactions() as f64 * 100.0, views);
    let like_rate = MetricValue::ratio(c.likes as f64 * 100.0, views);
    let comment_rate = MetricValue::ratio(c.comments as f64 * 100.0, views);
    let contribution_share = MetricValue::ratio(views * 100.0, group_views as f64);

    DerivedMetrics {
        engagement_rate,
        like_rate,
        comment_rate,
        contribution_share,
        consistency_score: consistency_score(&c.daily_post_counts),
        virality_score: virality_score(views, c.followers as f64, config.baseline_reach),
        growth_rate: growth_rate(c.followers_start as f64, c.followers_end as f64),
    }
}

/// Stability of posting cadence from the coefficient of variation of daily
/// post counts: `clamp(100 - (stddev/mean)*100, 0, 100)`.
fn consistency_score(daily_post_counts: &[u32]) -> MetricValue {
    if daily_post_counts.is_empty() {
        return MetricValue::Undefined;
    }
    let n = daily_post_counts.len() as f64;
    let mean = daily_post_counts.iter().map(|&c| c as f64).sum::<f64>() / n;
    if mean == 0.0 {
        return MetricValue::Undefined;
    }
    let variance = daily_post_counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let cv = variance.sqrt() / mean;
    MetricValue::Defined((100.0 - cv * 100.0).clamp(0.0, 100.0))
}

/// Actual views relative to expected reach: `(views / (followers * baseline)) * 100`.
fn virality_score(views: f64, followers: f64, baseline_reach: f64) -> MetricValue {
    let expected = followers * baseline_reach;
    MetricValue::ratio(views * 100.0, expected)
}

/// Follower growth over the interval: `(end - start) / start * 100`.
fn growth_rate(start: f64, end: f64) -> MetricValue {
    MetricValue::ratio((end - start) * 100.0, start)
}

/// Uniform accessor the aggregator ranks by: counts come straight off the
/// raw counters, rates off the derived record.
pub fn metric_value(entity: &Entity, derived: &DerivedMetrics, kind: MetricKind) -> MetricValue {
    let c = &entity.counters;
    match kind {
        MetricKind::Views => MetricValue::Defined(c.views as f64),
        MetricKind::Likes => MetricValue::Defined(c.likes as f64),
        MetricKind::Comments => MetricValue::Defined(c.comments as f64),
        MetricKind::Shares => MetricValue::Defined(c.shares as f64),
        MetricKind::Posts => MetricValue::Defined(c.posts_count as f64),
        MetricKind::Followers => MetricValue::Defined(c.followers as f64),
        MetricKind::EngagementRate => derived.engagement_rate,
        MetricKind::LikeRate => derived.like_rate,
        MetricKind::CommentRate => derived.comment_rate,
        MetricKind::ContributionShare => derived.contribution_share,
        MetricKind::ConsistencyScore => derived.consistency_score,
        MetricKind::ViralityScore => derived.virality_score,
        MetricKind::GrowthRate => derived.growth_rate,
    }
}
