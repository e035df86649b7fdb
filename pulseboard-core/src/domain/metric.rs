//! Metric kinds, the undefined-value sentinel, and derived metric records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A metric value that may be undefined (zero denominator upstream).
///
/// The sentinel replaces NaN/infinity everywhere: a division by zero in a
/// derived metric produces `Undefined`, which presentation layers render as
/// "insufficient data" rather than a number. `Defined` never wraps a
/// non-finite f64.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Defined(f64),
    Undefined,
}

impl MetricValue {
    /// Wrap a computed value, mapping any non-finite result to `Undefined`.
    pub fn from_f64(v: f64) -> Self {
        if v.is_finite() {
            MetricValue::Defined(v)
        } else {
            MetricValue::Undefined
        }
    }

    /// Divide with a zero-denominator guard.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            MetricValue::Undefined
        } else {
            MetricValue::from_f64(numerator / denominator)
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, MetricValue::Defined(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Defined(v) => Some(*v),
            MetricValue::Undefined => None,
        }
    }

    /// Full-precision value is retained; this produces the display rounding.
    pub fn rounded(&self, decimals: u32) -> MetricValue {
        match self {
            MetricValue::Defined(v) => {
                let factor = 10f64.powi(decimals as i32);
                MetricValue::Defined((v * factor).round() / factor)
            }
            MetricValue::Undefined => MetricValue::Undefined,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Defined(v) => write!(f, "{v}"),
            MetricValue::Undefined => f.write_str("insufficient data"),
        }
    }
}

/// How a metric's synthetic Total row is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalMode {
    /// Count metric: sum of the filtered rows.
    Sum,
    /// Rate metric weighted by each entity's views.
    ViewWeighted,
    /// Score metric averaged over the entities that define it.
    Mean,
    /// Contribution share: totals to exactly 100 when any views exist.
    FixedHundred,
}

/// The metric a panel ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Views,
    Likes,
    Comments,
    Shares,
    Posts,
    Followers,
    EngagementRate,
    LikeRate,
    CommentRate,
    ContributionShare,
    ConsistencyScore,
    ViralityScore,
    GrowthRate,
}

impl MetricKind {
    pub const ALL: [MetricKind; 13] = [
        MetricKind::Views,
        MetricKind::Likes,
        MetricKind::Comments,
        MetricKind::Shares,
        MetricKind::Posts,
        MetricKind::Followers,
        MetricKind::EngagementRate,
        MetricKind::LikeRate,
        MetricKind::CommentRate,
        MetricKind::ContributionShare,
        MetricKind::ConsistencyScore,
        MetricKind::ViralityScore,
        MetricKind::GrowthRate,
    ];

    /// True for percentage/score metrics, false for raw counts.
    pub fn is_rate(&self) -> bool {
        !matches!(
            self,
            MetricKind::Views
                | MetricKind::Likes
                | MetricKind::Comments
                | MetricKind::Shares
                | MetricKind::Posts
                | MetricKind::Followers
        )
    }

    pub fn total_mode(&self) -> TotalMode {
        match self {
            MetricKind::Views
            | MetricKind::Likes
            | MetricKind::Comments
            | MetricKind::Shares
            | MetricKind::Posts
            | MetricKind::Followers => TotalMode::Sum,
            MetricKind::EngagementRate | MetricKind::LikeRate | MetricKind::CommentRate => {
                TotalMode::ViewWeighted
            }
            MetricKind::ContributionShare => TotalMode::FixedHundred,
            MetricKind::ConsistencyScore | MetricKind::ViralityScore | MetricKind::GrowthRate => {
                TotalMode::Mean
            }
        }
    }

    /// Column header used in tables and CSV export.
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Views => "Views",
            MetricKind::Likes => "Likes",
            MetricKind::Comments => "Comments",
            MetricKind::Shares => "Shares",
            MetricKind::Posts => "Posts",
            MetricKind::Followers => "Followers",
            MetricKind::EngagementRate => "Engagement Rate",
            MetricKind::LikeRate => "Like Rate",
            MetricKind::CommentRate => "Comment Rate",
            MetricKind::ContributionShare => "Contribution Share",
            MetricKind::ConsistencyScore => "Consistency Score",
            MetricKind::ViralityScore => "Virality Score",
            MetricKind::GrowthRate => "Growth Rate",
        }
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "views" => Ok(MetricKind::Views),
            "likes" => Ok(MetricKind::Likes),
            "comments" => Ok(MetricKind::Comments),
            "shares" => Ok(MetricKind::Shares),
            "posts" => Ok(MetricKind::Posts),
            "followers" => Ok(MetricKind::Followers),
            "engagement_rate" | "er" => Ok(MetricKind::EngagementRate),
            "like_rate" => Ok(MetricKind::LikeRate),
            "comment_rate" => Ok(MetricKind::CommentRate),
            "contribution_share" => Ok(MetricKind::ContributionShare),
            "consistency_score" | "consistency" => Ok(MetricKind::ConsistencyScore),
            "virality_score" | "virality" => Ok(MetricKind::ViralityScore),
            "growth_rate" | "growth" => Ok(MetricKind::GrowthRate),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// Sort direction for the ranked result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Descending,
    Ascending,
}

/// Derived metrics for one entity, all computed from raw counters.
///
/// Never stored as source of truth — recomputed on every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub engagement_rate: MetricValue,
    pub like_rate: MetricValue,
    pub comment_rate: MetricValue,
    pub contribution_share: MetricValue,
    pub consistency_score: MetricValue,
    pub virality_score: MetricValue,
    pub growth_rate: MetricValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(MetricValue::ratio(5.0, 0.0), MetricValue::Undefined);
        assert_eq!(MetricValue::ratio(5.0, 2.0), MetricValue::Defined(2.5));
    }

    #[test]
    fn from_f64_rejects_non_finite() {
        assert_eq!(MetricValue::from_f64(f64::NAN), MetricValue::Undefined);
        assert_eq!(MetricValue::from_f64(f64::INFINITY), MetricValue::Undefined);
        assert_eq!(MetricValue::from_f64(1.5), MetricValue::Defined(1.5));
    }

    #[test]
    fn rounding_keeps_sentinel() {
        assert_eq!(MetricValue::Undefined.rounded(2), MetricValue::Undefined);
        assert_eq!(
            MetricValue::Defined(10.256).rounded(1),
            MetricValue::Defined(10.3)
        );
    }

    #[test]
    fn undefined_serializes_as_null() {
        let json = serde_json::to_string(&MetricValue::Undefined).unwrap();
        assert_eq!(json, "null");
        let json = serde_json::to_string(&MetricValue::Defined(4.2)).unwrap();
        assert_eq!(json, "4.2");
    }

    #[test]
    fn rate_classification_matches_total_mode() {
        for kind in MetricKind::ALL {
            if kind.total_mode() == TotalMode::Sum {
                assert!(!kind.is_rate(), "{kind:?} sums, so it must be a count");
            } else {
                assert!(kind.is_rate(), "{kind:?} does not sum, so it must be a rate");
            }
        }
    }

    #[test]
    fn metric_kind_parses_aliases() {
        assert_eq!("er".parse::<MetricKind>().unwrap(), MetricKind::EngagementRate);
        assert_eq!("growth".parse::<MetricKind>().unwrap(), MetricKind::GrowthRate);
        assert_eq!(
            "engagement-rate".parse::<MetricKind>().unwrap(),
            MetricKind::EngagementRate
        );
    }
}
