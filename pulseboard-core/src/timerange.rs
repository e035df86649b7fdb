//! Time-range resolution — preset/custom selections into absolute UTC intervals.
//!
//! Presets anchor at "now" in the display timezone; custom ranges are
//! explicit UTC instants. The resolved interval is half-open `[from, to)`.
//! Spans of 24 hours or less resolve to hourly buckets, longer spans to
//! daily buckets — the granularity is part of the resolved range so
//! time-series consumers never guess it themselves.

use chrono::{DateTime, Duration, DurationRound, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed-duration range presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePreset {
    Last24h,
    Last7d,
    Last30d,
    Last90d,
}

impl RangePreset {
    pub fn duration(&self) -> Duration {
        match self {
            RangePreset::Last24h => Duration::hours(24),
            RangePreset::Last7d => Duration::days(7),
            RangePreset::Last30d => Duration::days(30),
            RangePreset::Last90d => Duration::days(90),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RangePreset::Last24h => "Last 24 hours",
            RangePreset::Last7d => "Last 7 days",
            RangePreset::Last30d => "Last 30 days",
            RangePreset::Last90d => "Last 90 days",
        }
    }
}

impl std::str::FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "24h" => Ok(RangePreset::Last24h),
            "7d" => Ok(RangePreset::Last7d),
            "30d" => Ok(RangePreset::Last30d),
            "90d" => Ok(RangePreset::Last90d),
            other => Err(format!("unknown range preset: {other}")),
        }
    }
}

/// What the user picked: a preset token or an explicit custom interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeRangeSelection {
    Preset { preset: RangePreset },
    Custom {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl TimeRangeSelection {
    pub fn preset(preset: RangePreset) -> Self {
        TimeRangeSelection::Preset { preset }
    }

    pub fn custom(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        TimeRangeSelection::Custom { from, to }
    }
}

/// Structured errors for time-range resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid custom range: from {from} is after to {to}")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

/// Bucket size for time-series consumers of a resolved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hourly,
    Daily,
}

/// A concrete half-open interval `[from, to)` in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub label: String,
    pub granularity: Granularity,
    pub timezone: Tz,
}

impl ResolvedRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant < self.to
    }

    /// Bucket start instants covering the interval, first bucket aligned to
    /// the top of the hour (hourly) or local midnight in the display
    /// timezone (daily).
    pub fn bucket_edges(&self) -> Vec<DateTime<Utc>> {
        // An empty half-open interval contains no instants, so it gets no
        // buckets; alignment alone would otherwise admit one below `from`.
        if self.from >= self.to {
            return Vec::new();
        }
        let (first, step) = match self.granularity {
            Granularity::Hourly => (
                self.from
                    .duration_trunc(Duration::hours(1))
                    .unwrap_or(self.from),
                Duration::hours(1),
            ),
            Granularity::Daily => {
                let local_date = self.from.with_timezone(&self.timezone).date_naive();
                let midnight = self
                    .timezone
                    .from_local_datetime(&local_date.and_time(NaiveTime::MIN))
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or(self.from);
                (midnight, Duration::days(1))
            }
        };
        let mut edges = Vec::new();
        let mut cursor = first;
        while cursor < self.to {
            edges.push(cursor);
            cursor += step;
        }
        edges
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_edges().len()
    }

    /// Index of the bucket an instant falls into, or `None` outside `[from, to)`.
    pub fn bucket_index(&self, instant: DateTime<Utc>) -> Option<usize> {
        if !self.contains(instant) {
            return None;
        }
        let edges = self.bucket_edges();
        edges.iter().rposition(|edge| *edge <= instant)
    }
}

/// Resolve a selection into an absolute interval.
///
/// Presets anchor at `now`: `[now - duration, now)`. Custom ranges pass
/// through after validation; `from > to` is rejected before any fetch can
/// happen, equal endpoints are an allowed empty interval.
pub fn resolve(
    selection: TimeRangeSelection,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<ResolvedRange, RangeError> {
    match selection {
        TimeRangeSelection::Preset { preset } => {
            let to = now;
            let from = now - preset.duration();
            Ok(ResolvedRange {
                from,
                to,
                label: preset.label().to_string(),
                granularity: granularity_for(to - from),
                timezone: tz,
            })
        }
        TimeRangeSelection::Custom { from, to } => {
            if from > to {
                return Err(RangeError::InvalidRange { from, to });
            }
            Ok(ResolvedRange {
                label: custom_label(from, to, tz),
                granularity: granularity_for(to - from),
                from,
                to,
                timezone: tz,
            })
        }
    }
}

fn granularity_for(span: Duration) -> Granularity {
    if span <= Duration::hours(24) {
        Granularity::Hourly
    } else {
        Granularity::Daily
    }
}

fn custom_label(from: DateTime<Utc>, to: DateTime<Utc>, tz: Tz) -> String {
    let from_local = from.with_timezone(&tz);
    let to_local = to.with_timezone(&tz);
    let midnight_aligned =
        from_local.time() == NaiveTime::MIN && to_local.time() == NaiveTime::MIN;
    if midnight_aligned {
        format!(
            "{} – {}",
            from_local.format("%b %d, %Y"),
            to_local.format("%b %d, %Y")
        )
    } else {
        format!(
            "{} – {}",
            from_local.format("%b %d, %Y %H:%M"),
            to_local.format("%b %d, %Y %H:%M")
        )
    }
}

/// A custom range the user applied, kept for quick re-selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub label: String,
}

/// Bounded most-recent-first list of applied custom ranges.
///
/// Deduplicated by identical `[from, to)`: re-applying a known range moves
/// it to the front instead of inserting a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentRanges {
    entries: Vec<RecentRange>,
    cap: usize,
}

impl RecentRanges {
    pub const DEFAULT_CAP: usize = 8;

    pub fn new(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cap,
        }
    }

    /// Record a successfully applied custom range.
    pub fn record(&mut self, range: &ResolvedRange) {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|e| e.from == range.from && e.to == range.to)
        {
            let existing = self.entries.remove(idx);
            self.entries.insert(0, existing);
            return;
        }
        self.entries.insert(
            0,
            RecentRange {
                from: range.from,
                to: range.to,
                label: range.label.clone(),
            },
        );
        self.entries.truncate(self.cap);
    }

    pub fn entries(&self) -> &[RecentRange] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RecentRanges {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap()
    }

    fn tz() -> Tz {
        "America/New_York".parse().unwrap()
    }

    #[test]
    fn preset_anchors_at_now() {
        let r = resolve(
            TimeRangeSelection::preset(RangePreset::Last7d),
            tz(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(r.to, fixed_now());
        assert_eq!(r.to - r.from, Duration::days(7));
        assert_eq!(r.label, "Last 7 days");
        assert_eq!(r.granularity, Granularity::Daily);
    }

    #[test]
    fn short_preset_is_hourly() {
        let r = resolve(
            TimeRangeSelection::preset(RangePreset::Last24h),
            tz(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(r.granularity, Granularity::Hourly);
        // 24h span truncated to hour boundaries -> 25 partial-or-full buckets
        // when `now` is not on the hour, 24 when it is.
        assert_eq!(r.bucket_count(), 25);
    }

    #[test]
    fn custom_from_after_to_is_rejected() {
        let from = fixed_now();
        let to = from - Duration::hours(1);
        let err = resolve(TimeRangeSelection::custom(from, to), tz(), fixed_now()).unwrap_err();
        assert_eq!(err, RangeError::InvalidRange { from, to });
    }

    #[test]
    fn custom_equal_endpoints_is_empty_interval() {
        let at = fixed_now();
        let r = resolve(TimeRangeSelection::custom(at, at), tz(), fixed_now()).unwrap();
        assert_eq!(r.from, r.to);
        assert_eq!(r.bucket_count(), 0);
        assert!(!r.contains(at));
    }

    #[test]
    fn interval_is_half_open() {
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
        let r = resolve(TimeRangeSelection::custom(from, to), tz(), fixed_now()).unwrap();
        assert!(r.contains(from));
        assert!(!r.contains(to));
    }

    #[test]
    fn daily_buckets_align_to_local_midnight() {
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let r = resolve(TimeRangeSelection::custom(from, to), tz(), fixed_now()).unwrap();
        assert_eq!(r.granularity, Granularity::Daily);
        let edges = r.bucket_edges();
        let first_local = edges[0].with_timezone(&tz());
        assert_eq!(first_local.time(), NaiveTime::MIN);
    }

    #[test]
    fn bucket_index_matches_edges() {
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        let r = resolve(TimeRangeSelection::custom(from, to), tz(), fixed_now()).unwrap();
        let inside = Utc.with_ymd_and_hms(2026, 3, 1, 2, 30, 0).unwrap();
        assert_eq!(r.bucket_index(inside), Some(2));
        assert_eq!(r.bucket_index(to), None);
    }

    #[test]
    fn recent_ranges_dedup_and_cap() {
        let mut recent = RecentRanges::new(3);
        let mk = |day: u32| {
            resolve(
                TimeRangeSelection::custom(
                    Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap(),
                    Utc.with_ymd_and_hms(2026, 3, day + 1, 0, 0, 0).unwrap(),
                ),
                tz(),
                fixed_now(),
            )
            .unwrap()
        };
        recent.record(&mk(1));
        recent.record(&mk(2));
        recent.record(&mk(3));
        recent.record(&mk(4)); // evicts day 1
        assert_eq!(recent.len(), 3);
        // Re-applying day 2 moves it to the front, no duplicate.
        recent.record(&mk(2));
        assert_eq!(recent.len(), 3);
        assert_eq!(recent.entries()[0].from, mk(2).from);
    }

    #[test]
    fn selection_serialization_roundtrip() {
        let sel = TimeRangeSelection::custom(
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap(),
        );
        let json = serde_json::to_string(&sel).unwrap();
        let deser: TimeRangeSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(sel, deser);
    }
}
