//! Per-visualization adapters over one dashboard snapshot.
//!
//! Every adapter is a thin read of data the pipeline computed exactly once
//! per fetch. Nothing here re-sorts, re-filters, or re-randomizes: two
//! panels reading the same snapshot always agree on the same numbers, and
//! the heatmap's peak cell stays put until the next refresh.

use chrono::{DateTime, Datelike, Timelike, Utc};
use pulseboard_core::aggregate::ResultSet;
use pulseboard_core::domain::{ActivitySample, Entity, EntityId, Platform};
use pulseboard_core::export::format_metric;
use pulseboard_core::timerange::{Granularity, ResolvedRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ─── Ranking table ──────────────────────────────────────────────────

/// One display row of the ranking table, already formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub rank: usize,
    pub name: String,
    pub platform: Platform,
    pub owned: bool,
    pub value: String,
    pub percent_of_total: String,
}

/// A page of the ranked result set plus the Total footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingTable {
    pub metric_label: &'static str,
    pub rows: Vec<RankingRow>,
    pub total: String,
    pub page_index: usize,
    pub page_count: usize,
}

impl RankingTable {
    /// Slice one page off an already-sorted result set. Never re-sorts.
    pub fn from_result_set(result_set: &ResultSet, page_index: usize, page_size: usize) -> Self {
        let rows = result_set
            .page(page_index, page_size)
            .iter()
            .map(|r| RankingRow {
                rank: r.rank,
                name: r.name.clone(),
                platform: r.platform,
                owned: r.owned,
                value: format_metric(r.value, result_set.metric),
                percent_of_total: match r.percent_of_total.as_f64() {
                    Some(p) => pulseboard_core::export::format_percent(p),
                    None => String::new(),
                },
            })
            .collect();
        Self {
            metric_label: result_set.metric.label(),
            rows,
            total: format_metric(result_set.total.value, result_set.metric),
            page_index,
            page_count: result_set.page_count(page_size),
        }
    }
}

// ─── Time-bucketed series ───────────────────────────────────────────

/// Aggregated activity for one time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub bucket_start: DateTime<Utc>,
    pub views: u64,
    pub interactions: u64,
}

/// Views/interactions per bucket across the resolved range.
///
/// Hourly buckets for short ranges, daily otherwise — the granularity comes
/// from the resolved range, never guessed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketedSeries {
    pub granularity: Granularity,
    pub points: Vec<SeriesPoint>,
}

impl BucketedSeries {
    /// Fold samples from the filtered entities into range buckets.
    ///
    /// Samples from entities outside the filtered set, or outside the
    /// interval, are dropped.
    pub fn build(
        range: &ResolvedRange,
        filtered: &[Entity],
        samples: &[ActivitySample],
    ) -> Self {
        let scope: BTreeSet<&EntityId> = filtered.iter().map(|e| &e.id).collect();
        let edges = range.bucket_edges();
        let mut points: Vec<SeriesPoint> = edges
            .iter()
            .map(|&bucket_start| SeriesPoint {
                bucket_start,
                views: 0,
                interactions: 0,
            })
            .collect();

        for sample in samples {
            if !scope.contains(&sample.entity_id) || !range.contains(sample.recorded_at) {
                continue;
            }
            if let Some(idx) = edges.iter().rposition(|e| *e <= sample.recorded_at) {
                points[idx].views += sample.views;
                points[idx].interactions += sample.interactions;
            }
        }

        Self {
            granularity: range.granularity,
            points,
        }
    }

    pub fn total_views(&self) -> u64 {
        self.points.iter().map(|p| p.views).sum()
    }
}

// ─── Day × hour heatmap ─────────────────────────────────────────────

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;

/// Activity grid: day-of-week (Monday = 0) × hour-of-day in the display
/// timezone. The peak cell is computed once at build time and stays stable
/// until the next fetch replaces the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub cells: Vec<Vec<u64>>,
    /// `(day, hour)` of the hottest cell; ties break toward the earliest
    /// day then hour. `None` when the grid is all zeros.
    pub peak: Option<(usize, usize)>,
}

impl Heatmap {
    pub fn build(range: &ResolvedRange, filtered: &[Entity], samples: &[ActivitySample]) -> Self {
        let scope: BTreeSet<&EntityId> = filtered.iter().map(|e| &e.id).collect();
        let mut cells = vec![vec![0u64; HOURS_PER_DAY]; DAYS_PER_WEEK];

        for sample in samples {
            if !scope.contains(&sample.entity_id) || !range.contains(sample.recorded_at) {
                continue;
            }
            let local = sample.recorded_at.with_timezone(&range.timezone);
            let day = local.weekday().num_days_from_monday() as usize;
            let hour = local.hour() as usize;
            cells[day][hour] += sample.views;
        }

        let peak = Self::find_peak(&cells);
        Self { cells, peak }
    }

    fn find_peak(cells: &[Vec<u64>]) -> Option<(usize, usize)> {
        let mut best: Option<(u64, usize, usize)> = None;
        for (day, row) in cells.iter().enumerate() {
            for (hour, &v) in row.iter().enumerate() {
                if v == 0 {
                    continue;
                }
                match best {
                    Some((bv, _, _)) if bv >= v => {}
                    _ => best = Some((v, day, hour)),
                }
            }
        }
        best.map(|(_, day, hour)| (day, hour))
    }

    /// Views for one grid cell, or `None` when `day` or `hour` falls
    /// outside the 7 x 24 grid.
    pub fn cell(&self, day: usize, hour: usize) -> Option<u64> {
        self.cells.get(day).and_then(|row| row.get(hour)).copied()
    }
}
