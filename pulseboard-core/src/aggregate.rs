//! Aggregation — filtered entities into a ranked, totalled result set.
//!
//! The sort is stable and fully deterministic: primary key is the chosen
//! metric's value (descending unless flipped), secondary key is the entity
//! id ascending, so no two entities can ever tie-rank ambiguously. Rows with
//! an undefined metric value sort after all defined rows regardless of
//! direction. The synthetic Total row is appended last, outside the rank
//! sequence and outside its own percent-of-total denominator.
//!
//! `AggregationPass` is the cooperative form of the same computation: it
//! consumes the entity set in fixed-size chunks so a single-threaded caller
//! can interleave other work between `step()` calls. Output is identical to
//! the one-shot `aggregate` (which is implemented on top of it).

use crate::domain::{
    DerivedMetrics, Entity, EntityId, MetricKind, MetricValue, Platform, SortDirection, TotalMode,
};
use crate::metrics::metric_value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One ranked row of the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub entity_id: EntityId,
    pub name: String,
    pub platform: Platform,
    pub owned: bool,
    /// 1-based, strictly increasing, no gaps.
    pub rank: usize,
    pub value: MetricValue,
    pub percent_of_total: MetricValue,
}

/// The synthetic Total row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalRow {
    pub value: MetricValue,
    pub entity_count: usize,
}

/// Ordered rows plus the Total, tagged with the metric and direction that
/// produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub metric: MetricKind,
    pub direction: SortDirection,
    pub rows: Vec<AggregateRow>,
    pub total: TotalRow,
}

impl ResultSet {
    /// The empty result: the "no data" state, distinct from an error.
    pub fn empty(metric: MetricKind, direction: SortDirection) -> Self {
        Self {
            metric,
            direction,
            rows: Vec::new(),
            total: TotalRow {
                value: MetricValue::Undefined,
                entity_count: 0,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Pure slice over the already-sorted rows. Changing page never
    /// re-sorts; out-of-range pages are empty.
    pub fn page(&self, page_index: usize, page_size: usize) -> &[AggregateRow] {
        if page_size == 0 {
            return &[];
        }
        let start = page_index.saturating_mul(page_size);
        if start >= self.rows.len() {
            return &[];
        }
        let end = (start + page_size).min(self.rows.len());
        &self.rows[start..end]
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            0
        } else {
            self.rows.len().div_ceil(page_size)
        }
    }

    /// Ids in rank order, for membership comparisons.
    pub fn id_set(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.rows.iter().map(|r| r.entity_id.clone()).collect();
        ids.sort();
        ids
    }
}

/// One-shot aggregation over a filtered entity set.
///
/// `entities` and `derived` are parallel arrays as produced by
/// `metrics::compute_all`.
pub fn aggregate(
    entities: &[Entity],
    derived: &[DerivedMetrics],
    metric: MetricKind,
    direction: SortDirection,
) -> ResultSet {
    AggregationPass::new(entities, derived, metric, direction, entities.len().max(1))
        .run_to_completion()
}

/// Per-entity scratch carried through the pass.
#[derive(Debug, Clone)]
struct Scratch {
    entity_index: usize,
    value: MetricValue,
}

/// Resumable chunked aggregation.
///
/// `step()` consumes one chunk of entities and returns `true` when every
/// entity has been consumed; `finish()` then sorts once and materializes the
/// result set. `run_to_completion()` is the convenience loop.
pub struct AggregationPass<'a> {
    entities: &'a [Entity],
    derived: &'a [DerivedMetrics],
    metric: MetricKind,
    direction: SortDirection,
    chunk_size: usize,
    cursor: usize,
    scratch: Vec<Scratch>,
    // Total accumulators, filled as chunks are consumed.
    sum: f64,
    weighted_numerator: f64,
    weight_denominator: f64,
    defined_sum: f64,
    defined_count: usize,
    any_views: bool,
}

impl<'a> AggregationPass<'a> {
    pub const DEFAULT_CHUNK: usize = 256;

    pub fn new(
        entities: &'a [Entity],
        derived: &'a [DerivedMetrics],
        metric: MetricKind,
        direction: SortDirection,
        chunk_size: usize,
    ) -> Self {
        debug_assert_eq!(entities.len(), derived.len());
        Self {
            entities,
            derived,
            metric,
            direction,
            chunk_size: chunk_size.max(1),
            cursor: 0,
            scratch: Vec::with_capacity(entities.len()),
            sum: 0.0,
            weighted_numerator: 0.0,
            weight_denominator: 0.0,
            defined_sum: 0.0,
            defined_count: 0,
            any_views: false,
        }
    }

    /// Consume the next chunk. Returns `true` once all entities are consumed.
    pub fn step(&mut self) -> bool {
        let end = (self.cursor + self.chunk_size).min(self.entities.len());
        for i in self.cursor..end {
            let entity = &self.entities[i];
            let value = metric_value(entity, &self.derived[i], self.metric);
            if let Some(v) = value.as_f64() {
                self.sum += v;
                self.defined_sum += v;
                self.defined_count += 1;
                let weight = entity.counters.views as f64;
                self.weighted_numerator += v * weight;
                self.weight_denominator += weight;
            }
            if entity.counters.views > 0 {
                self.any_views = true;
            }
            self.scratch.push(Scratch {
                entity_index: i,
                value,
            });
        }
        self.cursor = end;
        self.cursor >= self.entities.len()
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.entities.len()
    }

    /// Sort once, assign ranks, compute percent-of-total, append the Total.
    ///
    /// Consumes any unconsumed chunks first, so calling `finish()` early is
    /// equivalent to `run_to_completion()`.
    pub fn finish(mut self) -> ResultSet {
        while !self.step() {}

        if self.scratch.is_empty() {
            return ResultSet::empty(self.metric, self.direction);
        }

        let total_value = self.total_value();

        let direction = self.direction;
        let entities = self.entities;
        self.scratch.sort_by(|a, b| {
            compare_values(a.value, b.value, direction).then_with(|| {
                entities[a.entity_index]
                    .id
                    .cmp(&entities[b.entity_index].id)
            })
        });

        let rows: Vec<AggregateRow> = self
            .scratch
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let entity = &entities[s.entity_index];
                AggregateRow {
                    entity_id: entity.id.clone(),
                    name: entity.name.clone(),
                    platform: entity.platform,
                    owned: entity.owned,
                    rank: i + 1,
                    value: s.value,
                    percent_of_total: percent_of(s.value, total_value),
                }
            })
            .collect();

        ResultSet {
            metric: self.metric,
            direction: self.direction,
            total: TotalRow {
                value: total_value,
                entity_count: rows.len(),
            },
            rows,
        }
    }

    pub fn run_to_completion(self) -> ResultSet {
        self.finish()
    }

    fn total_value(&self) -> MetricValue {
        match self.metric.total_mode() {
            TotalMode::Sum => MetricValue::from_f64(self.sum),
            TotalMode::ViewWeighted => {
                MetricValue::ratio(self.weighted_numerator, self.weight_denominator)
            }
            TotalMode::Mean => {
                if self.defined_count == 0 {
                    MetricValue::Undefined
                } else {
                    MetricValue::from_f64(self.defined_sum / self.defined_count as f64)
                }
            }
            TotalMode::FixedHundred => {
                if self.any_views {
                    MetricValue::Defined(100.0)
                } else {
                    MetricValue::Undefined
                }
            }
        }
    }
}

/// Defined values order by the direction flag; undefined values sort after
/// every defined value regardless of direction.
fn compare_values(a: MetricValue, b: MetricValue, direction: SortDirection) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
        (Some(x), Some(y)) => match direction {
            SortDirection::Descending => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            SortDirection::Ascending => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        },
    }
}

fn percent_of(value: MetricValue, total: MetricValue) -> MetricValue {
    match (value.as_f64(), total.as_f64()) {
        (Some(v), Some(t)) if t != 0.0 => MetricValue::from_f64(v / t * 100.0),
        _ => MetricValue::Undefined,
    }
}
