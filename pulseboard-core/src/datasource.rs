//! Data source abstraction and the deterministic synthetic adapter.
//!
//! The telemetry backend is a black box behind `DataSource`: given a
//! FilterState and its resolved interval it returns raw counters plus
//! timestamped activity samples. `SyntheticSource` is the seeded adapter for
//! tests and demos — every number is derived from the master seed via blake3
//! sub-seeds, so two fetches of the same range produce byte-identical data
//! and no panel can ever disagree with another about the same entity.

use crate::domain::{ActivitySample, Entity, EntityId, FilterState, Platform, RawCounters};
use crate::timerange::ResolvedRange;
use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Structured errors from the upstream telemetry source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("telemetry source unavailable: {0}")]
    Unavailable(String),

    #[error("telemetry source timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },

    #[error("telemetry source rejected the request: {0}")]
    Rejected(String),
}

/// Everything one fetch returns: per-entity counters for the interval plus
/// the raw activity samples the series/heatmap builders fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchBatch {
    pub entities: Vec<Entity>,
    pub samples: Vec<ActivitySample>,
}

/// Trait for telemetry backends.
///
/// Implementations return data for the union of entities they know about;
/// scope filtering is the pipeline's job, not the source's.
pub trait DataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch raw counters and activity samples over the resolved interval.
    fn fetch(&self, filter: &FilterState, range: &ResolvedRange)
        -> Result<FetchBatch, FetchError>;
}

/// A catalog entry the synthetic source generates data for.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: EntityId,
    pub name: String,
    pub platform: Platform,
    pub owned: bool,
}

/// Deterministic seeded data source.
///
/// Sub-seeds are derived per `(master_seed, entity_id)` and per
/// `(master_seed, entity_id, hour)` with blake3, independently of iteration
/// order — the same master seed yields identical data no matter how the
/// catalog is traversed.
pub struct SyntheticSource {
    seed: u64,
    catalog: Vec<CatalogEntry>,
}

impl SyntheticSource {
    pub fn new(seed: u64, catalog: Vec<CatalogEntry>) -> Self {
        Self { seed, catalog }
    }

    /// Demo catalog: one owned account plus two tracked competitors per platform.
    pub fn demo(seed: u64) -> Self {
        let mut catalog = Vec::new();
        for platform in Platform::ALL {
            catalog.push(CatalogEntry {
                id: EntityId::new(format!("{platform}-own")),
                name: format!("Our {platform} account"),
                platform,
                owned: true,
            });
            for rival in 1..=2 {
                catalog.push(CatalogEntry {
                    id: EntityId::new(format!("{platform}-rival-{rival}")),
                    name: format!("Competitor {rival} ({platform})"),
                    platform,
                    owned: false,
                });
            }
        }
        Self::new(seed, catalog)
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    fn entity_rng(&self, id: &EntityId) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(id.as_str().as_bytes());
        StdRng::seed_from_u64(seed_from_hash(hasher))
    }

    fn sample_rng(&self, id: &EntityId, hour: DateTime<Utc>) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(id.as_str().as_bytes());
        hasher.update(&hour.timestamp().to_le_bytes());
        StdRng::seed_from_u64(seed_from_hash(hasher))
    }

    fn build_entity(&self, entry: &CatalogEntry, days: i64) -> Entity {
        let mut rng = self.entity_rng(&entry.id);
        let daily_views: u64 = rng.gen_range(2_000..80_000);
        let like_rate: f64 = rng.gen_range(0.02..0.08);
        let comment_rate: f64 = rng.gen_range(0.002..0.012);
        let share_rate: f64 = rng.gen_range(0.001..0.006);
        let followers: u64 = rng.gen_range(5_000..2_000_000);
        let growth: f64 = rng.gen_range(-0.05..0.15);

        let views = daily_views * days as u64;
        let daily_post_counts: Vec<u32> = (0..days).map(|_| rng.gen_range(0..=4)).collect();
        let posts_count = daily_post_counts.iter().map(|&c| c as u64).sum();
        let followers_start = ((followers as f64) / (1.0 + growth)).round().max(0.0) as u64;

        Entity {
            id: entry.id.clone(),
            name: entry.name.clone(),
            platform: entry.platform,
            owned: entry.owned,
            counters: RawCounters {
                views,
                likes: (views as f64 * like_rate) as u64,
                comments: (views as f64 * comment_rate) as u64,
                shares: (views as f64 * share_rate) as u64,
                posts_count,
                followers,
                followers_start,
                followers_end: followers,
                daily_post_counts,
            },
        }
    }

    fn build_samples(&self, entry: &CatalogEntry, range: &ResolvedRange) -> Vec<ActivitySample> {
        let mut rng = self.entity_rng(&entry.id);
        let daily_views: u64 = rng.gen_range(2_000..80_000);
        let hourly_base = (daily_views / 24).max(1);

        let mut samples = Vec::new();
        let mut hour = range
            .from
            .duration_trunc(Duration::hours(1))
            .unwrap_or(range.from);
        if hour < range.from {
            hour += Duration::hours(1);
        }
        while hour < range.to {
            let mut sample_rng = self.sample_rng(&entry.id, hour);
            // Diurnal curve: afternoons and evenings run hotter.
            let curve = match hour.hour() {
                0..=5 => 0.3,
                6..=11 => 0.9,
                12..=17 => 1.4,
                _ => 1.3,
            };
            let views = (hourly_base as f64 * curve * sample_rng.gen_range(0.5..1.5)) as u64;
            let interactions = (views as f64 * sample_rng.gen_range(0.02..0.09)) as u64;
            samples.push(ActivitySample {
                entity_id: entry.id.clone(),
                recorded_at: hour,
                views,
                interactions,
            });
            hour += Duration::hours(1);
        }
        samples
    }
}

fn seed_from_hash(hasher: blake3::Hasher) -> u64 {
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

impl DataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        _filter: &FilterState,
        range: &ResolvedRange,
    ) -> Result<FetchBatch, FetchError> {
        let days = (range.to - range.from).num_days().max(1);
        let entities = self
            .catalog
            .iter()
            .map(|entry| self.build_entity(entry, days))
            .collect();
        let samples = self
            .catalog
            .iter()
            .flat_map(|entry| self.build_samples(entry, range))
            .collect();
        Ok(FetchBatch { entities, samples })
    }
}
