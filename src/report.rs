//! Age distribution reporting over persisted records.
//!
//! [`AggregationReporter::report`] issues one aggregate query and converts the
//! bucket counts into whole percentages. Rendering lives in [`render_report`]
//! so the caller decides where the table goes.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreError,
    store::{AgeCounts, RecordStore},
    table::{self, Align},
};

pub const AGE_GROUP_HEADER: &str = "Age Group";
pub const DISTRIBUTION_HEADER: &str = "% Distribution";

/// How bucket boundaries are drawn.
///
/// `HalfOpen` buckets never overlap: `[..20)`, `[20, 40)`, `[40, 60)`,
/// `[60, ..)`. `Inclusive` keeps the legacy predicates, which count ages 40
/// and 60 in two buckets each and leave 60 out of the last one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum BucketMode {
    #[default]
    HalfOpen,
    Inclusive,
}

impl BucketMode {
    pub fn predicates(self) -> [&'static str; 4] {
        match self {
            BucketMode::HalfOpen => [
                "age < 20",
                "age >= 20 AND age < 40",
                "age >= 40 AND age < 60",
                "age >= 60",
            ],
            BucketMode::Inclusive => [
                "age < 20",
                "age BETWEEN 20 AND 40",
                "age BETWEEN 40 AND 60",
                "age > 60",
            ],
        }
    }

    pub fn labels(self) -> [&'static str; 4] {
        match self {
            BucketMode::HalfOpen => ["< 20", "20 to 39", "40 to 59", "60 and over"],
            BucketMode::Inclusive => ["< 20", "20 to 40", "40 to 60", "> 60"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketShare {
    pub label: &'static str,
    pub count: u64,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionReport {
    pub mode: BucketMode,
    pub total: u64,
    pub buckets: [BucketShare; 4],
}

impl DistributionReport {
    /// `None` when there are no rows to report on.
    pub fn from_counts(counts: AgeCounts, mode: BucketMode) -> Option<Self> {
        if counts.total == 0 {
            return None;
        }
        let labels = mode.labels();
        let buckets = std::array::from_fn(|idx| BucketShare {
            label: labels[idx],
            count: counts.buckets[idx],
            percent: percent_of(counts.buckets[idx], counts.total),
        });
        Some(Self {
            mode,
            total: counts.total,
            buckets,
        })
    }

    pub fn percent_sum(&self) -> u32 {
        self.buckets.iter().map(|b| u32::from(b.percent)).sum()
    }
}

/// `round(part / total * 100)` with halves rounded up. `total` must be > 0.
pub fn percent_of(part: u64, total: u64) -> u8 {
    let part = u128::from(part.min(total));
    let total = u128::from(total);
    let rounded = (part * 200 + total) / (total * 2);
    // part <= total keeps this within 0..=100
    rounded as u8
}

pub struct AggregationReporter<'a, S: ?Sized> {
    store: &'a S,
    mode: BucketMode,
}

impl<'a, S: RecordStore + ?Sized> AggregationReporter<'a, S> {
    pub fn new(store: &'a S, mode: BucketMode) -> Self {
        Self { store, mode }
    }

    pub fn report(&self) -> Result<Option<DistributionReport>, StoreError> {
        let counts = self.store.age_counts(self.mode)?;
        Ok(DistributionReport::from_counts(counts, self.mode))
    }
}

pub fn render_report(report: &DistributionReport) -> String {
    let headers = vec![AGE_GROUP_HEADER.to_string(), DISTRIBUTION_HEADER.to_string()];
    let rows = report
        .buckets
        .iter()
        .map(|bucket| vec![bucket.label.to_string(), bucket.percent.to_string()])
        .collect::<Vec<_>>();
    table::render_table(&headers, &rows, &[Align::Left, Align::Right])
}
