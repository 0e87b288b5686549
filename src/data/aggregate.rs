//! Summary metrics and per-age-group default rates.

use std::fmt;

use serde::Serialize;

use super::filter::{self, FilterPredicates};
use super::model::{Dataset, Record};

/// Edges of the age partition. Intervals are right-closed: `(20, 30]`, ...
pub const AGE_BIN_EDGES: [u32; 7] = [20, 30, 40, 50, 60, 70, 80];

// ---------------------------------------------------------------------------
// Age buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AgeBucket {
    pub lower: u32,
    pub upper: u32,
}

impl AgeBucket {
    /// All buckets in ascending order.
    pub fn all() -> impl Iterator<Item = AgeBucket> {
        AGE_BIN_EDGES.windows(2).map(|w| AgeBucket {
            lower: w[0],
            upper: w[1],
        })
    }

    /// The bucket containing `age`, if any. Age 20 and anything above 80 fall
    /// outside the partition.
    pub fn for_age(age: u32) -> Option<AgeBucket> {
        Self::all().find(|b| b.contains(age))
    }

    pub fn contains(&self, age: u32) -> bool {
        self.lower < age && age <= self.upper
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.lower, self.upper)
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Record count and mean outcome. `default_rate` is `None` when there are no
/// records: the rate is undefined, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub default_rate: Option<f64>,
}

impl Summary {
    /// Rate as a percentage with two decimals, or "No data".
    pub fn rate_label(&self) -> String {
        format_rate(self.default_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRate {
    pub bucket: AgeBucket,
    pub label: String,
    pub count: usize,
    pub default_rate: f64,
}

/// Everything the summary view renders for one predicate set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub summary: Summary,
    pub by_age: Vec<BucketRate>,
}

impl SummaryView {
    /// Summary and buckets of an already filtered dataset.
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            summary: summarize(dataset),
            by_age: by_age_bucket(dataset),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.count == 0
    }
}

/// Mean of the outcome label, `None` over zero records.
pub fn default_rate<'a>(records: impl IntoIterator<Item = &'a Record>) -> Option<f64> {
    let (n, k) = records
        .into_iter()
        .fold((0usize, 0usize), |(n, k), r| (n + 1, k + usize::from(r.defaulted)));
    (n > 0).then(|| k as f64 / n as f64)
}

pub fn summarize(dataset: &Dataset) -> Summary {
    Summary {
        count: dataset.len(),
        default_rate: default_rate(dataset),
    }
}

/// Mean rate per non-empty bucket, ascending by bucket regardless of record
/// order. Records outside the partition are skipped.
pub fn by_age_bucket(dataset: &Dataset) -> Vec<BucketRate> {
    let mut counts: Vec<(usize, usize)> = vec![(0, 0); AGE_BIN_EDGES.len() - 1];
    let mut outside = 0usize;
    for r in dataset {
        match AGE_BIN_EDGES[1..].iter().position(|&upper| r.age <= upper) {
            Some(i) if r.age > AGE_BIN_EDGES[0] => {
                counts[i].0 += 1;
                counts[i].1 += usize::from(r.defaulted);
            }
            _ => outside += 1,
        }
    }
    if outside > 0 {
        log::warn!("{outside} record(s) outside the age partition");
    }

    AgeBucket::all()
        .zip(counts)
        .filter(|(_, (n, _))| *n > 0)
        .map(|(bucket, (n, k))| BucketRate {
            bucket,
            label: bucket.label(),
            count: n,
            default_rate: k as f64 / n as f64,
        })
        .collect()
}

/// Filter, summarize and bucket in one call.
pub fn summary_view(dataset: &Dataset, predicates: &FilterPredicates) -> SummaryView {
    SummaryView::of(&filter::apply(dataset, predicates))
}

/// `Some(0.6667)` → `"66.67 %"`, `None` → `"No data"`.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.2} %", r * 100.0),
        None => "No data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::Bounds;
    use crate::data::model::fixtures::{record, three_ages};
    use approx::assert_relative_eq;

    #[test]
    fn test_bucket_labels_and_edges() {
        let labels: Vec<String> = AgeBucket::all().map(|b| b.label()).collect();
        assert_eq!(
            labels,
            ["(20, 30]", "(30, 40]", "(40, 50]", "(50, 60]", "(60, 70]", "(70, 80]"]
        );
        assert_eq!(AgeBucket::for_age(20), None);
        assert_eq!(AgeBucket::for_age(21).unwrap().label(), "(20, 30]");
        assert_eq!(AgeBucket::for_age(30).unwrap().label(), "(20, 30]");
        assert_eq!(AgeBucket::for_age(80).unwrap().label(), "(70, 80]");
        assert_eq!(AgeBucket::for_age(81), None);
    }

    #[test]
    fn test_scenario_unfiltered() {
        let ds = three_ages();
        let summary = summarize(&ds);
        assert_eq!(summary.count, 3);
        assert_relative_eq!(summary.default_rate.unwrap(), 2.0 / 3.0);
        assert_eq!(summary.rate_label(), "66.67 %");

        let buckets = by_age_bucket(&ds);
        let got: Vec<(&str, f64)> = buckets
            .iter()
            .map(|b| (b.label.as_str(), b.default_rate))
            .collect();
        assert_eq!(got, [("(20, 30]", 1.0), ("(30, 40]", 0.0), ("(40, 50]", 1.0)]);
    }

    #[test]
    fn test_scenario_age_filtered() {
        let ds = three_ages();
        let mut p = FilterPredicates::unconstrained(&ds);
        p.age = Bounds::new(30, 50).unwrap();
        let view = summary_view(&ds, &p);
        assert_eq!(view.summary.count, 2);
        assert_eq!(view.summary.default_rate, Some(0.5));
        let labels: Vec<&str> = view.by_age.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["(30, 40]", "(40, 50]"]);
        assert_eq!(view.by_age[0].default_rate, 0.0);
        assert_eq!(view.by_age[1].default_rate, 1.0);
        assert_eq!(view, SummaryView::of(&filter::apply(&ds, &p)));
    }

    #[test]
    fn test_empty_reports_no_data() {
        let ds = Dataset::default();
        let summary = summarize(&ds);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.default_rate, None);
        assert_eq!(summary.rate_label(), "No data");
        assert!(by_age_bucket(&ds).is_empty());
    }

    #[test]
    fn test_bucket_order_independent_of_record_order() {
        let ds = Dataset::new(vec![
            record(75, 1.0, true),
            record(22, 1.0, false),
            record(55, 1.0, true),
            record(19, 1.0, true),
            record(95, 1.0, true),
        ]);
        let buckets = by_age_bucket(&ds);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["(20, 30]", "(50, 60]", "(70, 80]"]);
        // Out-of-partition ages still count towards the overall summary.
        assert_eq!(summarize(&ds).count, 5);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_rate_is_exact_fraction() {
        let ds = Dataset::new((0..8).map(|i| record(33, 1.0, i < 3)).collect());
        assert_eq!(summarize(&ds).default_rate, Some(3.0 / 8.0));
    }
}
