use super::model::{Dataset, Record};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Predicate building blocks
// ---------------------------------------------------------------------------

/// Inclusive range `[lower, upper]`; construction rejects `lower > upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    lower: T,
    upper: T,
}

impl<T: PartialOrd + Copy + Into<f64>> Bounds<T> {
    pub fn new(lower: T, upper: T) -> Result<Self> {
        if lower > upper {
            return Err(Error::InvalidBounds {
                lower: lower.into(),
                upper: upper.into(),
            });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> T {
        self.lower
    }

    pub fn upper(&self) -> T {
        self.upper
    }

    pub fn contains(&self, value: T) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Equality constraint on a categorical code. `Any` is the "no constraint"
/// sentinel and accepts every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    Any,
    Only(i64),
}

impl CategoryFilter {
    pub fn accepts(&self, code: i64) -> bool {
        match self {
            CategoryFilter::Any => true,
            CategoryFilter::Only(wanted) => *wanted == code,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate set
// ---------------------------------------------------------------------------

/// Conjunction of the sidebar constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterPredicates {
    pub credit_limit: Bounds<f64>,
    pub age: Bounds<u32>,
    pub education: CategoryFilter,
    pub sex: CategoryFilter,
}

impl FilterPredicates {
    /// Full min/max ranges and no category constraint: `apply` with this set
    /// returns the dataset unchanged.
    pub fn unconstrained(dataset: &Dataset) -> Self {
        match dataset.extents() {
            Some(ext) => Self {
                credit_limit: Bounds {
                    lower: ext.credit_limit.0,
                    upper: ext.credit_limit.1,
                },
                age: Bounds {
                    lower: ext.age.0,
                    upper: ext.age.1,
                },
                education: CategoryFilter::Any,
                sex: CategoryFilter::Any,
            },
            None => Self::everything(),
        }
    }

    /// Accepts any record regardless of dataset.
    pub fn everything() -> Self {
        Self {
            credit_limit: Bounds {
                lower: f64::NEG_INFINITY,
                upper: f64::INFINITY,
            },
            age: Bounds {
                lower: u32::MIN,
                upper: u32::MAX,
            },
            education: CategoryFilter::Any,
            sex: CategoryFilter::Any,
        }
    }

    /// A record passes when every active predicate accepts it.
    pub fn matches(&self, record: &Record) -> bool {
        self.credit_limit.contains(record.credit_limit)
            && self.age.contains(record.age)
            && self.education.accepts(record.education)
            && self.sex.accepts(record.sex)
    }
}

/// Return a new dataset with the records passing all predicates, in their
/// original order. An empty result is valid.
pub fn apply(dataset: &Dataset, predicates: &FilterPredicates) -> Dataset {
    dataset
        .iter()
        .filter(|r| predicates.matches(r))
        .copied()
        .collect()
}
