use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the raw source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from the source, before it is bound to a
/// typed [`Record`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Guess the type of a textual cell (CSV has no native types).
    pub fn guess(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    /// Interpret the cell as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Bool(_) | CellValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Interpret the cell as an integer code. Floats are accepted only when
    /// they carry no fractional part (spreadsheets store every number as f64).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            CellValue::String(s) => CellValue::guess(s).as_i64(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – header row plus untyped cells
// ---------------------------------------------------------------------------

/// The parsed source table: one header row and equally wide data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

// ---------------------------------------------------------------------------
// Record – one customer
// ---------------------------------------------------------------------------

/// Number of monthly observations in the repayment history.
pub const MONTHS: usize = 6;

/// Month labels in the order of the per-month arrays on [`Record`].
pub const MONTH_LABELS: [&str; MONTHS] = ["Sep", "Aug", "Jul", "Jun", "May", "Apr"];

/// One customer row with every field typed. Categorical columns keep their
/// raw source codes; the codebook in `scoring::features` interprets them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub credit_limit: f64,
    pub age: u32,
    pub education: i64,
    pub sex: i64,
    pub marriage: i64,
    /// Repayment status, most recent month first.
    pub pay_status: [i64; MONTHS],
    pub bill_amount: [f64; MONTHS],
    pub pay_amount: [f64; MONTHS],
    /// Outcome label: defaulted on the following month's payment.
    pub defaulted: bool,
}

// ---------------------------------------------------------------------------
// Dataset – the loaded, read-only table
// ---------------------------------------------------------------------------

/// An ordered collection of records. Never mutated after loading; filtering
/// produces a new `Dataset`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
}

/// Value ranges and category codes present in a dataset, used to seed the
/// unconstrained predicate set and the filter widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetExtents {
    pub credit_limit: (f64, f64),
    pub age: (u32, u32),
    pub education_codes: BTreeSet<i64>,
    pub sex_codes: BTreeSet<i64>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Dataset { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Min/max of the range-filtered columns and the sorted category codes.
    /// `None` for an empty dataset.
    pub fn extents(&self) -> Option<DatasetExtents> {
        let first = self.records.first()?;
        let mut extents = DatasetExtents {
            credit_limit: (first.credit_limit, first.credit_limit),
            age: (first.age, first.age),
            education_codes: BTreeSet::new(),
            sex_codes: BTreeSet::new(),
        };
        for r in &self.records {
            extents.credit_limit.0 = extents.credit_limit.0.min(r.credit_limit);
            extents.credit_limit.1 = extents.credit_limit.1.max(r.credit_limit);
            extents.age.0 = extents.age.0.min(r.age);
            extents.age.1 = extents.age.1.max(r.age);
            extents.education_codes.insert(r.education);
            extents.sex_codes.insert(r.sex);
        }
        Some(extents)
    }

    /// Like [`Dataset::extents`] but treats an empty dataset as an error.
    pub fn require_extents(&self) -> Result<DatasetExtents> {
        self.extents()
            .ok_or_else(|| Error::EmptyResultSet("dataset has no records".to_string()))
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
