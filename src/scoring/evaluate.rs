//! Hold-out evaluation of a fitted model.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Probability above which a customer is predicted to default.
pub const DECISION_THRESHOLD: f64 = 0.5;

// ---------------------------------------------------------------------------
// Confusion matrix
// ---------------------------------------------------------------------------

/// Binary confusion counts with "defaulted" as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ConfusionMatrix {
    pub fn from_predictions(actual: &[bool], predicted: &[bool]) -> Self {
        let mut cm = ConfusionMatrix::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (false, false) => cm.true_negatives += 1,
                (false, true) => cm.false_positives += 1,
                (true, false) => cm.false_negatives += 1,
                (true, true) => cm.true_positives += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    /// Rows are the actual class, columns the predicted class (0 then 1).
    pub fn rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negatives + self.true_positives, self.total())
    }

    /// Zero when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Sensitivity. Zero when there are no actual positives.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        ratio(
            2 * self.true_positives,
            2 * self.true_positives + self.false_positives + self.false_negatives,
        )
    }
}

/// Coefficient of determination. A constant target scores 1.0 when matched
/// exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

// ---------------------------------------------------------------------------
// Calibration curve
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub mean_predicted: f64,
    pub fraction_positive: f64,
    pub count: usize,
}

/// Uniform-width bins over [0, 1]; a probability on an inner edge belongs to
/// the lower bin. Empty bins are dropped.
pub fn calibration_curve(actual: &[bool], probabilities: &[f64], n_bins: usize) -> Vec<CalibrationPoint> {
    if n_bins == 0 {
        return Vec::new();
    }
    // (count, positives, probability sum)
    let mut bins = vec![(0usize, 0usize, 0.0f64); n_bins];
    for (&a, &p) in actual.iter().zip(probabilities) {
        let bin = (1..n_bins).filter(|&i| (i as f64 / n_bins as f64) < p).count();
        bins[bin].0 += 1;
        bins[bin].1 += usize::from(a);
        bins[bin].2 += p;
    }

    let dropped = bins.iter().filter(|b| b.0 == 0).count();
    if dropped > 0 {
        log::warn!("Calibration curve: {dropped} empty bin(s) dropped");
    }

    bins.into_iter()
        .filter(|b| b.0 > 0)
        .map(|(count, positives, sum)| CalibrationPoint {
            mean_predicted: sum / count as f64,
            fraction_positive: positives as f64 / count as f64,
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub test_rows: usize,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub recall: f64,
    pub precision: f64,
    pub f1: f64,
    pub r2: f64,
    pub calibration: Vec<CalibrationPoint>,
}

impl EvaluationReport {
    /// Score hold-out probabilities against the true labels.
    pub fn evaluate(actual: &[bool], probabilities: &[f64], calibration_bins: usize) -> Self {
        let predicted: Vec<bool> = probabilities.iter().map(|&p| p > DECISION_THRESHOLD).collect();
        let confusion = ConfusionMatrix::from_predictions(actual, &predicted);
        let as_f64 = |v: &[bool]| v.iter().map(|&b| f64::from(u8::from(b))).collect::<Vec<_>>();

        EvaluationReport {
            test_rows: actual.len(),
            confusion,
            accuracy: confusion.accuracy(),
            recall: confusion.recall(),
            precision: confusion.precision(),
            f1: confusion.f1(),
            r2: r2_score(&as_f64(actual), &as_f64(&predicted)),
            calibration: calibration_curve(actual, probabilities, calibration_bins),
        }
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::Config(format!("serializing report: {e}")))?;
        std::fs::write(path, json).map_err(|e| Error::unavailable(path.display().to_string(), e))
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [[tn, fp], [fn_, tp]] = self.confusion.rows();
        writeln!(f, "Confusion Matrix:")?;
        writeln!(f, "  [[{tn:>6} {fp:>6}]")?;
        writeln!(f, "   [{fn_:>6} {tp:>6}]]")?;
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f, "Recall (Sensitivity): {:.4}", self.recall)?;
        writeln!(f, "Precision: {:.4}", self.precision)?;
        writeln!(f, "F1 Score: {:.4}", self.f1)?;
        write!(f, "R2 Score: {:.4}", self.r2)
    }
}
