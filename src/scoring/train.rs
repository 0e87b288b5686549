//! Offline model training: stratified split, logistic regression fit,
//! hold-out evaluation.
//!
//! Credit limits and bill amounts run into the hundreds of thousands while
//! the indicators are 0/1, so the fit runs on standardised columns. The
//! coefficients are mapped back onto raw columns before they reach the
//! artifact, which therefore scores raw feature vectors.

use linfa::traits::Fit;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::artifact::{ModelArtifact, TrainingMetadata};
use super::evaluate::EvaluationReport;
use super::features::{CustomerProfile, FEATURE_COUNT, build};
use crate::data::Dataset;
use crate::error::{Error, Result};

/// Column order of the training matrix. Deliberately not the builder's
/// order: serving must project by name.
pub const TRAINING_FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "LIMIT_BAL",
    "GENDER",
    "EDUCATION_POSTGRAD",
    "EDUCATION_GRADUATE",
    "EDUCATION_HIGHSCHOOL",
    "MARRIAGE_MARRIED",
    "MARRIAGE_SINGLE",
    "AGE",
    "PAY_STATUS_SEP05",
    "PAY_STATUS_AUG05",
    "PAY_STATUS_JUL05",
    "PAY_STATUS_JUN05",
    "PAY_STATUS_MAY05",
    "PAY_STATUS_APR05",
    "BILL_AMT_SEP05",
    "BILL_AMT_AUG05",
    "BILL_AMT_JUL05",
    "BILL_AMT_JUN05",
    "BILL_AMT_MAY05",
    "BILL_AMT_APR05",
    "PAY_AMT_SEP05",
    "PAY_AMT_AUG05",
    "PAY_AMT_JUL05",
    "PAY_AMT_JUN05",
    "PAY_AMT_MAY05",
    "PAY_AMT_APR05",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Share of records held out for evaluation, strictly between 0 and 1.
    pub test_fraction: f64,
    pub seed: u64,
    pub max_iterations: u64,
    /// L2 regularization strength.
    pub alpha: f64,
    pub calibration_bins: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.4,
            seed: 42,
            max_iterations: 500,
            alpha: 1.0,
            calibration_bins: 10,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(Error::Config(format!(
                "test fraction must lie strictly between 0 and 1, got {}",
                self.test_fraction
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::Config("max iterations must be positive".to_string()));
        }
        if !(self.alpha >= 0.0) {
            return Err(Error::Config(format!("alpha must be non-negative, got {}", self.alpha)));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stratified split
// ---------------------------------------------------------------------------

/// Row indices of the two partitions, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so both partitions keep the class ratio. Each class
/// contributes `round(test_fraction * class_size)` rows to the test side.
/// The same seed always yields the same split.
pub fn stratified_split(labels: &[bool], test_fraction: f64, seed: u64) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::Config(format!(
            "test fraction must lie strictly between 0 and 1, got {test_fraction}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::new(),
        test: Vec::new(),
    };
    for class in [false, true] {
        let mut idx: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        idx.shuffle(&mut rng);
        let n_test = ((test_fraction * idx.len() as f64).round() as usize).min(idx.len());
        split.test.extend_from_slice(&idx[..n_test]);
        split.train.extend_from_slice(&idx[n_test..]);
    }

    if split.train.is_empty() || split.test.is_empty() {
        return Err(Error::EmptyResultSet(format!(
            "splitting {} record(s) at test fraction {test_fraction} leaves a partition empty",
            labels.len()
        )));
    }
    split.train.sort_unstable();
    split.test.sort_unstable();
    Ok(split)
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// Build the `(records, features)` matrix in `order` through the same builder
/// the scoring form uses.
pub fn feature_matrix(dataset: &Dataset, order: &[&str]) -> Result<Array2<f64>> {
    let mut flat = Vec::with_capacity(dataset.len() * order.len());
    for (i, record) in dataset.iter().enumerate() {
        let profile = CustomerProfile::from_record(record).map_err(|e| match e {
            Error::UnknownCode { field, code } => Error::InvalidRow {
                row: i + 1,
                column: field.to_string(),
                reason: format!("code {code} is not in the codebook"),
            },
            other => other,
        })?;
        flat.extend(build(&profile).project(order)?);
    }
    Array2::from_shape_vec((dataset.len(), order.len()), flat)
        .map_err(|e| Error::Training(format!("feature matrix shape: {e}")))
}

/// Per-column centre and spread of the training partition.
#[derive(Debug, Clone)]
struct Standardizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Standardizer {
    /// Constant columns keep a unit scale.
    fn fit(x: &Array2<f64>) -> Self {
        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });
        Self { mean, scale }
    }

    fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.scale
    }

    /// Coefficients fitted on standardised columns, expressed on raw columns:
    /// `w_raw = w / scale`, `b_raw = b - w_raw . mean`.
    fn unscale(&self, coefficients: &Array1<f64>, intercept: f64) -> (Vec<f64>, f64) {
        let raw = coefficients / &self.scale;
        let shift = raw.dot(&self.mean);
        (raw.to_vec(), intercept - shift)
    }
}

pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: EvaluationReport,
}

/// Fit a logistic-regression classifier on the training partition and
/// evaluate it on the held-out partition.
pub fn train(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainingOutcome> {
    config.validate()?;
    if dataset.is_empty() {
        return Err(Error::EmptyResultSet("no records to train on".to_string()));
    }

    let labels: Vec<bool> = dataset.iter().map(|r| r.defaulted).collect();
    let x = feature_matrix(dataset, &TRAINING_FEATURE_ORDER)?;
    let split = stratified_split(&labels, config.test_fraction, config.seed)?;

    let x_train = x.select(Axis(0), &split.train);
    let standardizer = Standardizer::fit(&x_train);
    let y_train: Array1<usize> = split
        .train
        .iter()
        .map(|&i| usize::from(labels[i]))
        .collect();
    if y_train.iter().all(|&y| y == y_train[0]) {
        return Err(Error::Training(
            "training partition contains a single class".to_string(),
        ));
    }

    log::info!(
        "Fitting logistic regression on {} rows x {} features (alpha {}, max {} iterations)",
        split.train.len(),
        TRAINING_FEATURE_ORDER.len(),
        config.alpha,
        config.max_iterations
    );
    let fitted = LogisticRegression::default()
        .alpha(config.alpha)
        .max_iterations(config.max_iterations)
        .fit(&linfa::Dataset::new(standardizer.transform(&x_train), y_train))
        .map_err(|e| Error::Training(e.to_string()))?;
    let (coefficients, intercept) = standardizer.unscale(fitted.params(), fitted.intercept());

    let artifact = ModelArtifact::new(
        TRAINING_FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
        coefficients,
        intercept,
    )?
    .with_training(TrainingMetadata {
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        test_fraction: config.test_fraction,
        seed: config.seed,
        max_iterations: config.max_iterations,
        alpha: config.alpha,
    });

    let x_test = x.select(Axis(0), &split.test);
    let probabilities = artifact.predict_probabilities(x_test.view())?.to_vec();
    let y_test: Vec<bool> = split.test.iter().map(|&i| labels[i]).collect();
    let report = EvaluationReport::evaluate(&y_test, &probabilities, config.calibration_bins);
    log::info!(
        "Hold-out accuracy {:.4}, F1 {:.4} on {} rows",
        report.accuracy,
        report.f1,
        report.test_rows
    );

    Ok(TrainingOutcome { artifact, report })
}
