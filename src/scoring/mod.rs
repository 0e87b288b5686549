/// Scoring: feature building, the serialized model and offline training.
///
/// ```text
///   CustomerProfile ──build──▶ FeatureVector ──project(names)──▶ ModelArtifact ──▶ P(default)
///
///   Dataset ──feature_matrix──▶ stratified split ──fit──▶ ModelArtifact + EvaluationReport
/// ```
pub mod artifact;
pub mod calibration;
pub mod evaluate;
pub mod features;
pub mod train;

pub use artifact::{ModelArtifact, TrainingMetadata, sigmoid};
pub use calibration::write_calibration_plot;
pub use evaluate::{CalibrationPoint, ConfusionMatrix, EvaluationReport};
pub use features::{CustomerProfile, Education, FeatureVector, MaritalStatus, Sex, build};
pub use train::{TRAINING_FEATURE_ORDER, TrainingConfig, TrainingOutcome, train};

use crate::error::Result;

/// Probability that the customer defaults next month.
pub fn predict_default_probability(artifact: &ModelArtifact, profile: &CustomerProfile) -> Result<f64> {
    artifact.predict_probability(&build(profile))
}
