use std::collections::HashSet;
use std::path::Path;

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::features::FeatureVector;
use crate::error::{Error, Result};

/// Bump when the serialized layout changes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// How the artifact was produced. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub train_rows: usize,
    pub test_rows: usize,
    pub test_fraction: f64,
    pub seed: u64,
    pub max_iterations: u64,
    pub alpha: f64,
}

/// Fitted logistic-regression model plus the feature order it was fitted
/// with. Loaded once, shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Declared feature order; `coefficients[i]` belongs to `feature_names[i]`.
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training: Option<TrainingMetadata>,
}

impl ModelArtifact {
    pub fn new(feature_names: Vec<String>, coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        let artifact = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names,
            coefficients,
            intercept,
            training: None,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn with_training(mut self, training: TrainingMetadata) -> Self {
        self.training = Some(training);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::InvalidArtifact(format!(
                "format version {} (expected {ARTIFACT_FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.feature_names.is_empty() {
            return Err(Error::InvalidArtifact("no features declared".to_string()));
        }
        if self.feature_names.len() != self.coefficients.len() {
            return Err(Error::InvalidArtifact(format!(
                "{} feature names but {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.feature_names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(Error::InvalidArtifact(format!("duplicate feature '{dup}'")));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidArtifact("non-finite parameters".to_string()));
        }
        Ok(())
    }

    /// Read and validate an artifact file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).map_err(|e| Error::unavailable(path.display().to_string(), e))?;
        let artifact: Self = serde_json::from_slice(&bytes)
            .map_err(|e| Error::InvalidArtifact(format!("{}: {e}", path.display())))?;
        artifact.validate()?;
        log::info!(
            "Loaded model artifact {} ({} features)",
            path.display(),
            artifact.feature_names.len()
        );
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::InvalidArtifact(format!("serializing: {e}")))?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::unavailable(dir.display().to_string(), e))?;
        }
        std::fs::write(path, json).map_err(|e| Error::unavailable(path.display().to_string(), e))?;
        log::info!("Model artifact written to {}", path.display());
        Ok(())
    }

    fn coefficients_view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(self.coefficients.as_slice())
    }

    /// Probability of default for one customer. The builder output is
    /// projected onto `feature_names` first, so any declared order works.
    pub fn predict_probability(&self, features: &FeatureVector) -> Result<f64> {
        let x = Array1::from(features.project(&self.feature_names)?);
        Ok(sigmoid(x.dot(&self.coefficients_view()) + self.intercept))
    }

    /// Probabilities for a matrix whose columns are already in declared order.
    pub fn predict_probabilities(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(Error::InvalidArtifact(format!(
                "matrix has {} columns, model expects {}",
                x.ncols(),
                self.coefficients.len()
            )));
        }
        Ok((x.dot(&self.coefficients_view()) + self.intercept).mapv(sigmoid))
    }
}

/// Logistic function, saturating to exactly 0 or 1 for extreme inputs.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
