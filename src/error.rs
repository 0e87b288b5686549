use std::io;

use thiserror::Error;

/// Errors surfaced by the data, scoring and training layers.
///
/// Every variant is fatal to the interaction that produced it except where a
/// caller chooses to show it and carry on. Nothing in the crate retries.
#[derive(Debug, Error)]
pub enum Error {
    /// The dataset or artifact bytes could not be read or fetched.
    #[error("source unavailable: {location}: {source}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: io::Error,
    },

    /// An expected sheet or column is absent from the loaded data.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A cell could not be coerced into the typed record field.
    #[error("row {row}, column '{column}': {reason}")]
    InvalidRow {
        row: usize,
        column: String,
        reason: String,
    },

    /// The bytes were reachable but not decodable in the detected format.
    #[error("malformed table: {0}")]
    Malformed(String),

    #[error("unsupported table format: {0}")]
    UnsupportedFormat(String),

    /// The artifact declares a feature the builder does not produce.
    #[error("feature mismatch: model expects '{feature}' which the feature builder does not produce")]
    FeatureMismatch { feature: String },

    #[error("empty result set: {0}")]
    EmptyResultSet(String),

    #[error("invalid bounds: lower {lower} exceeds upper {upper}")]
    InvalidBounds { lower: f64, upper: f64 },

    /// A raw categorical code has no entry in the codebook.
    #[error("unknown {field} code {code}")]
    UnknownCode { field: &'static str, code: i64 },

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A diagnostic chart could not be rendered.
    #[error("plot: {0}")]
    Plot(String),
}

impl Error {
    pub(crate) fn unavailable(location: impl Into<String>, source: io::Error) -> Self {
        Error::SourceUnavailable {
            location: location.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
