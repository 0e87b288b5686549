//! Credit default risk: dataset loading, filtering and aggregation for the
//! dashboard, plus the feature builder, model artifact and offline trainer
//! behind its scoring form.

pub mod config;
pub mod data;
pub mod error;
pub mod scoring;
pub mod state;

pub use error::{Error, Result};
