//! Error types shared across the disentanglement engine.

use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::config::ConfigError;
use crate::features::FeatureError;

/// Top-level error for training, prediction and validation runs.
#[derive(Debug, Error)]
pub enum DisentangleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Feature extraction failed: {0}")]
    Feature(#[from] FeatureError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Prediction was requested before any classifier was trained.
    #[error("No trained classifier available")]
    NotTrained,

    #[error("Message {0} has no gold conversation label")]
    MissingLabel(String),

    #[error("Malformed conversation label: {0:?} (expected T<integer>)")]
    MalformedLabel(String),

    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("Label sequences differ in length: gold {gold}, predicted {predicted}")]
    LengthMismatch { gold: usize, predicted: usize },
}

pub type Result<T, E = DisentangleError> = std::result::Result<T, E>;
