//! Hyperparameters for pairing, feature extraction and classification.
//!
//! Loaded from a TOML file where every field is optional:
//!
//! ```toml
//! [pairing]
//! lookback = 4
//! window_seconds = 129
//!
//! [features]
//! chat_bins = 50
//! discourse_max_words = 10
//! top_words_removed = 50
//!
//! [classifier]
//! kind = "RANDOM_FOREST"
//! trees = 100
//! seed = 0
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported classifier: {0}")]
    UnsupportedClassifier(String),

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

/// Which binary classifier scores message pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClassifierKind {
    RandomForest,
    LogisticRegression,
}

impl ClassifierKind {
    /// Whether minority oversampling runs when the config leaves it unset.
    pub fn resamples_by_default(self) -> bool {
        matches!(self, ClassifierKind::RandomForest)
    }
}

impl FromStr for ClassifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RANDOM_FOREST" => Ok(Self::RandomForest),
            "LOGISTIC_REGRESSION" => Ok(Self::LogisticRegression),
            other => Err(ConfigError::UnsupportedClassifier(other.to_string())),
        }
    }
}

impl TryFrom<String> for ClassifierKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClassifierKind> for String {
    fn from(kind: ClassifierKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RandomForest => write!(f, "RANDOM_FOREST"),
            Self::LogisticRegression => write!(f, "LOGISTIC_REGRESSION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Number of immediately preceding messages always paired.
    pub lookback: usize,
    /// Pairs beyond the lookback must be strictly closer than this many seconds.
    pub window_seconds: u64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            lookback: 4,
            window_seconds: 129,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Width of the logarithmic time-difference one-hot vector.
    pub chat_bins: usize,
    /// A message with more words than this counts as long.
    pub discourse_max_words: usize,
    /// Most frequent words dropped from the unigram table.
    pub top_words_removed: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            chat_bins: 50,
            discourse_max_words: 10,
            top_words_removed: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    /// Minority oversampling before fitting; unset follows the classifier kind.
    pub resample: Option<bool>,
    pub smote_neighbors: usize,
    pub trees: usize,
    pub max_depth: Option<usize>,
    /// L2 penalty for logistic regression; zero disables it.
    pub alpha: f64,
    pub max_iterations: u64,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::RandomForest,
            resample: None,
            smote_neighbors: 5,
            trees: 100,
            max_depth: None,
            alpha: 1.0,
            max_iterations: 1_000,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

impl ClassifierConfig {
    pub fn resample(&self) -> bool {
        self.resample.unwrap_or_else(|| self.kind.resamples_by_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisentanglerConfig {
    pub pairing: PairingConfig,
    pub features: FeatureConfig,
    pub classifier: ClassifierConfig,
}

impl DisentanglerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairing.lookback == 0 {
            return Err(ConfigError::invalid_parameter("pairing.lookback must be > 0"));
        }
        if self.pairing.window_seconds == 0 {
            return Err(ConfigError::invalid_parameter("pairing.window_seconds must be > 0"));
        }
        if self.features.chat_bins == 0 {
            return Err(ConfigError::invalid_parameter("features.chat_bins must be > 0"));
        }
        if self.classifier.trees == 0 {
            return Err(ConfigError::invalid_parameter("classifier.trees must be > 0"));
        }
        if self.classifier.smote_neighbors == 0 {
            return Err(ConfigError::invalid_parameter("classifier.smote_neighbors must be > 0"));
        }
        if !(self.classifier.alpha.is_finite() && self.classifier.alpha >= 0.0) {
            return Err(ConfigError::invalid_parameter("classifier.alpha must be finite and >= 0"));
        }
        if !(self.classifier.tolerance > 0.0) {
            return Err(ConfigError::invalid_parameter("classifier.tolerance must be > 0"));
        }
        Ok(())
    }
}
