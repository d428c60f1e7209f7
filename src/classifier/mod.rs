//! Binary classifiers behind the relatedness scorer.

mod forest;
mod logistic;
mod smote;

use linfa::Dataset;
use ndarray::{Array1, Array2, Axis, Ix1, ShapeError};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ClassifierConfig, ClassifierKind};

pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use smote::Smote;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Training matrix is empty")]
    EmptyTrainingSet,

    #[error("Row {row} has {actual} features, expected {expected}")]
    RaggedMatrix { row: usize, expected: usize, actual: usize },

    #[error("Got {rows} rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("Training labels contain a single class ({0})")]
    SingleClass(u8),

    #[error("Oversampling needs at least 2 minority samples, found {0}")]
    InsufficientMinority(usize),

    #[error("Invalid training matrix shape: {0}")]
    Shape(#[from] ShapeError),

    #[error("Failed to fit {model}: {message}")]
    Fit { model: &'static str, message: String },
}

impl ClassifierError {
    fn fit(model: &'static str, error: impl std::fmt::Display) -> Self {
        ClassifierError::Fit {
            model,
            message: error.to_string(),
        }
    }
}

/// A trained binary classifier.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Probability of the positive ("same conversation") class.
    fn predict_proba(&self, row: &[f64]) -> f64;

    fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) > 0.5)
    }
}

/// Feature rows with their binary labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl TrainingSet {
    pub fn new(rows: Vec<Vec<f64>>, labels: Vec<u8>) -> Result<Self, ClassifierError> {
        if rows.len() != labels.len() {
            return Err(ClassifierError::LabelCountMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        let set = Self { rows, labels };
        set.width()?;
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Common row width; errors on an empty or ragged matrix.
    pub fn width(&self) -> Result<usize, ClassifierError> {
        let expected = self.rows.first().ok_or(ClassifierError::EmptyTrainingSet)?.len();
        for (row, values) in self.rows.iter().enumerate() {
            if values.len() != expected {
                return Err(ClassifierError::RaggedMatrix {
                    row,
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(expected)
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// Rows as a dense `n x width` matrix.
    pub fn records(&self) -> Result<Array2<f64>, ClassifierError> {
        let width = self.width()?;
        Ok(Array2::from_shape_vec((self.len(), width), self.rows.concat())?)
    }

    pub fn targets(&self) -> Array1<usize> {
        self.labels.iter().map(|&label| usize::from(label)).collect()
    }

    pub fn to_dataset(&self) -> Result<Dataset<f64, usize, Ix1>, ClassifierError> {
        Ok(Dataset::new(self.records()?, self.targets()))
    }

    fn require_both_classes(&self) -> Result<(), ClassifierError> {
        match self.positives() {
            0 => Err(ClassifierError::SingleClass(0)),
            p if p == self.len() => Err(ClassifierError::SingleClass(1)),
            _ => Ok(()),
        }
    }
}

/// A single row as a `1 x width` matrix for the linfa predictors.
fn single_row(row: &[f64]) -> Array2<f64> {
    Array1::from(row.to_vec()).insert_axis(Axis(0))
}

/// Fits the configured classifier, oversampling the minority class first when enabled.
pub fn fit(config: &ClassifierConfig, training: TrainingSet) -> Result<Box<dyn Classifier>, ClassifierError> {
    training.width()?;
    training.require_both_classes()?;

    let training = if config.resample() {
        let before = training.len();
        let resampled = Smote::new(config.smote_neighbors, config.seed).fit_resample(training)?;
        debug!(before, after = resampled.len(), "Oversampled minority class");
        resampled
    } else {
        training
    };

    info!(
        kind = %config.kind,
        rows = training.len(),
        positives = training.positives(),
        "Fitting classifier"
    );

    let classifier: Box<dyn Classifier> = match config.kind {
        ClassifierKind::RandomForest => Box::new(RandomForest::fit(&training, config.trees, config.max_depth, config.seed)?),
        ClassifierKind::LogisticRegression => Box::new(LogisticRegression::fit(
            &training,
            config.alpha,
            config.max_iterations,
            config.tolerance,
        )?),
    };
    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> TrainingSet {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let positive = i % 4 == 0;
            rows.push(vec![f64::from(u8::from(positive)), f64::from(i % 2)]);
            labels.push(u8::from(positive));
        }
        TrainingSet::new(rows, labels).unwrap()
    }

    #[test]
    fn rejects_malformed_training_sets() {
        assert!(matches!(
            TrainingSet::new(vec![vec![1.0]], vec![]),
            Err(ClassifierError::LabelCountMismatch { .. })
        ));
        assert!(matches!(
            TrainingSet::new(vec![vec![1.0], vec![1.0, 0.0]], vec![0, 1]),
            Err(ClassifierError::RaggedMatrix { row: 1, .. })
        ));
        assert!(matches!(
            TrainingSet::new(vec![], vec![]),
            Err(ClassifierError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn training_set_becomes_a_dense_dataset() {
        let set = TrainingSet::new(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]], vec![1, 0, 1]).unwrap();
        let records = set.records().unwrap();
        assert_eq!(records.dim(), (3, 2));
        assert_eq!(records[[1, 1]], 1.0);
        assert_eq!(records[[2, 0]], 1.0);
        assert_eq!(set.targets().to_vec(), vec![1, 0, 1]);
        assert_eq!(single_row(&[0.5, 2.0]).dim(), (1, 2));
    }

    #[test]
    fn single_class_is_refused() {
        let set = TrainingSet::new(vec![vec![1.0], vec![0.0]], vec![1, 1]).unwrap();
        let err = fit(&ClassifierConfig::default(), set).unwrap_err();
        assert!(matches!(err, ClassifierError::SingleClass(1)));
    }

    #[test]
    fn both_kinds_learn_a_separable_signal() {
        for kind in [ClassifierKind::RandomForest, ClassifierKind::LogisticRegression] {
            let config = ClassifierConfig {
                kind,
                trees: 15,
                ..ClassifierConfig::default()
            };
            let model = fit(&config, separable()).unwrap();
            assert!(model.predict_proba(&[1.0, 0.0]) > 0.5, "{kind}");
            assert!(model.predict_proba(&[0.0, 1.0]) < 0.5, "{kind}");
            assert_eq!(model.predict(&[1.0, 0.0]), 1, "{kind}");
            assert_eq!(model.predict(&[0.0, 0.0]), 0, "{kind}");
        }
    }
}
